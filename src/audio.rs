//! Audio system
//!
//! Procedurally generated sound effects through the Web Audio API - no
//! external files needed! Whether the ambient drone should sound is decided by
//! [`DroneControl`], which has no browser dependency.

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Runner leaves the ground (or double-jumps)
    Jump,
    /// Power-up collected, or a shield absorbed a hit
    PowerUp,
    /// Lethal hit
    Collision,
}

/// On/off state of the ambient drone
///
/// The drone is requested for the length of a run and sounds only while the
/// player has it enabled and audio is not muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroneControl {
    enabled: bool,
    muted: bool,
    requested: bool,
}

impl DroneControl {
    pub fn new(enabled: bool, muted: bool) -> Self {
        Self {
            enabled,
            muted,
            requested: false,
        }
    }

    /// A run started
    pub fn request(&mut self) {
        self.requested = true;
    }

    /// The run ended or the page is going away
    pub fn release(&mut self) {
        self.requested = false;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn should_play(&self) -> bool {
        self.enabled && self.requested && !self.muted
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{
        AudioContext, BiquadFilterType, GainNode, OscillatorNode, OscillatorType,
    };

    use super::{DroneControl, SoundEffect};
    use crate::settings::Settings;

    /// Overall loudness applied on top of the user volumes
    const MIX_LEVEL: f32 = 0.3;
    /// Ambient drone level relative to the mix
    const AMBIENT_LEVEL: f32 = 0.05;

    /// Running ambient drone: the voice plus its filter LFO
    struct Ambient {
        osc: OscillatorNode,
        lfo: OscillatorNode,
        gain: GainNode,
    }

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        drone: DroneControl,
        ambient: Option<Ambient>,
    }

    impl AudioManager {
        pub fn new(settings: &Settings) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: settings.master_volume.clamp(0.0, 1.0),
                sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
                drone: DroneControl::new(settings.ambient, settings.muted),
                ambient: None,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn is_muted(&self) -> bool {
            self.drone.is_muted()
        }

        /// Mute/unmute all audio, fading the ambient drone instead of cutting it
        ///
        /// Unmuting mid-run starts the drone if the run began muted.
        pub fn set_muted(&mut self, muted: bool) {
            self.drone.set_muted(muted);
            if let (Some(ctx), Some(ambient)) = (&self.ctx, &self.ambient) {
                let target = if muted { 0.0 } else { self.ambient_volume() };
                ambient
                    .gain
                    .gain()
                    .set_target_at_time(target, ctx.current_time(), 0.1)
                    .ok();
            } else if self.drone.should_play() {
                self.build_voice();
            }
        }

        /// Get effective volume
        fn effective_volume(&self) -> f32 {
            if self.drone.is_muted() {
                0.0
            } else {
                self.master_volume * self.sfx_volume * MIX_LEVEL
            }
        }

        fn ambient_volume(&self) -> f32 {
            self.master_volume * MIX_LEVEL * AMBIENT_LEVEL
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Jump => self.play_jump(ctx, vol),
                SoundEffect::PowerUp => self.play_power_up(ctx, vol),
                SoundEffect::Collision => self.play_collision(ctx, vol),
            }
        }

        /// Start the low filtered drone that runs under a run
        pub fn start_ambient(&mut self) {
            self.drone.request();
            if self.drone.should_play() {
                self.build_voice();
            }
        }

        pub fn stop_ambient(&mut self) {
            self.drone.release();
            if let Some(ambient) = self.ambient.take() {
                ambient.osc.stop().ok();
                ambient.lfo.stop().ok();
            }
        }

        fn build_voice(&mut self) {
            if self.ambient.is_some() {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            let _ = ctx.resume();

            let Some(ambient) = Self::build_ambient(ctx, self.ambient_volume()) else {
                log::warn!("Failed to build ambient drone");
                return;
            };
            self.ambient = Some(ambient);
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Jump - rising square chirp
        fn play_jump(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 150.0, OscillatorType::Square) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(150.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(600.0, t + 0.1)
                .ok();
            gain.gain().set_value_at_time(vol * 0.7, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }

        /// Power-up - three-note triangle arpeggio
        fn play_power_up(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [440.0, 659.0, 880.0].iter().enumerate() {
                let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) else {
                    continue;
                };
                let t = ctx.current_time() + i as f64 * 0.05;
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain()
                    .linear_ramp_to_value_at_time(vol * 0.7, t + 0.02)
                    .ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }

        /// Collision - sawtooth thud over a burst of noise
        fn play_collision(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 1.6, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                    .ok();
                osc.frequency().set_value_at_time(100.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(40.0, t + 0.2)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.4).ok();
            }

            self.play_noise_burst(ctx, vol * 1.6, 0.2, 0.4);
        }

        /// White noise burst (glitch texture)
        fn play_noise_burst(&self, ctx: &AudioContext, vol: f32, length: f32, decay: f64) {
            let sample_rate = ctx.sample_rate();
            let frames = (sample_rate * length) as u32;
            let Ok(buffer) = ctx.create_buffer(1, frames, sample_rate) else {
                return;
            };
            let mut data: Vec<f32> = (0..frames)
                .map(|_| (js_sys::Math::random() * 2.0 - 1.0) as f32)
                .collect();
            if buffer.copy_to_channel(&mut data, 0).is_err() {
                return;
            }

            let Ok(source) = ctx.create_buffer_source() else {
                return;
            };
            let Ok(gain) = ctx.create_gain() else { return };
            source.set_buffer(Some(&buffer));
            if source.connect_with_audio_node(&gain).is_err()
                || gain.connect_with_audio_node(&ctx.destination()).is_err()
            {
                return;
            }

            let t = ctx.current_time();
            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + decay)
                .ok();
            source.start().ok();
            source.stop_with_when(t + decay).ok();
        }

        /// Sawtooth at low A through a resonant low-pass swept by a slow LFO
        fn build_ambient(ctx: &AudioContext, level: f32) -> Option<Ambient> {
            let t = ctx.current_time();

            let osc = ctx.create_oscillator().ok()?;
            osc.set_type(OscillatorType::Sawtooth);
            osc.frequency().set_value_at_time(55.0, t).ok()?;

            let filter = ctx.create_biquad_filter().ok()?;
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value_at_time(200.0, t).ok()?;
            filter.q().set_value(10.0);

            let lfo = ctx.create_oscillator().ok()?;
            lfo.set_type(OscillatorType::Sine);
            lfo.frequency().set_value(0.5);
            let lfo_gain = ctx.create_gain().ok()?;
            lfo_gain.gain().set_value(100.0);
            lfo.connect_with_audio_node(&lfo_gain).ok()?;
            lfo_gain.connect_with_audio_param(&filter.frequency()).ok()?;

            let gain = ctx.create_gain().ok()?;
            gain.gain().set_value(level);

            osc.connect_with_audio_node(&filter).ok()?;
            filter.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            osc.start().ok()?;
            lfo.start().ok()?;
            Some(Ambient { osc, lfo, gain })
        }
    }
}
