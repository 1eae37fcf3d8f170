//! Transient HUD messages
//!
//! The phase alert and the power-up banner each stay up for a fixed number of
//! frames. The shell calls [`Overlays::tick`] once per frame before the
//! simulation update and reads the current text when it refreshes the DOM.

use crate::sim::PowerUpKind;

/// Frames the "ENTERING <phase>" alert stays on screen (3 s at 60 Hz)
pub const PHASE_ALERT_FRAMES: u32 = 180;
/// Frames the "<power-up> ACTIVATED" banner stays on screen (2 s at 60 Hz)
pub const POWER_UP_BANNER_FRAMES: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TimedMessage {
    text: String,
    frames_left: u32,
}

impl TimedMessage {
    fn new(text: String, frames: u32) -> Self {
        Self {
            text,
            frames_left: frames,
        }
    }

    /// Count down one frame; false once expired
    fn tick(&mut self) -> bool {
        self.frames_left = self.frames_left.saturating_sub(1);
        self.frames_left > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlays {
    phase_alert: Option<TimedMessage>,
    power_up: Option<(PowerUpKind, TimedMessage)>,
}

impl Overlays {
    pub fn phase_changed(&mut self, name: &str) {
        self.phase_alert = Some(TimedMessage::new(
            format!("ENTERING {}", name),
            PHASE_ALERT_FRAMES,
        ));
    }

    pub fn power_up_collected(&mut self, kind: PowerUpKind) {
        self.power_up = Some((
            kind,
            TimedMessage::new(format!("{} ACTIVATED", kind.label()), POWER_UP_BANNER_FRAMES),
        ));
    }

    /// Swap in a generated name if the banner for `kind` is still showing
    pub fn power_up_named(&mut self, kind: PowerUpKind, name: &str) {
        if let Some((shown, banner)) = &mut self.power_up {
            if *shown == kind {
                banner.text = format!("{} ACTIVATED", name.to_uppercase());
            }
        }
    }

    /// Advance one frame
    ///
    /// The banner also goes away early once its power-up is no longer active.
    pub fn tick(&mut self, active: Option<PowerUpKind>) {
        if let Some(alert) = &mut self.phase_alert {
            if !alert.tick() {
                self.phase_alert = None;
            }
        }
        if let Some((kind, banner)) = &mut self.power_up {
            if active != Some(*kind) || !banner.tick() {
                self.power_up = None;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn phase_alert(&self) -> Option<&str> {
        self.phase_alert.as_ref().map(|m| m.text.as_str())
    }

    pub fn power_up_banner(&self) -> Option<&str> {
        self.power_up.as_ref().map(|(_, m)| m.text.as_str())
    }
}
