//! Dino-Verse entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use dino_verse::audio::{AudioManager, SoundEffect};
    use dino_verse::hud::Overlays;
    use dino_verse::narration::gemini::FetchTransport;
    use dino_verse::narration::{self, GAME_OVER_MESSAGE, NarrationGate};
    use dino_verse::renderer::SdfRenderState;
    use dino_verse::sim::{GameEvent, GameState, PowerUpKind, RunStatus, jump, set_status, tick};
    use dino_verse::{HighScore, Settings, platform};

    /// Async work requested by a frame, started once the game borrow is released
    #[derive(Default)]
    struct FollowUps {
        narrate_at: Option<u32>,
        power_up: Option<PowerUpKind>,
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        render_state: Option<SdfRenderState>,
        settings: Settings,
        audio: AudioManager,
        high_score: HighScore,
        narration: NarrationGate,
        /// Phase alert and power-up banner
        overlays: Overlays,
        /// Pending requestAnimationFrame id
        raf_id: Option<i32>,
        cancelled: bool,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let audio = AudioManager::new(&settings);
            Self {
                state: GameState::new(seed),
                render_state: None,
                settings,
                audio,
                high_score: HighScore::load(),
                narration: NarrationGate::default(),
                overlays: Overlays::default(),
                raf_id: None,
                cancelled: false,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Jump from any input source
        fn jump(&mut self) {
            if jump(&mut self.state) {
                self.audio.play(SoundEffect::Jump);
            }
        }

        /// Reset to a fresh run and start playing
        fn start_run(&mut self) -> Result<(), dino_verse::sim::SimError> {
            set_status(&mut self.state, RunStatus::Start)?;
            set_status(&mut self.state, RunStatus::Playing)?;
            self.narration.start_run();
            self.overlays.clear();
            self.audio.resume();
            self.audio.start_ambient();
            Ok(())
        }

        /// Back to the title screen
        fn to_menu(&mut self) -> Result<(), dino_verse::sim::SimError> {
            set_status(&mut self.state, RunStatus::Start)?;
            self.overlays.clear();
            self.audio.stop_ambient();
            Ok(())
        }

        fn toggle_mute(&mut self) {
            let muted = !self.audio.is_muted();
            self.audio.set_muted(muted);
            self.settings.muted = muted;
            self.settings.save();
            log::info!("Audio {}", if muted { "muted" } else { "unmuted" });
        }

        /// Advance one frame and react to what happened
        fn update(&mut self, time: f64) -> FollowUps {
            let mut follow_ups = FollowUps::default();

            self.overlays.tick(self.state.runner.power_up);
            for event in tick(&mut self.state) {
                match event {
                    GameEvent::ScoreUpdated(score) => {
                        if self.settings.narration.enabled && self.narration.try_begin(score) {
                            follow_ups.narrate_at = Some(score);
                        }
                    }
                    GameEvent::PhaseChanged(name) => {
                        self.overlays.phase_changed(name);
                    }
                    GameEvent::PowerUpCollected(kind) => {
                        self.audio.play(SoundEffect::PowerUp);
                        self.overlays.power_up_collected(kind);
                        follow_ups.power_up = Some(kind);
                    }
                    GameEvent::ShieldAbsorbed => {
                        self.audio.play(SoundEffect::PowerUp);
                    }
                    GameEvent::Collision => {
                        self.audio.play(SoundEffect::Collision);
                    }
                    GameEvent::GameOver(score) => {
                        if self.high_score.submit_and_save(score) {
                            log::info!("New high score: {}", score);
                        }
                        self.audio.stop_ambient();
                        self.narration.announce(GAME_OVER_MESSAGE);
                    }
                }
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }

            follow_ups
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, &self.settings, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            set_text(document, "hud-score", &self.state.whole_score().to_string());
            set_text(document, "hud-high", &self.high_score.best().to_string());
            set_text(document, "hud-phase", self.state.phase().name);
            set_text(document, "hud-fps", &self.fps.to_string());
            set_text(document, "narration", self.narration.text());

            match self.overlays.power_up_banner() {
                Some(text) => {
                    set_text(document, "powerup-banner", text);
                    set_visible(document, "powerup-banner", true);
                }
                None => set_visible(document, "powerup-banner", false),
            }

            match self.overlays.phase_alert() {
                Some(text) => {
                    set_text(document, "phase-alert", text);
                    set_visible(document, "phase-alert", true);
                }
                None => set_visible(document, "phase-alert", false),
            }

            // HUD text follows the phase accent colour
            let accent = self.state.phase().palette.accent.to_css();
            if let Some(el) = document.get_element_by_id("hud") {
                let style = format!("color: {}", accent);
                if el.get_attribute("style").as_deref() != Some(style.as_str()) {
                    let _ = el.set_attribute("style", &style);
                }
            }

            let status = self.state.status;
            set_visible(document, "start-screen", status == RunStatus::Start);
            set_visible(document, "game-over", status == RunStatus::GameOver);
            if status == RunStatus::GameOver {
                set_text(document, "final-score", &self.state.whole_score().to_string());
                set_text(document, "final-phase", self.state.phase().name);
            }

            set_text(
                document,
                "mute-btn",
                if self.audio.is_muted() { "UNMUTE" } else { "MUTE" },
            );
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Fire-and-forget narration request for a milestone
    fn spawn_narration(game: Rc<RefCell<Game>>, score: u32) {
        let transport = FetchTransport::new(game.borrow().settings.narration.clone());
        wasm_bindgen_futures::spawn_local(async move {
            let text = narration::narrate(&transport, platform::is_online(), score).await;
            let mut g = game.borrow_mut();
            if g.cancelled {
                log::info!("Dropping narration that resolved after teardown");
                return;
            }
            g.narration.finish(text);
        });
    }

    /// Replace the power-up banner with a generated name once it arrives
    fn spawn_power_up_name(game: Rc<RefCell<Game>>, kind: PowerUpKind) {
        let settings = game.borrow().settings.narration.clone();
        if !settings.enabled {
            return;
        }
        let transport = FetchTransport::new(settings);
        wasm_bindgen_futures::spawn_local(async move {
            let name = narration::power_up_name(&transport, platform::is_online(), kind).await;
            let mut g = game.borrow_mut();
            if !g.cancelled {
                g.overlays.power_up_named(kind, &name);
            }
        });
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Dino-Verse starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        set_visible(&document, "loading", false);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let seed = platform::now_ms() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = SdfRenderState::new(surface, &adapter, width, height)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        render_state.set_start_time(platform::now_ms());
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone())?;
        setup_buttons(&document, game.clone());
        setup_teardown(game.clone())?;

        game.borrow().update_hud(&document);

        // Start game loop
        request_animation_frame(game);

        log::info!("Dino-Verse running!");
        Ok(())
    }

    fn setup_input_handlers(
        canvas: &HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        // Mouse down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().jump();
            });
            canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().jump();
            });
            canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().ok_or("no window")?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.code().as_str() {
                    "Space" | "ArrowUp" => {
                        event.prevent_default();
                        g.jump();
                    }
                    "KeyM" => g.toggle_mute(),
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for id in ["start-btn", "restart-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    if let Err(e) = game.borrow_mut().start_run() {
                        log::warn!("Could not start run: {}", e);
                    }
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        if let Some(btn) = document.get_element_by_id("menu-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                if let Err(e) = game.borrow_mut().to_menu() {
                    log::warn!("Could not return to menu: {}", e);
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("mute-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().toggle_mute();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Stop scheduling frames when the page goes away
    fn setup_teardown(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            g.cancelled = true;
            g.audio.stop_ambient();
            if let (Some(id), Some(window)) = (g.raf_id.take(), web_sys::window()) {
                let _ = window.cancel_animation_frame(id);
            }
            log::info!("Frame loop stopped");
        });
        window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let loop_game = game.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(loop_game, time);
        });
        if let Ok(id) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            game.borrow_mut().raf_id = Some(id);
        }
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let follow_ups = {
            let mut g = game.borrow_mut();
            g.raf_id = None;
            if g.cancelled {
                return;
            }

            let follow_ups = g.update(time);
            g.render(time);

            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
            follow_ups
        };

        if let Some(score) = follow_ups.narrate_at {
            spawn_narration(game.clone(), score);
        }
        if let Some(kind) = follow_ups.power_up {
            spawn_power_up_name(game.clone(), kind);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Dino-Verse (native) starting...");
    log::info!("Native mode runs headless - use `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let score = autopilot(seed, 20_000);
    log::info!("Autopilot run (seed {}) finished with score {}", seed, score);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one headless run, jumping whenever something is about to reach the runner
#[cfg(not(target_arch = "wasm32"))]
fn autopilot(seed: u64, max_frames: u64) -> u32 {
    use dino_verse::sim::{GameEvent, GameState, RunStatus, jump, set_status, tick};

    let mut state = GameState::new(seed);
    if let Err(e) = set_status(&mut state, RunStatus::Playing) {
        log::error!("{}", e);
        return 0;
    }

    for _ in 0..max_frames {
        let runner_front = state.runner.pos.x + state.runner.size.x;
        let lead = state.effective_speed() as f32 * 8.0;
        let threat = state
            .obstacles
            .iter()
            .any(|o| o.pos.x > runner_front - o.size.x && o.pos.x < runner_front + lead);
        if threat {
            jump(&mut state);
        }

        for event in tick(&mut state) {
            match event {
                GameEvent::PhaseChanged(name) => log::info!("Phase: {}", name),
                GameEvent::PowerUpCollected(kind) => log::info!("Power-up: {}", kind.label()),
                GameEvent::GameOver(score) => return score,
                _ => {}
            }
        }
    }

    state.whole_score()
}
