//! Dino-Verse - A cyberpunk endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawns, collisions, phases)
//! - `narration`: Milestone narration over a pluggable text-generation transport
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser/native platform abstraction
//! - `hud`: Timed HUD messages (phase alert, power-up banner)
//! - `highscore` / `settings`: Values persisted in LocalStorage

pub mod audio;
pub mod highscore;
pub mod hud;
pub mod narration;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use highscore::HighScore;
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
///
/// All physics values are per frame: the loop advances once per display refresh.
pub mod consts {
    /// Play field dimensions (logical pixels, y grows downward)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 400.0;
    pub const GROUND_HEIGHT: f32 = 30.0;

    /// Runner physics
    pub const GRAVITY: f32 = 0.6;
    pub const JUMP_FORCE: f32 = -12.0;
    /// Second jump is slightly weaker than the first
    pub const DOUBLE_JUMP_FACTOR: f32 = 0.85;

    /// Runner defaults
    pub const RUNNER_X: f32 = 50.0;
    pub const RUNNER_SIZE: f32 = 44.0;

    /// Scroll speed (pixels per frame). Kept in f64: the ramp accumulates
    /// 0.001 per frame and feeds the spawn interval floor.
    pub const INITIAL_SPEED: f64 = 5.0;
    pub const MAX_SPEED: f64 = 15.0;
    pub const SPEED_INCREMENT: f64 = 0.001;

    /// Obstacle geometry
    pub const GROUND_OBSTACLE_SIZE: (f32, f32) = (32.0, 45.0);
    pub const FLYING_OBSTACLE_SIZE: (f32, f32) = (46.0, 45.0);
    /// Height of the obstacle's top edge above the ground line
    pub const GROUND_OBSTACLE_LIFT: f32 = 45.0;
    pub const FLYING_OBSTACLE_LIFT: f32 = 90.0;
    /// Probability that a spawned obstacle is a flying one
    pub const FLYING_CHANCE: f64 = 0.2;

    /// Power-up pickups
    pub const PICKUP_SIZE: f32 = 25.0;
    pub const PICKUP_LIFT: f32 = 70.0;
    pub const PICKUP_INTERVAL_FRAMES: u64 = 800;
    pub const POWER_UP_DURATION_FRAMES: u32 = 300;

    /// Inward margin applied to both boxes before an overlap test
    pub const COLLISION_PADDING: f32 = 8.0;

    /// Score gained per frame survived
    pub const SCORE_PER_FRAME: f64 = 0.1;

    /// Points between narration requests
    pub const NARRATION_MILESTONE: u32 = 100;
}

/// Y coordinate of the ground line
#[inline]
pub fn ground_line() -> f32 {
    consts::FIELD_HEIGHT - consts::GROUND_HEIGHT
}
