//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One update per display frame, all constants per frame
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod phase;
pub mod state;
pub mod tick;

pub use collision::{Aabb, Hitbox, collides};
pub use phase::{EVOLUTION_PHASES, Palette, Phase, Rgb, phase_index_for_score};
pub use state::{
    GameEvent, GameState, Obstacle, ObstacleKind, Pickup, PowerUpKind, RunStatus, Runner,
    SimError,
};
pub use tick::{jump, set_status, spawn_interval, tick};
