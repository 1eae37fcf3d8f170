//! Game state and core simulation types
//!
//! Everything the frame loop mutates lives in [`GameState`]. The shell owns one
//! instance and only touches it through `tick`, `jump` and `set_status`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::phase::{EVOLUTION_PHASES, Phase};
use crate::consts::*;
use crate::ground_line;

/// Run status, driven by the surrounding UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunStatus {
    /// Idle on the menu; entering it resets the run
    #[default]
    Start,
    /// Frame updates advance the simulation
    Playing,
    /// Run ended; terminal until the UI returns to Start
    GameOver,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Absorbs one obstacle collision
    Shield,
    /// Halves the scroll speed
    SlowMo,
    /// Grants one extra jump while airborne
    DoubleJump,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::Shield,
        PowerUpKind::SlowMo,
        PowerUpKind::DoubleJump,
    ];

    /// Human-readable label for HUD banners
    pub fn label(&self) -> &'static str {
        match self {
            PowerUpKind::Shield => "SHIELD",
            PowerUpKind::SlowMo => "SLOW MO",
            PowerUpKind::DoubleJump => "DOUBLE JUMP",
        }
    }

    /// Index used by the renderer's pickup uniform array
    pub fn gpu_index(&self) -> u32 {
        match self {
            PowerUpKind::Shield => 0,
            PowerUpKind::SlowMo => 1,
            PowerUpKind::DoubleJump => 2,
        }
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Sits on the ground; jump over it
    Ground,
    /// Hovers at head height; stay low or clear it high
    Flying,
}

impl ObstacleKind {
    pub fn size(&self) -> Vec2 {
        let (w, h) = match self {
            ObstacleKind::Ground => GROUND_OBSTACLE_SIZE,
            ObstacleKind::Flying => FLYING_OBSTACLE_SIZE,
        };
        Vec2::new(w, h)
    }

    /// Top edge y coordinate at spawn
    pub fn spawn_y(&self) -> f32 {
        match self {
            ObstacleKind::Ground => ground_line() - GROUND_OBSTACLE_LIFT,
            ObstacleKind::Flying => ground_line() - FLYING_OBSTACLE_LIFT,
        }
    }
}

/// The player-controlled runner
#[derive(Debug, Clone, PartialEq)]
pub struct Runner {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Vertical velocity (negative is up)
    pub vy: f32,
    pub jumping: bool,
    pub can_double_jump: bool,
    pub power_up: Option<PowerUpKind>,
    /// Frames left on the active power-up
    pub power_up_timer: u32,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            pos: Vec2::new(RUNNER_X, ground_line() - RUNNER_SIZE),
            size: Vec2::splat(RUNNER_SIZE),
            vy: 0.0,
            jumping: false,
            can_double_jump: false,
            power_up: None,
            power_up_timer: 0,
        }
    }
}

impl Runner {
    /// Resting y coordinate (top edge) when standing on the ground
    pub fn ground_y(&self) -> f32 {
        ground_line() - self.size.y
    }

    /// Whether the given power-up is currently active
    pub fn has(&self, kind: PowerUpKind) -> bool {
        self.power_up == Some(kind)
    }

    /// Replace any active power-up with `kind` for the full duration
    pub fn activate(&mut self, kind: PowerUpKind) {
        self.power_up = Some(kind);
        self.power_up_timer = POWER_UP_DURATION_FRAMES;
    }

    pub fn clear_power_up(&mut self) {
        self.power_up = None;
        self.power_up_timer = 0;
    }

    /// Count down the power-up timer, clearing the power-up when it runs out
    pub fn tick_power_up(&mut self) {
        if self.power_up_timer > 0 {
            self.power_up_timer -= 1;
            if self.power_up_timer == 0 {
                self.power_up = None;
            }
        }
    }

    /// Apply gravity and clamp to the ground line
    pub fn integrate(&mut self) {
        self.vy += GRAVITY;
        self.pos.y += self.vy;

        let ground_y = self.ground_y();
        if self.pos.y > ground_y {
            self.pos.y = ground_y;
            self.vy = 0.0;
            self.jumping = false;
        }
    }
}

/// An obstacle scrolling toward the runner
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub pos: Vec2,
    pub size: Vec2,
}

impl Obstacle {
    pub fn spawn(id: u32, kind: ObstacleKind) -> Self {
        Self {
            id,
            kind,
            pos: Vec2::new(FIELD_WIDTH, kind.spawn_y()),
            size: kind.size(),
        }
    }
}

/// A power-up pickup scrolling toward the runner
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub size: Vec2,
}

impl Pickup {
    pub fn spawn(id: u32, kind: PowerUpKind) -> Self {
        Self {
            id,
            kind,
            pos: Vec2::new(FIELD_WIDTH, ground_line() - PICKUP_LIFT),
            size: Vec2::splat(PICKUP_SIZE),
        }
    }
}

/// Notifications produced by a frame update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Whole-point score after this frame
    ScoreUpdated(u32),
    /// Entered a new evolution phase
    PhaseChanged(&'static str),
    PowerUpCollected(PowerUpKind),
    /// A shield soaked up an obstacle hit
    ShieldAbsorbed,
    /// Lethal hit; always followed by `GameOver`
    Collision,
    /// Final whole-point score of the run
    GameOver(u32),
}

/// Errors surfaced by the simulation API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("invalid status transition {from:?} -> {to:?}")]
    InvalidTransition { from: RunStatus, to: RunStatus },
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the spawn RNG was created from
    pub seed: u64,
    /// Spawn RNG (persists across resets so each run differs)
    pub rng: Pcg32,
    pub status: RunStatus,
    pub runner: Runner,
    /// Active obstacles in spawn order
    pub obstacles: Vec<Obstacle>,
    /// Active pickups in spawn order
    pub pickups: Vec<Pickup>,
    pub score: f64,
    /// Base scroll speed before power-up modifiers
    pub speed: f64,
    pub frame_count: u64,
    /// Background scroll offset in [0, FIELD_WIDTH)
    pub bg_offset: f32,
    /// Index into `EVOLUTION_PHASES` of the phase last announced
    pub phase_index: usize,
    next_id: u32,
}

impl GameState {
    /// Create a new run in the `Start` status with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            status: RunStatus::Start,
            runner: Runner::default(),
            obstacles: Vec::new(),
            pickups: Vec::new(),
            score: 0.0,
            speed: INITIAL_SPEED,
            frame_count: 0,
            bg_offset: 0.0,
            phase_index: 0,
            next_id: 1,
        }
    }

    /// Restore everything except the RNG stream to run-start values
    pub fn reset(&mut self) {
        self.runner = Runner::default();
        self.obstacles.clear();
        self.pickups.clear();
        self.score = 0.0;
        self.speed = INITIAL_SPEED;
        self.frame_count = 0;
        self.bg_offset = 0.0;
        self.phase_index = 0;
        self.next_id = 1;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Scroll speed after power-up modifiers
    pub fn effective_speed(&self) -> f64 {
        if self.runner.has(PowerUpKind::SlowMo) {
            self.speed * 0.5
        } else {
            self.speed
        }
    }

    /// Score as reported to the UI
    pub fn whole_score(&self) -> u32 {
        self.score.floor() as u32
    }

    /// Phase currently on screen
    pub fn phase(&self) -> &'static Phase {
        &EVOLUTION_PHASES[self.phase_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_starts_on_ground() {
        let runner = Runner::default();
        assert_eq!(runner.pos.y, runner.ground_y());
        assert_eq!(runner.pos.y + runner.size.y, ground_line());
        assert!(!runner.jumping);
        assert!(runner.power_up.is_none());
    }

    #[test]
    fn test_power_up_expires_after_duration() {
        let mut runner = Runner::default();
        runner.activate(PowerUpKind::SlowMo);
        for _ in 0..POWER_UP_DURATION_FRAMES - 1 {
            runner.tick_power_up();
        }
        assert!(runner.has(PowerUpKind::SlowMo));
        runner.tick_power_up();
        assert_eq!(runner.power_up, None);
        assert_eq!(runner.power_up_timer, 0);
    }

    #[test]
    fn test_activate_replaces_existing_power_up() {
        let mut runner = Runner::default();
        runner.activate(PowerUpKind::Shield);
        runner.power_up_timer = 12;
        runner.activate(PowerUpKind::DoubleJump);
        assert_eq!(runner.power_up, Some(PowerUpKind::DoubleJump));
        assert_eq!(runner.power_up_timer, POWER_UP_DURATION_FRAMES);
    }

    #[test]
    fn test_integrate_clamps_to_ground() {
        let mut runner = Runner::default();
        runner.jumping = true;
        runner.vy = 30.0;
        runner.integrate();
        assert_eq!(runner.pos.y, runner.ground_y());
        assert_eq!(runner.vy, 0.0);
        assert!(!runner.jumping);
    }

    #[test]
    fn test_obstacle_spawn_geometry() {
        let ground = Obstacle::spawn(1, ObstacleKind::Ground);
        assert_eq!(ground.pos, Vec2::new(FIELD_WIDTH, 325.0));
        assert_eq!(ground.size, Vec2::new(32.0, 45.0));

        let flying = Obstacle::spawn(2, ObstacleKind::Flying);
        assert_eq!(flying.pos, Vec2::new(FIELD_WIDTH, 280.0));
        assert_eq!(flying.size, Vec2::new(46.0, 45.0));
    }

    #[test]
    fn test_effective_speed_halved_by_slow_mo() {
        let mut state = GameState::new(1);
        state.speed = 8.0;
        assert_eq!(state.effective_speed(), 8.0);
        state.runner.activate(PowerUpKind::SlowMo);
        assert_eq!(state.effective_speed(), 4.0);
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let mut state = GameState::new(7);
        state.score = 321.7;
        state.speed = 9.0;
        state.frame_count = 4000;
        state.bg_offset = 123.0;
        state.phase_index = 1;
        state.runner.activate(PowerUpKind::Shield);
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle::spawn(id, ObstacleKind::Ground));

        state.reset();

        assert_eq!(state.score, 0.0);
        assert_eq!(state.speed, INITIAL_SPEED);
        assert_eq!(state.frame_count, 0);
        assert_eq!(state.bg_offset, 0.0);
        assert_eq!(state.phase_index, 0);
        assert_eq!(state.runner, Runner::default());
        assert!(state.obstacles.is_empty());
        assert!(state.pickups.is_empty());
    }
}
