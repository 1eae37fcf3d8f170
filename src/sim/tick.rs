//! Per-frame simulation update
//!
//! Core game loop that advances the run by one display frame. Jumps and
//! status changes are applied immediately by the shell, outside the frame.

use rand::Rng;

use super::collision::collides;
use super::phase::{EVOLUTION_PHASES, phase_index_for_score};
use super::state::{
    GameEvent, GameState, Obstacle, ObstacleKind, Pickup, PowerUpKind, RunStatus, SimError,
};
use crate::consts::*;

/// Frames between obstacle spawns at the given effective speed
///
/// Faster scrolling spawns more often: 100 frames at speed 5, 33 at speed 15.
pub fn spawn_interval(effective_speed: f64) -> u64 {
    ((100.0 / (effective_speed / 5.0)).floor() as u64).max(1)
}

/// Advance the run by one frame and return what happened
///
/// Does nothing unless the run is `Playing`. A lethal collision ends the frame
/// early: no pickups are collected and no score is added.
pub fn tick(state: &mut GameState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.status != RunStatus::Playing {
        return events;
    }

    state.frame_count += 1;

    // Phase transition (announced once per crossing)
    let phase_index = phase_index_for_score(state.score, &EVOLUTION_PHASES);
    if phase_index != state.phase_index {
        state.phase_index = phase_index;
        let name = EVOLUTION_PHASES[phase_index].name;
        log::info!("Phase shift: {} at score {}", name, state.whole_score());
        events.push(GameEvent::PhaseChanged(name));
    }

    state.runner.integrate();
    state.runner.tick_power_up();

    state.speed = (state.speed + SPEED_INCREMENT).min(MAX_SPEED);
    let speed = state.effective_speed();
    let step = speed as f32;

    state.bg_offset = (state.bg_offset + step * 0.5) % FIELD_WIDTH;

    // Spawns
    if state.frame_count % spawn_interval(speed) == 0 {
        let kind = if state.rng.random_bool(FLYING_CHANCE) {
            ObstacleKind::Flying
        } else {
            ObstacleKind::Ground
        };
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle::spawn(id, kind));
    }

    if state.frame_count % PICKUP_INTERVAL_FRAMES == 0 {
        let kind = PowerUpKind::ALL[state.rng.random_range(0..PowerUpKind::ALL.len())];
        let id = state.next_entity_id();
        state.pickups.push(Pickup::spawn(id, kind));
    }

    // Advance and cull anything fully past the left edge
    for obstacle in &mut state.obstacles {
        obstacle.pos.x -= step;
    }
    for pickup in &mut state.pickups {
        pickup.pos.x -= step;
    }
    state.obstacles.retain(|o| o.pos.x + o.size.x > 0.0);
    state.pickups.retain(|p| p.pos.x + p.size.x > 0.0);

    // Obstacle collisions
    let mut i = 0;
    while i < state.obstacles.len() {
        if !collides(&state.runner, &state.obstacles[i]) {
            i += 1;
            continue;
        }

        if state.runner.has(PowerUpKind::Shield) {
            state.runner.clear_power_up();
            state.obstacles.remove(i);
            events.push(GameEvent::ShieldAbsorbed);
            continue;
        }

        let final_score = state.whole_score();
        state.status = RunStatus::GameOver;
        log::info!(
            "Run over: score {} after {} frames",
            final_score,
            state.frame_count
        );
        events.push(GameEvent::Collision);
        events.push(GameEvent::GameOver(final_score));
        return events;
    }

    // Pickup collisions
    let mut i = 0;
    while i < state.pickups.len() {
        if collides(&state.runner, &state.pickups[i]) {
            let pickup = state.pickups.remove(i);
            state.runner.activate(pickup.kind);
            events.push(GameEvent::PowerUpCollected(pickup.kind));
        } else {
            i += 1;
        }
    }

    state.score += SCORE_PER_FRAME;
    events.push(GameEvent::ScoreUpdated(state.whole_score()));

    events
}

/// Jump input (key, pointer or touch)
///
/// Returns true if an impulse was applied. Ignored unless `Playing`.
pub fn jump(state: &mut GameState) -> bool {
    if state.status != RunStatus::Playing {
        return false;
    }

    let runner = &mut state.runner;
    if !runner.jumping {
        runner.vy = JUMP_FORCE;
        runner.jumping = true;
        runner.can_double_jump = runner.has(PowerUpKind::DoubleJump);
        true
    } else if runner.can_double_jump {
        runner.vy = JUMP_FORCE * DOUBLE_JUMP_FACTOR;
        runner.can_double_jump = false;
        true
    } else {
        false
    }
}

/// Apply a status change requested by the UI
///
/// Entering `Start` always resets the run. `GameOver` can only be left through
/// `Start`.
pub fn set_status(state: &mut GameState, next: RunStatus) -> Result<(), SimError> {
    let from = state.status;
    match (from, next) {
        (_, RunStatus::Start) => {
            state.reset();
        }
        (RunStatus::Start, RunStatus::Playing) => {
            log::info!("Run started (seed {})", state.seed);
        }
        (RunStatus::Playing, RunStatus::Playing) | (RunStatus::GameOver, RunStatus::GameOver) => {}
        (RunStatus::Playing, RunStatus::GameOver) => {
            log::info!("Run ended by request at score {}", state.whole_score());
        }
        (from, to) => return Err(SimError::InvalidTransition { from, to }),
    }
    state.status = next;
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::state::Runner;

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        set_status(&mut state, RunStatus::Playing).unwrap();
        state
    }

    /// Obstacle overlapping a grounded runner even after one frame of scrolling
    fn obstacle_on_runner(state: &mut GameState) {
        let id = state.next_entity_id();
        let mut obs = Obstacle::spawn(id, ObstacleKind::Ground);
        obs.pos.x = 60.0;
        state.obstacles.push(obs);
    }

    #[test]
    fn test_spawn_interval() {
        assert_eq!(spawn_interval(5.0), 100);
        assert_eq!(spawn_interval(10.0), 50);
        assert_eq!(spawn_interval(15.0), 33);
        assert_eq!(spawn_interval(2.5), 200);
    }

    #[test]
    fn test_tick_idle_outside_playing() {
        let mut state = GameState::new(1);
        assert!(tick(&mut state).is_empty());
        assert_eq!(state.frame_count, 0);

        state.status = RunStatus::GameOver;
        assert!(tick(&mut state).is_empty());
        assert_eq!(state.frame_count, 0);
    }

    #[test]
    fn test_score_starts_at_zero_after_reset() {
        let mut state = playing(3);
        for _ in 0..50 {
            tick(&mut state);
        }
        assert!(state.score > 0.0);
        set_status(&mut state, RunStatus::Start).unwrap();
        assert_eq!(state.score, 0.0);
        assert_eq!(state.whole_score(), 0);
    }

    #[test]
    fn test_score_update_every_frame() {
        let mut state = playing(3);
        let mut reported = Vec::new();
        for _ in 0..25 {
            for event in tick(&mut state) {
                if let GameEvent::ScoreUpdated(s) = event {
                    reported.push(s);
                }
            }
        }
        assert_eq!(reported.len(), 25);
        assert_eq!(*reported.last().unwrap(), 2);
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_obstacle_spawns_at_right_edge() {
        let mut state = playing(11);
        state.speed = MAX_SPEED;
        let interval = spawn_interval(MAX_SPEED);
        state.frame_count = interval * 3 - 1;

        tick(&mut state);

        assert_eq!(state.frame_count % interval, 0);
        assert_eq!(state.obstacles.len(), 1);
        // Spawned at FIELD_WIDTH, then advanced once this frame
        assert_eq!(state.obstacles[0].pos.x, FIELD_WIDTH - MAX_SPEED as f32);
    }

    #[test]
    fn test_no_spawn_off_interval() {
        let mut state = playing(11);
        state.speed = MAX_SPEED;
        state.frame_count = spawn_interval(MAX_SPEED) * 3;
        tick(&mut state);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_pickup_spawns_every_800_frames() {
        let mut state = playing(5);
        state.speed = MAX_SPEED;
        state.frame_count = PICKUP_INTERVAL_FRAMES - 1;
        tick(&mut state);
        assert_eq!(state.pickups.len(), 1);
        let pickup = &state.pickups[0];
        assert_eq!(pickup.pos.x, FIELD_WIDTH - MAX_SPEED as f32);
        assert_eq!(pickup.pos.y, crate::ground_line() - PICKUP_LIFT);
    }

    /// Tick with the field kept clear so the run never ends
    fn tick_clear(state: &mut GameState) {
        state.obstacles.clear();
        state.pickups.clear();
        tick(state);
    }

    #[test]
    fn test_speed_ramp_keeps_spawn_schedule() {
        let mut state = playing(21);
        for _ in 0..618 {
            tick_clear(&mut state);
        }
        assert_eq!(state.frame_count, 618);
        assert!((state.speed - 5.618).abs() < 1e-9);
        // floor(100 / (5.618 / 5)) = 88; a drifting f32 ramp lands on 89
        assert_eq!(spawn_interval(state.speed), 88);
    }

    #[test]
    fn test_speed_reaches_cap_on_schedule() {
        let mut state = playing(21);
        let mut capped_at = None;
        while capped_at.is_none() && state.frame_count < 20_000 {
            tick_clear(&mut state);
            if state.speed == MAX_SPEED {
                capped_at = Some(state.frame_count);
            }
        }
        let frame = capped_at.unwrap();
        assert!((10_000..=10_001).contains(&frame), "capped at frame {frame}");
    }

    #[test]
    fn test_speed_clamped_at_max() {
        let mut state = playing(4);
        state.speed = MAX_SPEED - SPEED_INCREMENT / 2.0;
        for _ in 0..10 {
            tick_clear(&mut state);
            assert_eq!(state.speed, MAX_SPEED);
            assert_eq!(state.effective_speed(), MAX_SPEED);
        }

        state.runner.activate(PowerUpKind::SlowMo);
        tick_clear(&mut state);
        assert_eq!(state.speed, MAX_SPEED);
        assert_eq!(state.effective_speed(), MAX_SPEED * 0.5);
    }

    #[test]
    fn test_offscreen_entities_culled() {
        let mut state = playing(5);
        let id = state.next_entity_id();
        let mut obs = Obstacle::spawn(id, ObstacleKind::Flying);
        obs.pos.x = -obs.size.x + 1.0;
        state.obstacles.push(obs);
        let id = state.next_entity_id();
        let mut pickup = Pickup::spawn(id, PowerUpKind::Shield);
        pickup.pos.x = -20.0;
        state.pickups.push(pickup);

        tick(&mut state);

        assert!(state.obstacles.is_empty());
        assert!(state.pickups.is_empty());
    }

    #[test]
    fn test_collision_ends_run_once() {
        let mut state = playing(9);
        state.score = 42.7;
        obstacle_on_runner(&mut state);

        let events = tick(&mut state);

        assert_eq!(
            events,
            vec![GameEvent::Collision, GameEvent::GameOver(42)]
        );
        assert_eq!(state.status, RunStatus::GameOver);
        // Score frozen at the moment of collision
        assert_eq!(state.score, 42.7);

        // Terminal: further frames report nothing
        assert!(tick(&mut state).is_empty());
        assert!(tick(&mut state).is_empty());
    }

    #[test]
    fn test_shield_absorbs_collision() {
        let mut state = playing(9);
        state.runner.activate(PowerUpKind::Shield);
        obstacle_on_runner(&mut state);
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle::spawn(id, ObstacleKind::Ground));

        let events = tick(&mut state);

        assert!(events.contains(&GameEvent::ShieldAbsorbed));
        assert_eq!(state.status, RunStatus::Playing);
        assert_eq!(state.runner.power_up, None);
        assert_eq!(state.runner.power_up_timer, 0);
        // Only the far obstacle remains
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].id, id);
    }

    #[test]
    fn test_shield_only_absorbs_one_hit() {
        let mut state = playing(9);
        state.runner.activate(PowerUpKind::Shield);
        obstacle_on_runner(&mut state);
        obstacle_on_runner(&mut state);

        let events = tick(&mut state);

        assert_eq!(
            events,
            vec![
                GameEvent::ShieldAbsorbed,
                GameEvent::Collision,
                GameEvent::GameOver(0)
            ]
        );
        assert_eq!(state.status, RunStatus::GameOver);
    }

    #[test]
    fn test_pickup_collected() {
        let mut state = playing(2);
        let id = state.next_entity_id();
        let mut pickup = Pickup::spawn(id, PowerUpKind::DoubleJump);
        pickup.pos = Vec2::new(60.0, 330.0);
        state.pickups.push(pickup);

        let events = tick(&mut state);

        assert!(events.contains(&GameEvent::PowerUpCollected(PowerUpKind::DoubleJump)));
        assert!(state.pickups.is_empty());
        assert_eq!(state.runner.power_up, Some(PowerUpKind::DoubleJump));
        assert_eq!(state.runner.power_up_timer, POWER_UP_DURATION_FRAMES);
    }

    #[test]
    fn test_pickup_replaces_active_power_up() {
        let mut state = playing(2);
        state.runner.activate(PowerUpKind::SlowMo);
        let id = state.next_entity_id();
        let mut pickup = Pickup::spawn(id, PowerUpKind::Shield);
        pickup.pos = Vec2::new(60.0, 330.0);
        state.pickups.push(pickup);

        tick(&mut state);

        assert_eq!(state.runner.power_up, Some(PowerUpKind::Shield));
    }

    #[test]
    fn test_phase_change_fires_once() {
        let mut state = playing(4);
        state.score = 499.95;

        let first = tick(&mut state);
        assert!(!first.iter().any(|e| matches!(e, GameEvent::PhaseChanged(_))));

        let second = tick(&mut state);
        assert!(second.contains(&GameEvent::PhaseChanged("VIRTUAL_VOID")));
        assert_eq!(state.phase().name, "VIRTUAL_VOID");

        for _ in 0..20 {
            let events = tick(&mut state);
            assert!(!events.iter().any(|e| matches!(e, GameEvent::PhaseChanged(_))));
        }
    }

    #[test]
    fn test_phase_resets_on_start() {
        let mut state = playing(4);
        state.score = 1600.0;
        tick(&mut state);
        assert_eq!(state.phase().name, "DATA_HAZARD");

        set_status(&mut state, RunStatus::Start).unwrap();
        assert_eq!(state.phase().name, "NEON_WAVE");
    }

    #[test]
    fn test_jump_from_ground() {
        let mut state = playing(1);
        assert!(jump(&mut state));
        assert_eq!(state.runner.vy, JUMP_FORCE);
        assert!(state.runner.jumping);
        assert!(!state.runner.can_double_jump);
    }

    #[test]
    fn test_airborne_jump_without_double_jump_is_noop() {
        let mut state = playing(1);
        jump(&mut state);
        tick(&mut state);
        let before = state.runner.clone();

        assert!(!jump(&mut state));
        assert_eq!(state.runner, before);
    }

    #[test]
    fn test_double_jump() {
        let mut state = playing(1);
        state.runner.activate(PowerUpKind::DoubleJump);

        assert!(jump(&mut state));
        assert!(state.runner.can_double_jump);
        tick(&mut state);

        assert!(jump(&mut state));
        assert_eq!(state.runner.vy, JUMP_FORCE * DOUBLE_JUMP_FACTOR);
        assert!(!state.runner.can_double_jump);

        let before = state.runner.clone();
        assert!(!jump(&mut state));
        assert_eq!(state.runner, before);
    }

    #[test]
    fn test_jump_ignored_unless_playing() {
        let mut state = GameState::new(1);
        assert!(!jump(&mut state));
        assert_eq!(state.runner, Runner::default());
    }

    #[test]
    fn test_jump_lands_back_on_ground() {
        let mut state = playing(1);
        jump(&mut state);
        let mut airborne_frames = 0;
        while state.runner.jumping {
            tick(&mut state);
            assert!(state.runner.pos.y <= state.runner.ground_y());
            airborne_frames += 1;
            assert!(airborne_frames < 100);
        }
        assert_eq!(state.runner.pos.y, state.runner.ground_y());
        assert_eq!(state.runner.vy, 0.0);
    }

    #[test]
    fn test_status_transitions() {
        let mut state = GameState::new(1);
        assert_eq!(
            set_status(&mut state, RunStatus::GameOver),
            Err(SimError::InvalidTransition {
                from: RunStatus::Start,
                to: RunStatus::GameOver
            })
        );
        assert_eq!(state.status, RunStatus::Start);

        set_status(&mut state, RunStatus::Playing).unwrap();
        set_status(&mut state, RunStatus::GameOver).unwrap();

        assert!(set_status(&mut state, RunStatus::Playing).is_err());
        assert_eq!(state.status, RunStatus::GameOver);

        set_status(&mut state, RunStatus::Start).unwrap();
        set_status(&mut state, RunStatus::Playing).unwrap();
        assert_eq!(state.status, RunStatus::Playing);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical runs
        let mut state1 = playing(99999);
        let mut state2 = playing(99999);

        for frame in 0..3000u32 {
            if frame % 37 == 0 {
                jump(&mut state1);
                jump(&mut state2);
            }
            let e1 = tick(&mut state1);
            let e2 = tick(&mut state2);
            assert_eq!(e1, e2);
        }

        assert_eq!(state1.frame_count, state2.frame_count);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.obstacles, state2.obstacles);
        assert_eq!(state1.pickups, state2.pickups);
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::*;
        use crate::sim::state::GameState;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(24))]

            #[test]
            fn frame_invariants_hold(
                seed in any::<u64>(),
                jumps in proptest::collection::vec(any::<bool>(), 1500),
            ) {
                let mut state = GameState::new(seed);
                set_status(&mut state, RunStatus::Playing).unwrap();

                let mut last_score = state.score;
                let mut game_overs = 0;
                for press in jumps {
                    if press {
                        jump(&mut state);
                    }
                    for event in tick(&mut state) {
                        if let GameEvent::GameOver(score) = event {
                            game_overs += 1;
                            prop_assert_eq!(score, state.score.floor() as u32);
                        }
                    }

                    prop_assert!(state.score >= last_score);
                    last_score = state.score;
                    prop_assert!(state.speed >= INITIAL_SPEED && state.speed <= MAX_SPEED);
                    prop_assert!(state.effective_speed() <= state.speed);
                    prop_assert!(state.runner.pos.y <= state.runner.ground_y());
                    prop_assert!(state.bg_offset >= 0.0 && state.bg_offset < FIELD_WIDTH);
                    prop_assert!(state.obstacles.iter().all(|o| o.pos.x + o.size.x > 0.0));
                    prop_assert!(state.pickups.iter().all(|p| p.pos.x + p.size.x > 0.0));
                    if state.runner.power_up.is_none() {
                        prop_assert_eq!(state.runner.power_up_timer, 0);
                    }
                }
                prop_assert!(game_overs <= 1);
            }
        }
    }
}
