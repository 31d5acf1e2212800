//! Fixed timestep simulation tick
//!
//! Advances a run deterministically. Per tick, in order: difficulty, camera and
//! control point, world streaming, entity movement, interactions, runner
//! lifecycles, swarm physics, and finally the sweep of finished runners.

use glam::Vec2;
use rand::Rng;

use super::collision::{
    resolve_captures, resolve_gates, resolve_obstacles, resolve_pickups, resolve_projectile_hits,
    retire_behind_camera,
};
use super::lifecycle::LossCause;
use super::registry::Projectile;
use super::state::{GameEvent, GamePhase, GameState};
use super::swarm;
use crate::approach;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Lateral target for the control point (pointer drag)
    pub target_x: Option<f32>,
    /// Jump (edge-triggered)
    pub jump: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        match state.phase {
            GamePhase::Running => state.pause(),
            GamePhase::Paused => state.resume(),
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if state.phase != GamePhase::Running {
        return;
    }

    state.time_ticks += 1;

    let play_time = state.time_ticks as f64 * dt as f64;
    if let Some(level) = state.difficulty.advance_to(play_time, &state.config.difficulty) {
        log::info!("Level {level} reached");
        state.emit(GameEvent::LevelUp { level });
    }

    let forward = move_camera(state, input, dt);
    stream_world(state, dt);

    move_enemies(state, dt);
    move_projectiles(state, dt);

    resolve_gates(state);
    resolve_projectile_hits(state);
    resolve_captures(state);
    resolve_obstacles(state);
    resolve_pickups(state);
    retire_behind_camera(state);

    update_runners(state, input.jump, dt);

    swarm::step(
        state.registry.runners.columns_mut(),
        state.control,
        forward,
        &state.config.swarm,
        dt,
    );

    state.sweep_removed();
}

/// Move camera and control point forward, steer the control point; returns distance travelled
fn move_camera(state: &mut GameState, input: &TickInput, dt: f32) -> f32 {
    let corridor = &state.config.corridor;
    let difficulty = &state.config.difficulty;

    let forward = corridor.camera_speed * state.difficulty.speed_multiplier(difficulty) * dt;
    state.camera_z -= forward;
    state.control.y -= forward;

    if let Some(x) = input.target_x {
        state.target_x = x.clamp(-corridor.control_bounds, corridor.control_bounds);
    }
    let max_step = corridor.control_speed * state.difficulty.control_multiplier(difficulty) * dt;
    state.control.x = approach(state.control.x, state.target_x, max_step);

    forward
}

fn stream_world(state: &mut GameState, dt: f32) {
    let camera_z = state.camera_z;
    let level = state.difficulty.level;

    state.world.update_corridor(camera_z, &state.config.streaming);
    state
        .world
        .recycle_stars(camera_z, &state.config.streaming, &mut state.rng);
    state
        .world
        .generate_gates(camera_z, level, &state.config, &mut state.registry, &mut state.rng);
    state.world.maybe_spawn_enemy(
        camera_z,
        &state.difficulty,
        &state.config,
        &mut state.registry,
        &mut state.rng,
        dt,
    );
}

fn move_enemies(state: &mut GameState, dt: f32) {
    let tuning = &state.config.enemies;
    for enemy in &mut state.registry.enemies {
        enemy.pos.y += tuning.speed * dt;
        enemy.phase = (enemy.phase + tuning.animation_rate * dt) % std::f32::consts::TAU;
    }
}

fn move_projectiles(state: &mut GameState, dt: f32) {
    let range = state.config.weapon.range;
    state.registry.projectiles.retain_mut(|p| {
        let step = p.speed * dt;
        p.pos.y -= step;
        p.traveled += step;
        p.traveled <= range
    });
}

/// Fall-off checks, jumps, shooting and lifecycle timers
fn update_runners(state: &mut GameState, jump: bool, dt: f32) {
    let stats = state.economy.stats();
    let fall_bounds = state.config.corridor.fall_bounds;
    let tuning = &state.config.runner;
    let cols = state.registry.runners.columns_mut();
    let mut fell = 0;

    for i in 0..cols.positions.len() {
        let life = &mut cols.lives[i];
        let pos = cols.positions[i];

        if life.is_eligible() && pos.x.abs() > fall_bounds && life.start_falling(state.rng.random()) {
            fell += 1;
        }

        if jump {
            life.start_jump(tuning);
        }

        if life.can_shoot() {
            state.registry.projectiles.push(Projectile {
                pos: pos - Vec2::new(0.0, 0.1),
                height: cols.heights[i] + CHEST_HEIGHT,
                damage: stats.damage,
                speed: stats.bullet_velocity,
                traveled: 0.0,
            });
            life.fired(stats.fire_interval);
        }

        life.advance(dt, &mut cols.heights[i], tuning);
    }

    for _ in 0..fell {
        state.emit(GameEvent::RunnerLost {
            cause: LossCause::Fell,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::EconomyLedger;
    use crate::sim::lifecycle::RunnerState;
    use crate::tuning::SimConfig;

    fn quiet_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.streaming.star_count = 10;
        config.enemies.spawn_rate = 0.0;
        config
    }

    fn new_state(seed: u64) -> GameState {
        GameState::new(seed, quiet_config(), EconomyLedger::default())
    }

    #[test]
    fn test_camera_and_swarm_advance() {
        let mut state = new_state(1);
        let input = TickInput::default();
        for _ in 0..60 {
            tick(&mut state, &input, SIM_DT);
        }
        assert!((state.camera_z - (CAMERA_START_Z - 7.2)).abs() < 0.01);
        let runner = state.registry.runners.positions()[0];
        assert!((runner.y - state.control.y).abs() < 0.5);
        assert_eq!(state.time_ticks, 60);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = new_state(2);
        tick(
            &mut state,
            &TickInput {
                pause: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.phase, GamePhase::Paused);
        let before = state.snapshot();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.snapshot(), before);

        tick(
            &mut state,
            &TickInput {
                pause: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_determinism() {
        let mut config = quiet_config();
        config.enemies.spawn_rate = 3.0;
        let mut state1 = GameState::new(99999, config.clone(), EconomyLedger::default());
        let mut state2 = GameState::new(99999, config, EconomyLedger::default());

        let inputs = [
            TickInput {
                target_x: Some(-1.5),
                ..Default::default()
            },
            TickInput {
                jump: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for step in 0..900 {
            let input = &inputs[step % inputs.len()];
            tick(&mut state1, input, SIM_DT);
            tick(&mut state2, input, SIM_DT);
        }
        assert_eq!(state1.snapshot(), state2.snapshot());
    }

    #[test]
    fn test_control_point_is_clamped_and_rate_limited() {
        let mut state = new_state(3);
        tick(
            &mut state,
            &TickInput {
                target_x: Some(10.0),
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.target_x, 2.5);
        assert!((state.control.x - 10.8 * SIM_DT).abs() < 0.001);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.control.x, 2.5);
    }

    #[test]
    fn test_level_up_after_period() {
        let mut config = quiet_config();
        // keep gates and obstacles out of reach
        config.gates.initial_z = -1.0e6;
        let mut state = GameState::new(4, config, EconomyLedger::default());
        let ticks = (30.0 / SIM_DT).ceil() as usize + 1;
        let mut level_ups = Vec::new();
        for _ in 0..ticks {
            tick(&mut state, &TickInput::default(), SIM_DT);
            level_ups.extend(
                state
                    .drain_events()
                    .into_iter()
                    .filter(|e| matches!(e, GameEvent::LevelUp { .. })),
            );
        }
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.level(), 2);
        assert_eq!(level_ups, vec![GameEvent::LevelUp { level: 2 }]);
    }

    #[test]
    fn test_runner_falls_past_bound() {
        let mut state = new_state(5);
        state.registry.runners.columns_mut().positions[0].x = state.config.corridor.fall_bounds;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.registry.runners.lives()[0].state, RunnerState::Active);

        state.registry.runners.columns_mut().positions[0].x = state.config.corridor.fall_bounds + 0.01;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(matches!(
            state.registry.runners.lives()[0].state,
            RunnerState::Falling { .. }
        ));
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::RunnerLost { cause: LossCause::Fell })
        );

        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.registry.runners.is_empty());
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::GameOver { score: 0 })
        );
    }

    #[test]
    fn test_jump_lifts_runner() {
        let mut state = new_state(6);
        tick(
            &mut state,
            &TickInput {
                jump: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert!(matches!(
            state.registry.runners.lives()[0].state,
            RunnerState::Jumping { .. }
        ));
        for _ in 0..20 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.registry.runners.heights()[0] > GROUND_Y + 0.4);
    }

    #[test]
    fn test_runner_shoots_on_cooldown() {
        let mut state = new_state(7);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.registry.projectiles.len(), 1);
        let shot = &state.registry.projectiles[0];
        assert_eq!(shot.damage, 1);
        assert!((shot.height - (GROUND_Y + CHEST_HEIGHT)).abs() < 0.001);

        // 0.5 s interval: no second shot for 29 more ticks
        for _ in 0..29 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.registry.projectiles.len(), 1);
        for _ in 0..2 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.registry.projectiles.len(), 2);
    }

    #[test]
    fn test_projectiles_expire_after_range() {
        let mut state = new_state(8);
        state.registry.projectiles.push(Projectile {
            pos: Vec2::ZERO,
            height: 0.0,
            damage: 1,
            speed: 18.0,
            traveled: 49.9,
        });
        move_projectiles(&mut state, SIM_DT);
        assert!(state.registry.projectiles.is_empty());
    }

    #[test]
    fn test_game_over_stops_ticking() {
        let mut state = new_state(9);
        state.kill_runner(0, LossCause::Obstacle);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        let frozen = state.snapshot();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.snapshot(), frozen);
    }
}
