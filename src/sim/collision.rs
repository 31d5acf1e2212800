//! Collision detection and interaction resolution
//!
//! Each resolver scans the collection it may remove from in descending index
//! order, so an in-loop removal never shifts an element that is still pending.
//! Runners are never removed here: lethal hits only start the `Dying` state and
//! the registry sweeps finished runners at the end of the tick.

use glam::Vec2;
use rand::Rng;

use super::gates::{Gate, GateOutcome, Side, resolve_outcome};
use super::lifecycle::LossCause;
use super::registry::{Coin, Obstacle};
use super::state::{GameEvent, GameState};
use crate::consts::GROUND_Y;
use crate::ground_distance;
use crate::tuning::GateTuning;

/// Whether a runner at `pos` is passing through `gate`
pub fn in_gate_band(gate: &Gate, pos: Vec2, tuning: &GateTuning) -> bool {
    let in_lane = match gate.side {
        Side::Left => pos.x >= -tuning.lane_width && pos.x <= 0.0,
        Side::Right => pos.x >= 0.0 && pos.x <= tuning.lane_width,
    };
    in_lane && (gate.z - pos.y).abs() < tuning.depth_tolerance
}

/// Whether a runner at `pos`/`height` hits `obstacle`
///
/// A runner is exempt only when strictly higher than ground + clearance.
pub fn obstacle_hit(obstacle: &Obstacle, pos: Vec2, height: f32, clearance: f32) -> bool {
    let delta = (pos - obstacle.pos).abs();
    let overlaps = delta.x < obstacle.half_extents.x && delta.y < obstacle.half_extents.y;
    overlaps && height <= GROUND_Y + clearance
}

#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    ground_distance(a, b) < radius
}

/// Trigger gates for runners passing through, then retire gates behind the camera
pub fn resolve_gates(state: &mut GameState) {
    for g in (0..state.registry.gates.len()).rev() {
        let gate = state.registry.gates[g].clone();
        let candidates = state.registry.runners.len();

        for i in (0..candidates).rev() {
            let runners = &state.registry.runners;
            if !runners.lives()[i].is_eligible() || state.registry.visited.contains(gate.pair_id, i) {
                continue;
            }
            let pos = runners.positions()[i];
            if !in_gate_band(&gate, pos, &state.config.gates) {
                continue;
            }
            state.registry.visited.insert(gate.pair_id, i);
            apply_gate(state, &gate, i, pos);
        }

        if gate.z > state.camera_z + state.config.gates.cleanup_distance {
            state.registry.gates.remove(g);
            state.registry.visited.purge_pair(gate.pair_id);
        }
    }
}

fn apply_gate(state: &mut GameState, gate: &Gate, index: usize, pos: Vec2) {
    let chance = state.config.gates.duplication_chance;
    match resolve_outcome(gate, chance) {
        GateOutcome::Add { probability } => {
            if state.rng.random::<f32>() < probability {
                state.spawn_clone(pos, gate.pair_id);
                state.emit(GameEvent::RunnersGained { count: 1 });
            }
        }
        GateOutcome::Remove => state.kill_runner(index, LossCause::Gate),
        GateOutcome::Multiply { factor } => {
            for _ in 1..factor {
                state.spawn_clone(pos, gate.pair_id);
            }
            if factor > 1 {
                state.emit(GameEvent::RunnersGained { count: factor - 1 });
            }
        }
    }
}

/// Apply projectile damage; kill enemies at zero health
pub fn resolve_projectile_hits(state: &mut GameState) {
    let radius = state.config.weapon.damage_radius;
    for e in (0..state.registry.enemies.len()).rev() {
        let enemy_pos = state.registry.enemies[e].pos;
        let hit = (0..state.registry.projectiles.len())
            .rev()
            .find(|&p| within_radius(state.registry.projectiles[p].pos, enemy_pos, radius));
        let Some(p) = hit else {
            continue;
        };

        let projectile = state.registry.projectiles.remove(p);
        let enemy = &mut state.registry.enemies[e];
        enemy.health -= projectile.damage as i32;
        if enemy.health > 0 {
            continue;
        }

        state.registry.enemies.remove(e);
        state.score += 1;
        state.emit(GameEvent::EnemyKilled { score: state.score });
        if state.rng.random::<f32>() < state.config.pickups.drop_chance {
            state.registry.coins.push(Coin {
                pos: enemy_pos,
                collected: false,
            });
        }
    }
}

/// Each enemy catches at most one runner per tick and survives the capture
pub fn resolve_captures(state: &mut GameState) {
    let radius = state.config.enemies.capture_radius;
    for e in (0..state.registry.enemies.len()).rev() {
        let enemy_pos = state.registry.enemies[e].pos;
        let runners = &state.registry.runners;
        let caught = (0..runners.len())
            .rev()
            .find(|&i| runners.lives()[i].is_eligible() && within_radius(runners.positions()[i], enemy_pos, radius));
        if let Some(i) = caught {
            state.kill_runner(i, LossCause::Captured);
        }
    }
}

/// Each obstacle hits at most one runner per tick
pub fn resolve_obstacles(state: &mut GameState) {
    let clearance = state.config.obstacles.clearance;
    for o in (0..state.registry.obstacles.len()).rev() {
        let obstacle = &state.registry.obstacles[o];
        let runners = &state.registry.runners;
        let hit = (0..runners.len()).rev().find(|&i| {
            runners.lives()[i].is_eligible()
                && obstacle_hit(obstacle, runners.positions()[i], runners.heights()[i], clearance)
        });
        if let Some(i) = hit {
            state.kill_runner(i, LossCause::Obstacle);
        }
    }
}

/// Collect coins touched by any eligible runner
pub fn resolve_pickups(state: &mut GameState) {
    let radius = state.config.pickups.collection_radius;
    for c in (0..state.registry.coins.len()).rev() {
        let coin_pos = state.registry.coins[c].pos;
        let runners = &state.registry.runners;
        let touched = (0..runners.len())
            .any(|i| runners.lives()[i].is_eligible() && within_radius(runners.positions()[i], coin_pos, radius));
        if !touched {
            continue;
        }
        state.registry.coins[c].collected = true;
        state.registry.coins.remove(c);
        let balance = state.economy.credit(state.config.pickups.value);
        state.emit(GameEvent::CoinCollected { balance });
    }
}

/// Drop enemies, obstacles and coins that fell far enough behind the camera
pub fn retire_behind_camera(state: &mut GameState) {
    let camera_z = state.camera_z;
    let config = &state.config;
    state
        .registry
        .enemies
        .retain(|e| e.pos.y <= camera_z + config.enemies.cleanup_distance);
    state
        .registry
        .obstacles
        .retain(|o| o.pos.y <= camera_z + config.obstacles.cleanup_distance);
    state
        .registry
        .coins
        .retain(|c| !c.collected && c.pos.y <= camera_z + config.pickups.cleanup_distance);
}
