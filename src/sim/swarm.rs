//! Swarm physics
//!
//! Runners are pulled toward a shared control point and pushed apart by a
//! two-tier repulsion. Forces are computed from a snapshot of positions, then
//! integrated into velocity (damped, speed-capped) and position. A positional
//! correction pass afterwards resolves any remaining overlap.

use glam::Vec2;

use super::lifecycle::Lifecycle;
use super::registry::RunnerColumnsMut;
use crate::tuning::SwarmTuning;

/// Force on runner `i` from the control point and every other eligible runner
fn force_on(i: usize, positions: &[Vec2], lives: &[Lifecycle], control: Vec2, t: &SwarmTuning) -> Vec2 {
    let pos = positions[i];
    let mut force = Vec2::ZERO;

    let to_control = control - pos;
    if to_control.length() > t.attraction_min_distance {
        force += to_control * t.attraction_strength;
    }

    for (j, &other) in positions.iter().enumerate() {
        if j == i || !lives[j].is_eligible() {
            continue;
        }
        let away = pos - other;
        let d = away.length();
        if d < t.hard_repulsion_distance && d > t.hard_repulsion_floor {
            let push = t.hard_repulsion_strength * (t.hard_repulsion_distance - d) / t.hard_repulsion_distance;
            force += away / d * push;
        } else if d < t.comfort_distance && d > t.hard_repulsion_distance {
            let push = t.soft_repulsion_strength * (t.comfort_distance - d) / t.comfort_distance;
            force += away / d * push;
        }
    }
    force
}

/// Advance every eligible runner by `dt`
///
/// `forward` is the distance the camera travelled this tick; eligible runners
/// are carried along with it before forces apply.
pub fn step(runners: RunnerColumnsMut<'_>, control: Vec2, forward: f32, tuning: &SwarmTuning, dt: f32) {
    let RunnerColumnsMut {
        positions,
        velocities,
        lives,
        ..
    } = runners;

    for (pos, life) in positions.iter_mut().zip(lives.iter()) {
        if life.is_eligible() {
            pos.y -= forward;
        }
    }

    let forces: Vec<Vec2> = (0..positions.len())
        .map(|i| {
            if lives[i].is_eligible() {
                force_on(i, &*positions, &*lives, control, tuning)
            } else {
                Vec2::ZERO
            }
        })
        .collect();

    let damping = tuning.damping_per_tick.powf(dt * 60.0);
    for i in 0..positions.len() {
        if !lives[i].is_eligible() {
            continue;
        }
        let vel = ((velocities[i] + forces[i] * dt) * damping).clamp_length_max(tuning.max_speed);
        velocities[i] = vel;
        positions[i] += vel * dt;
    }

    separate(positions, lives, tuning);
}

/// Push apart any eligible pair closer than the minimum separation
///
/// Each runner of an overlapping pair moves by half the overlap. Pairs at
/// exactly the minimum separation are left alone.
pub fn separate(positions: &mut [Vec2], lives: &[Lifecycle], tuning: &SwarmTuning) {
    let n = positions.len();
    for i in 0..n {
        if !lives[i].is_eligible() {
            continue;
        }
        for j in (i + 1)..n {
            if !lives[j].is_eligible() {
                continue;
            }
            let delta = positions[i] - positions[j];
            let d = delta.length();
            if d < tuning.min_separation && d > tuning.separation_floor {
                let push = delta / d * (tuning.min_separation - d) * 0.5;
                positions[i] += push;
                positions[j] -= push;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::registry::RunnerPool;

    fn lives(n: usize) -> Vec<Lifecycle> {
        vec![Lifecycle::new(0.0); n]
    }

    #[test]
    fn test_separation_boundary_is_exclusive() {
        let t = SwarmTuning::default();
        let mut positions = vec![Vec2::ZERO, Vec2::new(t.min_separation, 0.0)];
        separate(&mut positions, &lives(2), &t);
        assert_eq!(positions[0], Vec2::ZERO);
        assert_eq!(positions[1], Vec2::new(t.min_separation, 0.0));
    }

    #[test]
    fn test_separation_pushes_symmetrically() {
        let t = SwarmTuning::default();
        let mut positions = vec![Vec2::ZERO, Vec2::new(0.15, 0.0)];
        separate(&mut positions, &lives(2), &t);
        let gap = positions[0].distance(positions[1]);
        assert!((gap - t.min_separation).abs() < 0.001);
        // midpoint unchanged
        assert!(((positions[0].x + positions[1].x) / 2.0 - 0.075).abs() < 0.001);
    }

    #[test]
    fn test_coincident_pair_is_skipped() {
        let t = SwarmTuning::default();
        let mut positions = vec![Vec2::ZERO, Vec2::new(0.005, 0.0)];
        separate(&mut positions, &lives(2), &t);
        assert_eq!(positions[1].x, 0.005);
    }

    #[test]
    fn test_hard_boundary_has_no_hard_force() {
        let t = SwarmTuning::default();
        let positions = [Vec2::ZERO, Vec2::new(t.hard_repulsion_distance, 0.0)];
        // control at the runner so attraction is inside the dead zone
        let f = force_on(0, &positions, &lives(2), Vec2::ZERO, &t);
        assert_eq!(f, Vec2::ZERO);

        let closer = [Vec2::ZERO, Vec2::new(t.hard_repulsion_distance - 0.1, 0.0)];
        let f = force_on(0, &closer, &lives(2), Vec2::ZERO, &t);
        assert!(f.x < 0.0);
    }

    #[test]
    fn test_attraction_dead_zone() {
        let t = SwarmTuning::default();
        let positions = [Vec2::ZERO];
        let f = force_on(0, &positions, &lives(1), Vec2::new(0.2, 0.0), &t);
        assert_eq!(f, Vec2::ZERO);
        let f = force_on(0, &positions, &lives(1), Vec2::new(1.0, 0.0), &t);
        assert!(f.x > 0.0);
    }

    #[test]
    fn test_swarm_converges_without_overlap() {
        let t = SwarmTuning::default();
        let mut pool = RunnerPool::default();
        for i in 0..20 {
            pool.spawn(Vec2::new((i % 5) as f32 * 0.3 - 0.6, (i / 5) as f32 * 0.3), 0.0);
        }
        let control = Vec2::new(1.0, -2.0);
        for _ in 0..600 {
            step(pool.columns_mut(), control, 0.0, &t, SIM_DT);
        }
        let centroid = pool.positions().iter().copied().sum::<Vec2>() / pool.len() as f32;
        assert!(centroid.distance(control) < 0.5);
        for v in pool.velocities() {
            assert!(v.length() <= t.max_speed + 1e-4);
        }
    }

    #[test]
    fn test_dying_runner_does_not_move() {
        let t = SwarmTuning::default();
        let mut pool = RunnerPool::default();
        pool.spawn(Vec2::ZERO, 0.0);
        pool.life_mut(0).start_dying(3);
        step(pool.columns_mut(), Vec2::new(2.0, 0.0), 0.1, &t, SIM_DT);
        assert_eq!(pool.positions()[0], Vec2::ZERO);
    }
}
