//! World streaming
//!
//! Everything generated relative to the camera: corridor tiles, the
//! background star field, gate pairs with their obstacles, and enemy spawns.

use std::collections::VecDeque;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyState;
use super::gates::{Gate, GateKind, select_gate_type};
use super::registry::{Enemy, Obstacle, Registry};
use crate::tuning::{SimConfig, StreamingTuning};

/// One fixed-length corridor tile
///
/// Tile `index` spans depths `[-(index + 1) * len, -index * len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorridorSegment {
    pub index: i64,
}

impl CorridorSegment {
    /// Depth of the edge nearest the start line
    pub fn near_z(&self, len: f32) -> f32 {
        -(self.index as f32) * len
    }

    /// Depth of the edge furthest ahead
    pub fn far_z(&self, len: f32) -> f32 {
        -((self.index + 1) as f32) * len
    }
}

/// Rolling world generation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldStream {
    pub segments: VecDeque<CorridorSegment>,
    pub stars: Vec<Vec3>,
    /// Depth of the next gate pair to generate
    pub next_gate_z: f32,
    pub next_pair_id: u32,
    /// Gate pairs since the last obstacle
    pub obstacle_counter: u32,
}

impl WorldStream {
    /// Fresh stream for a camera at `camera_z`
    pub fn new<R: Rng>(camera_z: f32, config: &SimConfig, rng: &mut R) -> Self {
        let s = &config.streaming;
        let first = (-(camera_z + s.trailing) / s.segment_length).floor() as i64;
        let mut world = Self {
            segments: VecDeque::from([CorridorSegment { index: first }]),
            stars: Vec::with_capacity(s.star_count),
            next_gate_z: config.gates.initial_z,
            next_pair_id: 0,
            obstacle_counter: 0,
        };
        for _ in 0..s.star_count {
            let z = camera_z - rng.random::<f32>() * s.star_spread;
            world.stars.push(random_star(z, s, rng));
        }
        world.update_corridor(camera_z, s);
        world
    }

    /// Extend tiles to the lookahead horizon and retire trailing ones
    pub fn update_corridor(&mut self, camera_z: f32, tuning: &StreamingTuning) {
        let len = tuning.segment_length;
        while let Some(last) = self.segments.back().copied() {
            if last.far_z(len) <= camera_z - tuning.lookahead {
                break;
            }
            self.segments.push_back(CorridorSegment {
                index: last.index + 1,
            });
        }
        while self.segments.len() > 1 {
            match self.segments.front() {
                Some(front) if front.far_z(len) > camera_z + tuning.trailing => {
                    self.segments.pop_front();
                }
                _ => break,
            }
        }
    }

    /// Tiles are contiguous and span `[camera_z - lookahead, camera_z + trailing]`
    pub fn covers(&self, camera_z: f32, tuning: &StreamingTuning) -> bool {
        let len = tuning.segment_length;
        let (Some(front), Some(back)) = (self.segments.front(), self.segments.back()) else {
            return false;
        };
        let contiguous = self
            .segments
            .iter()
            .zip(self.segments.iter().skip(1))
            .all(|(a, b)| b.index == a.index + 1);
        contiguous
            && front.near_z(len) >= camera_z + tuning.trailing
            && back.far_z(len) <= camera_z - tuning.lookahead
    }

    /// Relocate stars that fell behind the camera to a random spot ahead
    pub fn recycle_stars<R: Rng>(&mut self, camera_z: f32, tuning: &StreamingTuning, rng: &mut R) {
        for star in &mut self.stars {
            if star.z > camera_z + tuning.star_recycle_margin {
                let z = camera_z - tuning.star_recycle_margin - rng.random::<f32>() * tuning.star_spread;
                *star = random_star(z, tuning, rng);
            }
        }
    }

    /// Generate gate pairs (and every Nth obstacle) up to the generation horizon
    pub fn generate_gates<R: Rng>(
        &mut self,
        camera_z: f32,
        level: u32,
        config: &SimConfig,
        registry: &mut Registry,
        rng: &mut R,
    ) {
        let gates = &config.gates;
        while camera_z < self.next_gate_z + gates.generation_distance {
            let kind = select_gate_type(&gates.types, level, rng)
                .map(|t| t.kind)
                .unwrap_or(GateKind::Basic);
            let left_positive = rng.random::<bool>();
            let pair_id = self.next_pair_id;
            self.next_pair_id = self.next_pair_id.wrapping_add(1);
            registry
                .gates
                .extend(Gate::pair(pair_id, self.next_gate_z, kind, left_positive, rng));
            log::debug!("Gate pair {pair_id} at z={:.1}: {kind:?}", self.next_gate_z);

            self.next_gate_z -= gates.spacing;

            self.obstacle_counter += 1;
            let o = &config.obstacles;
            if o.every_nth_pair > 0 && self.obstacle_counter >= o.every_nth_pair {
                self.obstacle_counter = 0;
                let side = if rng.random::<bool>() { 1.0 } else { -1.0 };
                registry.obstacles.push(Obstacle {
                    pos: Vec2::new(side * o.lane_offset, self.next_gate_z + gates.spacing / 2.0),
                    half_extents: Vec2::new(o.width / 2.0, o.depth / 2.0),
                });
            }
        }
    }

    /// Bernoulli enemy spawn for one tick; returns whether an enemy appeared
    pub fn maybe_spawn_enemy<R: Rng>(
        &self,
        camera_z: f32,
        difficulty: &DifficultyState,
        config: &SimConfig,
        registry: &mut Registry,
        rng: &mut R,
        dt: f32,
    ) -> bool {
        let e = &config.enemies;
        let chance = (e.spawn_rate * difficulty.spawn_multiplier(&config.difficulty) * dt).min(1.0);
        if rng.random::<f32>() >= chance {
            return false;
        }
        let x = if e.spawn_half_width > 0.0 {
            rng.random_range(-e.spawn_half_width..e.spawn_half_width)
        } else {
            0.0
        };
        let health = difficulty.roll_enemy_health(&config.difficulty, rng);
        registry.enemies.push(Enemy {
            pos: Vec2::new(x, camera_z - e.spawn_distance),
            health,
            phase: rng.random::<f32>() * std::f32::consts::TAU,
        });
        true
    }
}

fn random_star<R: Rng>(z: f32, tuning: &StreamingTuning, rng: &mut R) -> Vec3 {
    let half = tuning.star_spread / 2.0;
    Vec3::new(
        (rng.random::<f32>() * 2.0 - 1.0) * half,
        (rng.random::<f32>() * 2.0 - 1.0) * half,
        z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CAMERA_START_Z;
    use crate::sim::gates::Polarity;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn small_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.streaming.star_count = 50;
        config
    }

    #[test]
    fn test_initial_corridor_covers_view() {
        let config = small_config();
        let mut rng = Pcg32::seed_from_u64(1);
        let world = WorldStream::new(CAMERA_START_Z, &config, &mut rng);
        assert!(world.covers(CAMERA_START_Z, &config.streaming));
        assert_eq!(world.stars.len(), 50);
    }

    #[test]
    fn test_trailing_tiles_retire() {
        let config = small_config();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut world = WorldStream::new(CAMERA_START_Z, &config, &mut rng);
        let first = world.segments[0].index;
        world.update_corridor(-500.0, &config.streaming);
        assert!(world.segments[0].index > first);
        assert!(world.covers(-500.0, &config.streaming));
        // bounded: lookahead + trailing worth of tiles plus the partial ends
        assert!(world.segments.len() <= 11);
    }

    #[test]
    fn test_stars_recycle_ahead() {
        let config = small_config();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut world = WorldStream::new(CAMERA_START_Z, &config, &mut rng);
        let camera = -3000.0;
        world.recycle_stars(camera, &config.streaming, &mut rng);
        assert_eq!(world.stars.len(), 50);
        assert!(world.stars.iter().all(|s| s.z < camera));
    }

    #[test]
    fn test_gate_generation_cadence() {
        let config = small_config();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut registry = Registry::default();
        let mut world = WorldStream::new(CAMERA_START_Z, &config, &mut rng);

        world.generate_gates(CAMERA_START_Z, 1, &config, &mut registry, &mut rng);
        assert!(registry.gates.is_empty());

        // camera at -1: pair at -30 is within 30
        world.generate_gates(-1.0, 1, &config, &mut registry, &mut rng);
        assert_eq!(registry.gates.len(), 2);
        assert_eq!(world.next_gate_z, -40.0);

        world.generate_gates(-11.0, 1, &config, &mut registry, &mut rng);
        assert_eq!(registry.gates.len(), 4);
        assert_eq!(registry.obstacles.len(), 1);
        let obstacle = &registry.obstacles[0];
        assert_eq!(obstacle.pos.y, -45.0);
        assert_eq!(obstacle.pos.x.abs(), config.obstacles.lane_offset);

        for pair in registry.gates.chunks(2) {
            assert_eq!(pair[0].pair_id, pair[1].pair_id);
            let positives = pair.iter().filter(|g| g.polarity == Polarity::Positive).count();
            assert_eq!(positives, 1);
        }
        assert_ne!(registry.gates[0].pair_id, registry.gates[2].pair_id);
    }

    #[test]
    fn test_enemy_spawn_certain_at_full_rate() {
        let mut config = small_config();
        config.enemies.spawn_rate = 1000.0;
        let mut rng = Pcg32::seed_from_u64(5);
        let mut registry = Registry::default();
        let world = WorldStream::new(0.0, &config, &mut rng);
        let difficulty = DifficultyState::default();
        for _ in 0..20 {
            assert!(world.maybe_spawn_enemy(0.0, &difficulty, &config, &mut registry, &mut rng, 1.0 / 60.0));
        }
        for enemy in &registry.enemies {
            assert_eq!(enemy.pos.y, -config.enemies.spawn_distance);
            assert!(enemy.pos.x.abs() <= config.enemies.spawn_half_width);
            assert_eq!(enemy.health, 1);
        }
    }

    #[test]
    fn test_enemy_spawn_never_at_zero_rate() {
        let mut config = small_config();
        config.enemies.spawn_rate = 0.0;
        let mut rng = Pcg32::seed_from_u64(6);
        let mut registry = Registry::default();
        let world = WorldStream::new(0.0, &config, &mut rng);
        let difficulty = DifficultyState::default();
        for _ in 0..500 {
            world.maybe_spawn_enemy(0.0, &difficulty, &config, &mut registry, &mut rng, 1.0 / 60.0);
        }
        assert!(registry.enemies.is_empty());
    }

    proptest! {
        #[test]
        fn prop_corridor_has_no_gaps(steps in prop::collection::vec(0.0f32..40.0, 1..100)) {
            let config = small_config();
            let mut rng = Pcg32::seed_from_u64(7);
            let mut camera = CAMERA_START_Z;
            let mut world = WorldStream::new(camera, &config, &mut rng);
            for step in steps {
                camera -= step;
                world.update_corridor(camera, &config.streaming);
                prop_assert!(world.covers(camera, &config.streaming));
            }
        }
    }
}
