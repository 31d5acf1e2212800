//! Time-driven difficulty curve

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::DifficultyTuning;

/// Unpaused play time and the level derived from it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    /// Seconds of play, recomputed from the tick count each step
    pub elapsed: f64,
    pub level: u32,
}

impl Default for DifficultyState {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            level: 1,
        }
    }
}

/// `floor(elapsed / period) + 1`
pub fn level_for(elapsed: f64, tuning: &DifficultyTuning) -> u32 {
    (elapsed.max(0.0) / tuning.level_period as f64).floor() as u32 + 1
}

fn ramp(level: u32, step: f32, cap: f32) -> f32 {
    (1.0 + level.saturating_sub(1) as f32 * step).min(cap)
}

impl DifficultyState {
    /// Set cumulative play time; returns the new level if it rose
    pub fn advance_to(&mut self, elapsed: f64, tuning: &DifficultyTuning) -> Option<u32> {
        self.elapsed = elapsed;
        let level = level_for(elapsed, tuning);
        if level > self.level {
            self.level = level;
            Some(level)
        } else {
            None
        }
    }

    pub fn speed_multiplier(&self, tuning: &DifficultyTuning) -> f32 {
        ramp(self.level, tuning.speed_step, tuning.speed_cap)
    }

    pub fn control_multiplier(&self, tuning: &DifficultyTuning) -> f32 {
        ramp(self.level, tuning.control_step, tuning.control_cap)
    }

    pub fn spawn_multiplier(&self, tuning: &DifficultyTuning) -> f32 {
        ramp(self.level, tuning.spawn_step, tuning.spawn_cap)
    }

    /// Unrounded enemy health for the current level
    pub fn base_enemy_health(&self, tuning: &DifficultyTuning) -> f32 {
        (tuning.health_base + self.level.saturating_sub(1) as f32 * tuning.health_step)
            .min(tuning.health_cap)
    }

    /// Enemy health, rounded up with probability equal to the fractional part
    pub fn roll_enemy_health<R: Rng>(&self, tuning: &DifficultyTuning, rng: &mut R) -> i32 {
        let base = self.base_enemy_health(tuning);
        let floor = base.floor();
        let frac = base - floor;
        let health = if frac > 0.0 && rng.random::<f32>() < frac {
            floor + 1.0
        } else {
            floor
        };
        (health as i32).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_level_from_elapsed() {
        let t = DifficultyTuning::default();
        assert_eq!(level_for(0.0, &t), 1);
        assert_eq!(level_for(29.99, &t), 1);
        assert_eq!(level_for(30.0, &t), 2);
        assert_eq!(level_for(95.0, &t), 4);
    }

    #[test]
    fn test_multipliers_are_capped() {
        let t = DifficultyTuning::default();
        let state = DifficultyState {
            elapsed: 0.0,
            level: 1000,
        };
        assert_eq!(state.speed_multiplier(&t), t.speed_cap);
        assert_eq!(state.control_multiplier(&t), t.control_cap);
        assert_eq!(state.spawn_multiplier(&t), t.spawn_cap);
        assert_eq!(state.base_enemy_health(&t), t.health_cap);
    }

    #[test]
    fn test_level_one_is_baseline() {
        let t = DifficultyTuning::default();
        let state = DifficultyState::default();
        assert!((state.speed_multiplier(&t) - 1.0).abs() < 0.001);
        assert!((state.spawn_multiplier(&t) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_advance_reports_level_up_once() {
        let t = DifficultyTuning::default();
        let mut state = DifficultyState::default();
        assert_eq!(state.advance_to(29.0, &t), None);
        assert_eq!(state.advance_to(30.5, &t), Some(2));
        assert_eq!(state.advance_to(31.5, &t), None);
    }

    #[test]
    fn test_level_follows_tick_count_over_long_sessions() {
        let t = DifficultyTuning::default();
        let dt = crate::consts::SIM_DT as f64;
        let at = |ticks: u64| level_for(ticks as f64 * dt, &t);
        assert_eq!(at(1799), 1);
        assert_eq!(at(1800), 2);
        assert_eq!(at(5399), 3);
        assert_eq!(at(5400), 4);
        // one hour of play
        assert_eq!(at(216_000), 121);
    }

    #[test]
    fn test_health_rounding_is_between_neighbours() {
        let t = DifficultyTuning::default();
        // level 2: 1.5 health
        let state = DifficultyState {
            elapsed: 30.0,
            level: 2,
        };
        let mut rng = Pcg32::seed_from_u64(9);
        let mut ones = 0;
        let mut twos = 0;
        for _ in 0..2000 {
            match state.roll_enemy_health(&t, &mut rng) {
                1 => ones += 1,
                2 => twos += 1,
                other => panic!("unexpected health {other}"),
            }
        }
        assert!(ones > 800 && twos > 800);
    }

    #[test]
    fn test_integral_health_is_exact() {
        let t = DifficultyTuning::default();
        let state = DifficultyState {
            elapsed: 60.0,
            level: 3,
        };
        let mut rng = Pcg32::seed_from_u64(10);
        for _ in 0..100 {
            assert_eq!(state.roll_enemy_health(&t, &mut rng), 2);
        }
    }

    proptest! {
        #[test]
        fn prop_level_monotonic(steps in prop::collection::vec(0.0f64..5.0, 1..200)) {
            let t = DifficultyTuning::default();
            let mut state = DifficultyState::default();
            let mut last = state.level;
            let mut elapsed = 0.0;
            for dt in steps {
                elapsed += dt;
                state.advance_to(elapsed, &t);
                prop_assert!(state.level >= last);
                prop_assert!(state.speed_multiplier(&t) <= t.speed_cap);
                prop_assert!(state.spawn_multiplier(&t) <= t.spawn_cap);
                prop_assert!(state.control_multiplier(&t) <= t.control_cap);
                last = state.level;
            }
        }
    }
}
