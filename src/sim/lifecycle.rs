//! Runner lifecycle state machine
//!
//! `Active` runners may jump; leaving the road starts `Falling`; any lethal
//! interaction starts `Dying`. Falling and dying are terminal and end in
//! `Removed`, which the registry sweeps the same tick.
//!
//! Random visual variety (death pose, fall spin) is a pure function of a seed
//! drawn when the state is entered, so replays stay reproducible.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::GROUND_Y;
use crate::tuning::RunnerTuning;

/// Randomised parameters of a death animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathPose {
    /// Seconds until the runner is destroyed
    pub duration: f32,
    /// Final tip-over angle (radians)
    pub fall_angle: f32,
    /// How far the body sinks below ground level
    pub fall_distance: f32,
    /// Lightness of the red tint the body fades to
    pub tint_lightness: f32,
}

impl DeathPose {
    /// Derive a pose from a seed. Same seed, same pose.
    pub fn from_seed(seed: u64) -> Self {
        use std::f32::consts::PI;

        let mut rng = Pcg32::seed_from_u64(seed);
        Self {
            duration: 0.4 + rng.random::<f32>() * 0.2,
            fall_angle: (rng.random::<f32>() - 0.5) * PI * 0.3 + PI * 0.5,
            fall_distance: 0.2 + rng.random::<f32>() * 0.2,
            tint_lightness: 0.25 + rng.random::<f32>() * 0.35,
        }
    }
}

/// Initial tumble speed for a falling runner (rad/s), derived from a seed
pub fn fall_spin_from_seed(seed: u64) -> f32 {
    let mut rng = Pcg32::seed_from_u64(seed);
    (rng.random::<f32>() - 0.5) * 6.0
}

/// Lifecycle state of a runner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunnerState {
    Active,
    Jumping {
        elapsed: f32,
    },
    Falling {
        fall_speed: f32,
        tumble: f32,
        tumble_speed: f32,
    },
    Dying {
        elapsed: f32,
        pose: DeathPose,
    },
    Removed,
}

/// Why a runner was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossCause {
    Gate,
    Captured,
    Obstacle,
    Fell,
}

/// Per-runner lifecycle column: state, timers and cooldowns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub state: RunnerState,
    /// Seconds until the runner may fire again
    pub shoot_cooldown: f32,
    /// Seconds until the runner may jump again
    pub jump_cooldown: f32,
    /// Cosmetic variation in [0, 1)
    pub variation: f32,
}

impl Lifecycle {
    pub fn new(variation: f32) -> Self {
        Self {
            state: RunnerState::Active,
            shoot_cooldown: 0.0,
            jump_cooldown: 0.0,
            variation,
        }
    }

    /// Runner takes part in physics, shooting and interactions
    #[inline]
    pub fn is_eligible(&self) -> bool {
        matches!(self.state, RunnerState::Active | RunnerState::Jumping { .. })
    }

    /// Runner is still counted as part of the swarm
    #[inline]
    pub fn is_alive(&self) -> bool {
        !matches!(self.state, RunnerState::Dying { .. } | RunnerState::Removed)
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.state == RunnerState::Removed
    }

    pub fn can_shoot(&self) -> bool {
        self.is_eligible() && self.shoot_cooldown <= 0.0
    }

    pub fn can_jump(&self) -> bool {
        self.state == RunnerState::Active && self.jump_cooldown <= 0.0
    }

    /// Start a jump if allowed; returns whether it started
    pub fn start_jump(&mut self, tuning: &RunnerTuning) -> bool {
        if !self.can_jump() {
            return false;
        }
        self.state = RunnerState::Jumping { elapsed: 0.0 };
        self.jump_cooldown = tuning.jump_cooldown;
        true
    }

    /// Leave the road. Only grounded or jumping runners can start falling.
    pub fn start_falling(&mut self, seed: u64) -> bool {
        if !self.is_eligible() {
            return false;
        }
        self.state = RunnerState::Falling {
            fall_speed: 0.0,
            tumble: 0.0,
            tumble_speed: fall_spin_from_seed(seed),
        };
        true
    }

    /// Begin the death animation. Already falling or dying runners are left alone.
    pub fn start_dying(&mut self, seed: u64) -> bool {
        if !self.is_eligible() {
            return false;
        }
        self.state = RunnerState::Dying {
            elapsed: 0.0,
            pose: DeathPose::from_seed(seed),
        };
        true
    }

    /// Arm the shot timer after firing
    pub fn fired(&mut self, interval: f32) {
        self.shoot_cooldown = interval;
    }

    /// Advance timers by `dt` and update the runner height the state owns
    pub fn advance(&mut self, dt: f32, height: &mut f32, tuning: &RunnerTuning) {
        if self.shoot_cooldown > 0.0 {
            self.shoot_cooldown -= dt;
        }
        if self.jump_cooldown > 0.0 {
            self.jump_cooldown -= dt;
        }

        match &mut self.state {
            RunnerState::Active => *height = GROUND_Y,
            RunnerState::Jumping { elapsed } => {
                *elapsed += dt;
                if *elapsed >= tuning.jump_duration {
                    self.state = RunnerState::Active;
                    *height = GROUND_Y;
                } else {
                    *height = GROUND_Y + jump_arc(*elapsed / tuning.jump_duration, tuning.jump_height);
                }
            }
            RunnerState::Falling {
                fall_speed,
                tumble,
                tumble_speed,
            } => {
                *fall_speed += tuning.fall_gravity * dt;
                *height -= *fall_speed * dt;
                *tumble_speed += tuning.tumble_acceleration * dt * tumble_speed.signum();
                *tumble += *tumble_speed * dt;
                if *height < tuning.fall_cleanup_y {
                    self.state = RunnerState::Removed;
                }
            }
            RunnerState::Dying { elapsed, pose } => {
                *elapsed += dt;
                let progress = (*elapsed / pose.duration).min(1.0);
                *height = GROUND_Y - (progress * 1.5).min(1.0) * pose.fall_distance;
                if *elapsed >= pose.duration {
                    self.state = RunnerState::Removed;
                }
            }
            RunnerState::Removed => {}
        }
    }

    /// Death animation progress in [0, 1], for tinting
    pub fn death_progress(&self) -> Option<f32> {
        match self.state {
            RunnerState::Dying { elapsed, pose } => Some((elapsed / pose.duration).min(1.0)),
            _ => None,
        }
    }
}

/// Parabolic jump height at progress `p` in [0, 1]
#[inline]
pub fn jump_arc(p: f32, apex: f32) -> f32 {
    4.0 * apex * p * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn tuning() -> RunnerTuning {
        RunnerTuning::default()
    }

    #[test]
    fn test_death_pose_is_pure() {
        assert_eq!(DeathPose::from_seed(99), DeathPose::from_seed(99));
        let pose = DeathPose::from_seed(1234);
        assert!((0.4..0.6).contains(&pose.duration));
        assert!((0.2..0.4).contains(&pose.fall_distance));
    }

    #[test]
    fn test_jump_returns_to_active() {
        let t = tuning();
        let mut life = Lifecycle::new(0.5);
        let mut height = GROUND_Y;
        assert!(life.start_jump(&t));
        assert!(!life.start_jump(&t));

        let mut peak = GROUND_Y;
        let ticks = (t.jump_duration / SIM_DT).ceil() as usize + 1;
        for _ in 0..ticks {
            life.advance(SIM_DT, &mut height, &t);
            peak = peak.max(height);
        }
        assert_eq!(life.state, RunnerState::Active);
        assert_eq!(height, GROUND_Y);
        assert!((peak - (GROUND_Y + t.jump_height)).abs() < 0.01);
    }

    #[test]
    fn test_jump_cooldown_blocks_immediate_rejump() {
        let t = RunnerTuning {
            jump_duration: 0.1,
            jump_cooldown: 0.5,
            ..tuning()
        };
        let mut life = Lifecycle::new(0.0);
        let mut height = GROUND_Y;
        assert!(life.start_jump(&t));
        for _ in 0..12 {
            life.advance(SIM_DT, &mut height, &t);
        }
        assert_eq!(life.state, RunnerState::Active);
        assert!(!life.can_jump());
    }

    #[test]
    fn test_falling_is_terminal() {
        let t = tuning();
        let mut life = Lifecycle::new(0.0);
        let mut height = GROUND_Y;
        assert!(life.start_falling(7));
        assert!(!life.start_dying(8));
        assert!(!life.start_jump(&t));
        assert!(!life.can_shoot());

        for _ in 0..600 {
            life.advance(SIM_DT, &mut height, &t);
            if life.is_removed() {
                break;
            }
        }
        assert!(life.is_removed());
        assert!(height < t.fall_cleanup_y);
    }

    #[test]
    fn test_dying_ends_after_pose_duration() {
        let t = tuning();
        let mut life = Lifecycle::new(0.0);
        let mut height = GROUND_Y;
        assert!(life.start_dying(42));
        assert!(!life.is_alive());
        let duration = match life.state {
            RunnerState::Dying { pose, .. } => pose.duration,
            _ => unreachable!(),
        };

        let mut elapsed = 0.0;
        while !life.is_removed() {
            life.advance(SIM_DT, &mut height, &t);
            elapsed += SIM_DT;
            assert!(elapsed < 1.0);
        }
        assert!(elapsed >= duration - 1e-4);
        assert!(height < GROUND_Y);
    }

    #[test]
    fn test_jumping_runner_can_die() {
        let t = tuning();
        let mut life = Lifecycle::new(0.0);
        life.start_jump(&t);
        assert!(life.start_dying(1));
        assert!(life.death_progress().is_some());
    }
}
