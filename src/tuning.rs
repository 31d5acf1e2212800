//! Data-driven game balance
//!
//! Every number the simulation is tuned by lives here. Values are expressed
//! per second (or per second squared) against the 60 Hz reference tick, so a
//! simulation stepped at `SIM_DT` reproduces the reference feel exactly.
//!
//! Load from JSON with [`SimConfig::load`]; missing fields fall back to the
//! defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::gates::GateKind;

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Road geometry and camera travel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorTuning {
    /// Forward camera speed at level 1 (units/s)
    pub camera_speed: f32,
    /// Control point lateral speed at level 1 (units/s)
    pub control_speed: f32,
    /// Control point is clamped to +/- this
    pub control_bounds: f32,
    /// Runners beyond +/- this start falling
    pub fall_bounds: f32,
}

impl Default for CorridorTuning {
    fn default() -> Self {
        Self {
            camera_speed: 7.2,
            control_speed: 10.8,
            control_bounds: 2.5,
            fall_bounds: 3.2,
        }
    }
}

/// Swarm attraction/repulsion model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmTuning {
    pub attraction_strength: f32,
    /// Dead zone around the control point
    pub attraction_min_distance: f32,
    pub hard_repulsion_strength: f32,
    pub hard_repulsion_distance: f32,
    /// Pairs closer than this are treated as coincident by the hard term
    pub hard_repulsion_floor: f32,
    pub soft_repulsion_strength: f32,
    pub comfort_distance: f32,
    /// Velocity multiplier applied once per reference tick
    pub damping_per_tick: f32,
    pub max_speed: f32,
    /// Post-integration minimum separation
    pub min_separation: f32,
    /// Pairs closer than this are skipped by the correction pass
    pub separation_floor: f32,
    /// Lateral/depth spread of runners spawned by a gate
    pub spawn_spread: f32,
    /// Swarm size at the start of a run
    pub initial_runners: usize,
}

impl Default for SwarmTuning {
    fn default() -> Self {
        Self {
            attraction_strength: 79.2,
            attraction_min_distance: 0.3,
            hard_repulsion_strength: 252.0,
            hard_repulsion_distance: 0.5,
            hard_repulsion_floor: 0.1,
            soft_repulsion_strength: 64.8,
            comfort_distance: 0.8,
            damping_per_tick: 0.85,
            max_speed: 6.0,
            min_separation: 0.25,
            separation_floor: 0.01,
            spawn_spread: 1.5,
            initial_runners: 1,
        }
    }
}

/// Runner lifecycle timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTuning {
    pub jump_duration: f32,
    pub jump_height: f32,
    pub jump_cooldown: f32,
    /// Falling acceleration (units/s^2)
    pub fall_gravity: f32,
    /// Tumble angular acceleration (rad/s^2)
    pub tumble_acceleration: f32,
    /// Fallen runners are destroyed below this height
    pub fall_cleanup_y: f32,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            jump_duration: 0.75,
            jump_height: 0.8,
            jump_cooldown: 0.25,
            fall_gravity: 36.0,
            tumble_acceleration: 72.0,
            fall_cleanup_y: -10.0,
        }
    }
}

/// One row of the gate type table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateTypeConfig {
    pub name: String,
    pub weight: u32,
    #[serde(default = "default_min_level")]
    pub min_level: u32,
    #[serde(default)]
    pub max_level: Option<u32>,
    pub kind: GateKind,
}

fn default_min_level() -> u32 {
    1
}

impl GateTypeConfig {
    /// Whether this type can appear at `level`
    pub fn unlocked_at(&self, level: u32) -> bool {
        level >= self.min_level && self.max_level.is_none_or(|max| level <= max)
    }
}

/// Gate pair cadence and effect table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateTuning {
    pub spacing: f32,
    pub initial_z: f32,
    /// A pair is generated while the camera is within this of the next slot
    pub generation_distance: f32,
    pub cleanup_distance: f32,
    /// Half-width of each lane band (left spans [-w, 0], right spans [0, w])
    pub lane_width: f32,
    /// Depth tolerance for a runner to count as passing through
    pub depth_tolerance: f32,
    /// Chance a basic positive gate duplicates a runner
    pub duplication_chance: f32,
    pub types: Vec<GateTypeConfig>,
}

impl Default for GateTuning {
    fn default() -> Self {
        let row = |name: &str, weight, min_level, kind| GateTypeConfig {
            name: name.to_string(),
            weight,
            min_level,
            max_level: None,
            kind,
        };
        Self {
            spacing: 10.0,
            initial_z: -30.0,
            generation_distance: 30.0,
            cleanup_distance: 20.0,
            lane_width: 3.0,
            depth_tolerance: 1.0,
            duplication_chance: 0.3,
            types: vec![
                row("basic", 70, 1, GateKind::Basic),
                row("multiplier_2", 20, 2, GateKind::Multiplier { factor: 2 }),
                row("multiplier_3", 8, 5, GateKind::Multiplier { factor: 3 }),
                row(
                    "risky_3",
                    15,
                    3,
                    GateKind::Risky {
                        reward: 3,
                        risk: 0.3,
                    },
                ),
                row(
                    "risky_4",
                    5,
                    7,
                    GateKind::Risky {
                        reward: 4,
                        risk: 0.4,
                    },
                ),
            ],
        }
    }
}

/// Static hazards placed between gate pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    pub width: f32,
    pub depth: f32,
    /// Runner must be strictly higher than ground + this to clear
    pub clearance: f32,
    /// One obstacle per this many gate pairs
    pub every_nth_pair: u32,
    /// Lateral offset of the road half the obstacle sits in
    pub lane_offset: f32,
    pub cleanup_distance: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            width: 2.4,
            depth: 0.4,
            clearance: 0.4,
            every_nth_pair: 2,
            lane_offset: 1.5,
            cleanup_distance: 20.0,
        }
    }
}

/// Zombie walkers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Walk speed toward the camera (units/s)
    pub speed: f32,
    pub spawn_distance: f32,
    /// Spawn x is uniform in [-spawn_half_width, spawn_half_width)
    pub spawn_half_width: f32,
    /// Expected spawns per second at level 1
    pub spawn_rate: f32,
    pub capture_radius: f32,
    pub cleanup_distance: f32,
    /// Walk cycle speed (radians/s) for presentation
    pub animation_rate: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            speed: 4.8,
            spawn_distance: 50.0,
            spawn_half_width: 2.0,
            spawn_rate: 1.2,
            capture_radius: 0.5,
            cleanup_distance: 15.0,
            animation_rate: 6.0,
        }
    }
}

/// Base weapon stats and upgrade curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub base_damage: u32,
    /// Projectile speed (units/s)
    pub base_speed: f32,
    /// Seconds between shots
    pub base_interval: f32,
    pub min_interval: f32,
    pub interval_step: f32,
    pub speed_step: f32,
    pub range: f32,
    pub damage_radius: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            base_damage: 1,
            base_speed: 18.0,
            base_interval: 0.5,
            min_interval: 1.0 / 12.0,
            interval_step: 0.05,
            speed_step: 1.1,
            range: 50.0,
            damage_radius: 0.5,
        }
    }
}

/// Coin pickups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    pub drop_chance: f32,
    pub collection_radius: f32,
    pub cleanup_distance: f32,
    pub value: u64,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            drop_chance: 0.3,
            collection_radius: 0.5,
            cleanup_distance: 15.0,
            value: 1,
        }
    }
}

/// Time-driven difficulty curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Seconds of play per level
    pub level_period: f32,
    pub speed_step: f32,
    pub speed_cap: f32,
    pub control_step: f32,
    pub control_cap: f32,
    pub spawn_step: f32,
    pub spawn_cap: f32,
    pub health_base: f32,
    pub health_step: f32,
    pub health_cap: f32,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            level_period: 30.0,
            speed_step: 0.1,
            speed_cap: 2.0,
            control_step: 0.05,
            control_cap: 1.5,
            spawn_step: 0.25,
            spawn_cap: 4.0,
            health_base: 1.0,
            health_step: 0.5,
            health_cap: 10.0,
        }
    }
}

/// Corridor tiles and background field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingTuning {
    pub segment_length: f32,
    pub lookahead: f32,
    pub trailing: f32,
    pub star_count: usize,
    pub star_spread: f32,
    /// Stars this far behind the camera are recycled ahead
    pub star_recycle_margin: f32,
}

impl Default for StreamingTuning {
    fn default() -> Self {
        Self {
            segment_length: 20.0,
            lookahead: 160.0,
            trailing: 40.0,
            star_count: 1000,
            star_spread: 2000.0,
            star_recycle_margin: 50.0,
        }
    }
}

/// Complete simulation tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub corridor: CorridorTuning,
    pub swarm: SwarmTuning,
    pub runner: RunnerTuning,
    pub gates: GateTuning,
    pub obstacles: ObstacleTuning,
    pub enemies: EnemyTuning,
    pub weapon: WeaponTuning,
    pub pickups: PickupTuning,
    pub difficulty: DifficultyTuning,
    pub streaming: StreamingTuning,
}

impl SimConfig {
    /// Parse and validate a JSON tuning document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject tunings the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.gates.types.is_empty() {
            return invalid("gate type table is empty");
        }
        if self.gates.types.iter().all(|t| t.weight == 0) {
            return invalid("gate type weights are all zero");
        }
        for gate_type in &self.gates.types {
            if let Err(msg) = gate_type.kind.validate() {
                return Err(ConfigError::Invalid(format!("{}: {msg}", gate_type.name)));
            }
        }
        if self.gates.spacing <= 0.0 {
            return invalid("gate spacing must be positive");
        }
        if self.difficulty.level_period <= 0.0 {
            return invalid("level period must be positive");
        }
        if self.streaming.segment_length <= 0.0 {
            return invalid("segment length must be positive");
        }
        if self.swarm.comfort_distance <= self.swarm.hard_repulsion_distance {
            return invalid("comfort distance must exceed hard repulsion distance");
        }
        let probabilities = [
            self.gates.duplication_chance,
            self.pickups.drop_chance,
        ];
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return invalid("probabilities must lie in [0, 1]");
        }
        if self.swarm.initial_runners == 0 {
            return invalid("a run needs at least one runner");
        }
        if self.weapon.min_interval <= 0.0 {
            return invalid("minimum fire interval must be positive");
        }
        Ok(())
    }
}
