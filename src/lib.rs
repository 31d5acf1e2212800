//! Stick Runner - a swarm runner simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (swarm physics, interactions, streaming)
//! - `economy`: Weapon upgrade ledger and currency
//! - `game_loop`: Fixed timestep driver with pause/resume
//! - `platform`: Activity signal and pointer input
//! - `persistence`: Key-value storage collaborators
//! - `leaderboard`: Outbound score channel and local leaderboard
//! - `tuning`: Data-driven game balance

pub mod economy;
pub mod game_loop;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use economy::{EconomyLedger, PurchaseError, UpgradeKind, WeaponStats};
pub use game_loop::{FrameOutcome, GameLoop};
pub use settings::Settings;
pub use tuning::SimConfig;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the rate the tuning data is expressed against)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Height of a runner standing on the road
    pub const GROUND_Y: f32 = -1.2;
    /// Projectiles leave a runner at chest height
    pub const CHEST_HEIGHT: f32 = 0.3;

    /// Camera start depth (runners start at z = 0)
    pub const CAMERA_START_Z: f32 = 8.0;
}

/// Planar distance between two ground positions
#[inline]
pub fn ground_distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Move `current` toward `target` by at most `max_step`
#[inline]
pub fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = target - current;
    current + delta.clamp(-max_step, max_step)
}
