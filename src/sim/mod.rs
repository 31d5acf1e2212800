//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by registry index, descending for removals)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod gates;
pub mod lifecycle;
pub mod registry;
pub mod state;
pub mod swarm;
pub mod tick;
pub mod world;

pub use difficulty::DifficultyState;
pub use gates::{Gate, GateKind, GateOutcome, Polarity, Side};
pub use lifecycle::{DeathPose, Lifecycle, LossCause, RunnerState};
pub use registry::{Coin, Enemy, Obstacle, Projectile, Registry, RunnerPool, VisitedGates};
pub use state::{GameEvent, GamePhase, GameState, Snapshot};
pub use tick::{TickInput, tick};
pub use world::{CorridorSegment, WorldStream};
