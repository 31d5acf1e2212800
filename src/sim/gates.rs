//! Gate families and effect resolution
//!
//! A gate family is data: [`GateKind`] carries the strength of the effect and
//! [`resolve_outcome`] turns a triggered gate into the one concrete thing that
//! happens to the swarm.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::GateTypeConfig;

/// Effect family of a gate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// Positive side duplicates with the configured chance
    Basic,
    /// Positive side turns one runner into `factor` runners
    Multiplier { factor: u32 },
    /// Positive side loses a runner with probability `risk`, else multiplies by `reward`
    Risky { reward: u32, risk: f32 },
}

impl GateKind {
    /// Reject parameters the effect resolution cannot honour
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            GateKind::Basic => Ok(()),
            GateKind::Multiplier { factor } if factor < 1 => {
                Err("multiplier factor must be at least 1".to_string())
            }
            GateKind::Risky { reward, .. } if reward < 1 => {
                Err("risky reward must be at least 1".to_string())
            }
            GateKind::Risky { risk, .. } if !(0.0..=1.0).contains(&risk) => {
                Err("risk probability must lie in [0, 1]".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Which lane of the corridor a gate covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Beneficial or harmful gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn opposite(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// One half of a gate pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    /// Shared by both gates spawned at the same depth
    pub pair_id: u32,
    pub side: Side,
    pub polarity: Polarity,
    pub kind: GateKind,
    /// Depth of the gate plane
    pub z: f32,
    /// Risky roll, drawn when the pair is built and shared by every runner
    #[serde(default)]
    pub doomed: bool,
}

impl Gate {
    /// Build both halves of a pair; exactly one side is positive
    ///
    /// A risky pair rolls its outcome here, once.
    pub fn pair<R: Rng>(pair_id: u32, z: f32, kind: GateKind, left_positive: bool, rng: &mut R) -> [Gate; 2] {
        let left = if left_positive {
            Polarity::Positive
        } else {
            Polarity::Negative
        };
        let doomed = match kind {
            GateKind::Risky { risk, .. } => rng.random::<f32>() < risk,
            _ => false,
        };
        [
            Gate {
                pair_id,
                side: Side::Left,
                polarity: left,
                kind,
                z,
                doomed,
            },
            Gate {
                pair_id,
                side: Side::Right,
                polarity: left.opposite(),
                kind,
                z,
                doomed,
            },
        ]
    }
}

/// Concrete effect applied to the triggering runner
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateOutcome {
    /// Insert one runner near the trigger with this probability
    Add { probability: f32 },
    /// Kill the triggering runner
    Remove,
    /// Insert `factor - 1` runners unconditionally
    Multiply { factor: u32 },
}

/// Resolve what a triggered gate does
pub fn resolve_outcome(gate: &Gate, duplication_chance: f32) -> GateOutcome {
    if gate.polarity == Polarity::Negative {
        return GateOutcome::Remove;
    }
    match gate.kind {
        GateKind::Basic => GateOutcome::Add {
            probability: duplication_chance,
        },
        GateKind::Multiplier { factor } => GateOutcome::Multiply { factor },
        GateKind::Risky { reward, .. } => {
            if gate.doomed {
                GateOutcome::Remove
            } else {
                GateOutcome::Multiply { factor: reward }
            }
        }
    }
}

/// Weighted pick among the gate types unlocked at `level`
///
/// Returns `None` only if nothing in the table is unlocked or every unlocked
/// weight is zero.
pub fn select_gate_type<'a, R: Rng>(
    types: &'a [GateTypeConfig],
    level: u32,
    rng: &mut R,
) -> Option<&'a GateTypeConfig> {
    let total: u32 = types
        .iter()
        .filter(|t| t.unlocked_at(level))
        .map(|t| t.weight)
        .sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.random_range(0..total);
    for gate_type in types.iter().filter(|t| t.unlocked_at(level)) {
        if roll < gate_type.weight {
            return Some(gate_type);
        }
        roll -= gate_type.weight;
    }
    None
}
