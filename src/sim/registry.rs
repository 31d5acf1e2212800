//! Entity registry
//!
//! Single owner of every live entity. Runners are stored as parallel columns
//! that must stay index-aligned; removal shifts (never swaps) so positional
//! keys recorded elsewhere can be remapped consistently.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::gates::Gate;
use super::lifecycle::Lifecycle;
use crate::consts::GROUND_Y;

/// Struct-of-arrays runner storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerPool {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    heights: Vec<f32>,
    lives: Vec<Lifecycle>,
}

fn retain_unlisted<T>(column: &mut Vec<T>, removed: &[usize]) {
    let mut index = 0;
    column.retain(|_| {
        let keep = removed.binary_search(&index).is_err();
        index += 1;
        keep
    });
}

/// Mutable view of all runner columns at once
pub struct RunnerColumnsMut<'a> {
    pub positions: &'a mut [Vec2],
    pub velocities: &'a mut [Vec2],
    pub heights: &'a mut [f32],
    pub lives: &'a mut [Lifecycle],
}

impl RunnerPool {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append a grounded, active runner; returns its index
    pub fn spawn(&mut self, pos: Vec2, variation: f32) -> usize {
        self.positions.push(pos);
        self.velocities.push(Vec2::ZERO);
        self.heights.push(GROUND_Y);
        self.lives.push(Lifecycle::new(variation));
        self.positions.len() - 1
    }

    /// Shift-remove runner `index` from every column
    pub fn remove(&mut self, index: usize) {
        self.positions.remove(index);
        self.velocities.remove(index);
        self.heights.remove(index);
        self.lives.remove(index);
    }

    /// Shift-remove every runner listed in `removed` (ascending) in one pass
    pub fn remove_many(&mut self, removed: &[usize]) {
        retain_unlisted(&mut self.positions, removed);
        retain_unlisted(&mut self.velocities, removed);
        retain_unlisted(&mut self.heights, removed);
        retain_unlisted(&mut self.lives, removed);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.velocities.clear();
        self.heights.clear();
        self.lives.clear();
    }

    /// All columns have the same length
    pub fn is_aligned(&self) -> bool {
        let n = self.positions.len();
        self.velocities.len() == n && self.heights.len() == n && self.lives.len() == n
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn lives(&self) -> &[Lifecycle] {
        &self.lives
    }

    pub fn life_mut(&mut self, index: usize) -> &mut Lifecycle {
        &mut self.lives[index]
    }

    pub fn columns_mut(&mut self) -> RunnerColumnsMut<'_> {
        RunnerColumnsMut {
            positions: &mut self.positions,
            velocities: &mut self.velocities,
            heights: &mut self.heights,
            lives: &mut self.lives,
        }
    }

    /// Runners that are neither dying nor removed
    pub fn alive_count(&self) -> usize {
        self.lives.iter().filter(|l| l.is_alive()).count()
    }
}

/// `(pair_id, runner_index)` keys of gates already triggered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitedGates {
    keys: HashSet<(u32, usize)>,
}

impl VisitedGates {
    /// Record a trigger; returns false if the key was already present
    pub fn insert(&mut self, pair_id: u32, index: usize) -> bool {
        self.keys.insert((pair_id, index))
    }

    pub fn contains(&self, pair_id: u32, index: usize) -> bool {
        self.keys.contains(&(pair_id, index))
    }

    /// Forget every key of a retired pair
    pub fn purge_pair(&mut self, pair_id: u32) {
        self.keys.retain(|&(pair, _)| pair != pair_id);
    }

    /// Keep keys in step with a shift-removal of runner `removed`
    pub fn on_runner_removed(&mut self, removed: usize) {
        self.on_runners_removed(&[removed]);
    }

    /// Keep keys in step with a shift-removal of every runner in `removed`
    /// (ascending). Keys of removed runners are dropped; the rest move down by
    /// the number of removed runners before them.
    pub fn on_runners_removed(&mut self, removed: &[usize]) {
        if removed.is_empty() {
            return;
        }
        self.keys = self
            .keys
            .drain()
            .filter_map(|(pair, index)| match removed.binary_search(&index) {
                Ok(_) => None,
                Err(shift) => Some((pair, index - shift)),
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// A zombie walking toward the camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    pub health: i32,
    /// Walk cycle phase (radians)
    pub phase: f32,
}

/// A bullet flying forward from a runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub height: f32,
    pub damage: u32,
    pub speed: f32,
    /// Distance covered since spawn
    pub traveled: f32,
}

/// Static box hazard on the road
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec2,
    /// Half width (x) and half depth (z)
    pub half_extents: Vec2,
}

/// Currency pickup dropped by a killed enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub pos: Vec2,
    pub collected: bool,
}

/// Every live entity of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    pub runners: RunnerPool,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub coins: Vec<Coin>,
    pub gates: Vec<Gate>,
    pub visited: VisitedGates,
}

impl Registry {
    /// Remove runner `index` and remap visited keys
    pub fn remove_runner(&mut self, index: usize) {
        self.runners.remove(index);
        self.visited.on_runner_removed(index);
    }

    /// Remove several runners (ascending indices) with a single remap
    pub fn remove_runners(&mut self, removed: &[usize]) {
        self.runners.remove_many(removed);
        self.visited.on_runners_removed(removed);
    }

    /// Drop everything (restart)
    pub fn clear(&mut self) {
        self.runners.clear();
        self.enemies.clear();
        self.projectiles.clear();
        self.obstacles.clear();
        self.coins.clear();
        self.gates.clear();
        self.visited.clear();
    }

    /// No entity of any kind remains
    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
            && self.enemies.is_empty()
            && self.projectiles.is_empty()
            && self.obstacles.is_empty()
            && self.coins.is_empty()
            && self.gates.is_empty()
            && self.visited.is_empty()
    }
}
