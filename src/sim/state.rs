//! Game state and core simulation types
//!
//! Everything a run owns lives here. All randomness is drawn from the seeded
//! `rng`, so a run is a pure function of its seed, tuning and input stream.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyState;
use super::lifecycle::LossCause;
use super::registry::Registry;
use super::world::WorldStream;
use crate::consts::*;
use crate::economy::EconomyLedger;
use crate::tuning::SimConfig;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Suspended by the activity signal or the player
    Paused,
    /// The swarm is gone
    GameOver,
}

/// Something the outside world may want to hear about
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EnemyKilled { score: u64 },
    CoinCollected { balance: u64 },
    RunnerLost { cause: LossCause },
    RunnersGained { count: u32 },
    LevelUp { level: u32 },
    GameOver { score: u64 },
}

/// Serializable summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub level: u32,
    pub mob_count: usize,
    pub coins: u64,
    pub camera_z: f32,
    pub control: Vec2,
    pub time_ticks: u64,
    pub runners: Vec<Vec2>,
    pub enemies: usize,
    pub projectiles: usize,
    pub gates: usize,
    pub obstacles: usize,
    pub pickups: usize,
}

/// Complete state of a run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub config: SimConfig,
    pub phase: GamePhase,
    pub registry: Registry,
    pub world: WorldStream,
    pub difficulty: DifficultyState,
    /// Survives restarts
    pub economy: EconomyLedger,
    pub camera_z: f32,
    /// Point the swarm is attracted to (x lateral, y depth)
    pub control: Vec2,
    /// Lateral position the control point is steering toward
    pub target_x: f32,
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new run with the given seed
    ///
    /// The ledger's weapon stats are rebased onto `config.weapon`.
    pub fn new(seed: u64, config: SimConfig, mut economy: EconomyLedger) -> Self {
        economy.rebase(config.weapon.clone());
        let mut rng = Pcg32::seed_from_u64(seed);
        let world = WorldStream::new(CAMERA_START_Z, &config, &mut rng);
        let mut state = Self {
            seed,
            rng,
            config,
            phase: GamePhase::Running,
            registry: Registry::default(),
            world,
            difficulty: DifficultyState::default(),
            economy,
            camera_z: CAMERA_START_Z,
            control: Vec2::ZERO,
            target_x: 0.0,
            score: 0,
            time_ticks: 0,
            events: Vec::new(),
        };
        state.spawn_initial_swarm();
        log::info!("Run started (seed {seed})");
        state
    }

    /// Tear everything down and start a fresh run. The economy ledger is kept.
    pub fn restart(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.registry.clear();
        self.world = WorldStream::new(CAMERA_START_Z, &self.config, &mut self.rng);
        self.difficulty = DifficultyState::default();
        self.camera_z = CAMERA_START_Z;
        self.control = Vec2::ZERO;
        self.target_x = 0.0;
        self.score = 0;
        self.time_ticks = 0;
        self.events.clear();
        self.phase = GamePhase::Running;
        self.spawn_initial_swarm();
        log::info!("Run restarted (seed {seed})");
    }

    fn spawn_initial_swarm(&mut self) {
        let count = self.config.swarm.initial_runners;
        for i in 0..count {
            let pos = if i == 0 {
                Vec2::ZERO
            } else {
                Vec2::new(
                    (self.rng.random::<f32>() - 0.5) * self.config.swarm.spawn_spread,
                    self.rng.random::<f32>() * 3.0,
                )
            };
            let variation = self.rng.random::<f32>();
            self.registry.runners.spawn(pos, variation);
        }
    }

    /// Runners still counted as the swarm (not dying, not removed)
    pub fn mob_count(&self) -> usize {
        self.registry.runners.alive_count()
    }

    pub fn level(&self) -> u32 {
        self.difficulty.level
    }

    /// Record an event for the driver to collect
    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start the death animation for runner `index`
    pub(crate) fn kill_runner(&mut self, index: usize, cause: LossCause) {
        let seed = self.rng.random::<u64>();
        if self.registry.runners.life_mut(index).start_dying(seed) {
            log::trace!("Runner {index} dying ({cause:?})");
            self.emit(GameEvent::RunnerLost { cause });
        }
    }

    /// Insert a runner near `origin`, pre-marked as having visited `pair_id`
    pub(crate) fn spawn_clone(&mut self, origin: Vec2, pair_id: u32) {
        let spread = self.config.swarm.spawn_spread;
        let offset = Vec2::new(
            (self.rng.random::<f32>() - 0.5) * spread,
            (self.rng.random::<f32>() - 0.5) * spread,
        );
        let variation = self.rng.random::<f32>();
        let index = self.registry.runners.spawn(origin + offset, variation);
        self.registry.visited.insert(pair_id, index);
    }

    /// Remove every runner whose lifecycle has finished; ends the run if none remain
    pub(crate) fn sweep_removed(&mut self) {
        let removed: Vec<usize> = self
            .registry
            .runners
            .lives()
            .iter()
            .enumerate()
            .filter(|(_, life)| life.is_removed())
            .map(|(i, _)| i)
            .collect();
        self.registry.remove_runners(&removed);
        if self.registry.runners.is_empty() && self.phase != GamePhase::GameOver {
            self.phase = GamePhase::GameOver;
            log::info!("Game over: score {}, level {}", self.score, self.difficulty.level);
            self.emit(GameEvent::GameOver { score: self.score });
        }
    }

    /// Pause a running game
    pub fn pause(&mut self) {
        if self.phase == GamePhase::Running {
            self.phase = GamePhase::Paused;
            log::info!("Paused");
        }
    }

    /// Resume a paused game
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Running;
            log::info!("Resumed");
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            score: self.score,
            level: self.difficulty.level,
            mob_count: self.mob_count(),
            coins: self.economy.coins(),
            camera_z: self.camera_z,
            control: self.control,
            time_ticks: self.time_ticks,
            runners: self.registry.runners.positions().to_vec(),
            enemies: self.registry.enemies.len(),
            projectiles: self.registry.projectiles.len(),
            gates: self.registry.gates.len(),
            obstacles: self.registry.obstacles.len(),
            pickups: self.registry.coins.len(),
        }
    }
}
