//! Stick Runner headless entry point
//!
//! Plays one run with a simple autopilot, then prints the final snapshot.
//! Coins, upgrades, settings and the local leaderboard persist in a JSON store.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use stick_runner::consts::*;
use stick_runner::leaderboard::{LocalLeaderboard, OutboundQueue, ScoreSink};
use stick_runner::persistence::{JsonFileStore, load_json, save_json};
use stick_runner::platform::{ActivityMonitor, InputState, StatusFileSource};
use stick_runner::sim::{GameEvent, GameState, Polarity, Side};
use stick_runner::{EconomyLedger, FrameOutcome, GameLoop, Settings, SimConfig, UpgradeKind};

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Upgrade {
    Damage,
    Velocity,
    FireRate,
}

impl From<Upgrade> for UpgradeKind {
    fn from(upgrade: Upgrade) -> Self {
        match upgrade {
            Upgrade::Damage => UpgradeKind::Damage,
            Upgrade::Velocity => UpgradeKind::Velocity,
            Upgrade::FireRate => UpgradeKind::FireRate,
        }
    }
}

/// Swarm runner simulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run seed (defaults to the clock)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Tuning file (JSON, missing fields use defaults)
    #[arg(short, long)]
    tuning: Option<PathBuf>,

    /// Status file polled for activity (`{"state": "idle"}`)
    #[arg(long)]
    status_file: Option<PathBuf>,

    /// Save file for coins, upgrades and settings
    #[arg(long, default_value = "stick-runner-save.json")]
    store: PathBuf,

    /// Simulated seconds to play
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,

    /// Buy upgrades before the run
    #[arg(long, value_enum)]
    buy: Vec<Upgrade>,

    /// Start even if the status says idle
    #[arg(long)]
    force_start: bool,
}

/// Logs outbound leaderboard messages as they are produced
#[derive(Default)]
struct LoggedFeed {
    queue: OutboundQueue,
}

impl ScoreSink for LoggedFeed {
    fn report_score(&mut self, score: u64) {
        self.queue.report_score(score);
        for line in self.queue.drain() {
            log::debug!("-> {line}");
        }
    }
}

/// Steer toward the positive gate of the nearest pair ahead and jump obstacles
fn autopilot(state: &GameState, input: &mut InputState) {
    let front = state.control.y;
    let lane = state.config.gates.lane_width * 0.5;

    let target = state
        .registry
        .gates
        .iter()
        .filter(|g| g.polarity == Polarity::Positive && g.z < front)
        .max_by(|a, b| a.z.total_cmp(&b.z))
        .map(|g| match g.side {
            Side::Left => -lane,
            Side::Right => lane,
        })
        .unwrap_or(0.0);
    // replay the lateral correction as a short drag
    let px = (target - input.drag.target_x()) / input.drag.sensitivity();
    input.drag.press(0.0);
    input.drag.motion(px);
    input.drag.release();

    let obstacle_ahead = state
        .registry
        .obstacles
        .iter()
        .any(|o| o.pos.y < front && front - o.pos.y < 1.5 && (o.pos.x - state.control.x).abs() < o.half_extents.x + 0.5);
    input.jump_key(obstacle_ahead);
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.tuning {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid tuning {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };

    let mut store = match JsonFileStore::open(&args.store) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Cannot open store {}: {e}", args.store.display());
            return ExitCode::FAILURE;
        }
    };

    let settings = Settings::load(&store);
    let mut economy = EconomyLedger::load(&store, config.weapon.clone());
    for upgrade in &args.buy {
        match economy.purchase((*upgrade).into()) {
            Ok(receipt) => println!("Bought {:?} level {} for {}", upgrade, receipt.level, receipt.cost),
            Err(e) => println!("Cannot buy {upgrade:?}: {e}"),
        }
    }

    let seed = args.seed.unwrap_or_else(clock_seed);
    log::info!("Stick Runner starting (seed {seed})");

    let monitor = match (&args.status_file, settings.pause_when_idle) {
        (Some(path), true) => {
            ActivityMonitor::new(Box::new(StatusFileSource::new(path)), settings.status_poll_interval())
        }
        _ => ActivityMonitor::disabled(),
    };
    let input = InputState::new(settings.pointer_sensitivity, config.corridor.control_bounds);
    let mut feed = LoggedFeed::default();
    if let Some(name) = settings.display_name() {
        feed.queue.register(name);
    }

    let state = GameState::new(seed, config, economy);
    let mut game = GameLoop::new(state, input, monitor, Box::new(feed));
    if args.force_start {
        game.force_start();
    }

    let frames = (args.seconds.max(0.0) / SIM_DT).ceil() as u32;
    let outcome = game.run_for(frames, SIM_DT, settings.paused_poll_delay(), autopilot);

    let events = game.drain_events();
    let kills = events
        .iter()
        .filter(|e| matches!(e, GameEvent::EnemyKilled { .. }))
        .count();
    let lost = events
        .iter()
        .filter(|e| matches!(e, GameEvent::RunnerLost { .. }))
        .count();
    log::info!("Run ended ({outcome:?}): {kills} kills, {lost} runners lost");

    let snapshot = game.state.snapshot();
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("Cannot encode snapshot: {e}"),
    }
    if outcome == FrameOutcome::GameOver {
        println!("Game over at level {} with score {}", snapshot.level, snapshot.score);
    }

    let mut board = match load_json::<LocalLeaderboard>(&store, LocalLeaderboard::STORAGE_KEY) {
        Ok(board) => board.unwrap_or_default(),
        Err(e) => {
            log::warn!("Ignoring saved leaderboard: {e}");
            LocalLeaderboard::new()
        }
    };
    let name = settings.display_name().unwrap_or("anonymous").to_string();
    if let Some(rank) = board.add_score(&name, snapshot.score) {
        println!("New best for {name}: rank {rank}");
    }

    let saved = game
        .state
        .economy
        .save(&mut store)
        .and_then(|_| settings.save(&mut store))
        .and_then(|_| save_json(&mut store, LocalLeaderboard::STORAGE_KEY, &board));
    if let Err(e) = saved {
        eprintln!("Cannot save to {}: {e}", args.store.display());
        return ExitCode::FAILURE;
    }
    log::info!("Saved to {}", store.path().display());

    ExitCode::SUCCESS
}
