//! Fixed timestep driver
//!
//! Feeds variable frame deltas into an accumulator and runs whole
//! simulation ticks, at most `MAX_SUBSTEPS` per frame. The activity monitor
//! can suspend the run; one-shot inputs are consumed by the first tick.

use std::thread;
use std::time::{Duration, Instant};

use crate::consts::*;
use crate::leaderboard::ScoreSink;
use crate::platform::{ActivityMonitor, InputState};
use crate::sim::{GameEvent, GamePhase, GameState, tick};

/// What a frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Number of ticks run (may be zero while the accumulator fills)
    Advanced(u32),
    Paused,
    GameOver,
}

pub struct GameLoop {
    pub state: GameState,
    pub input: InputState,
    monitor: ActivityMonitor,
    sink: Box<dyn ScoreSink>,
    accumulator: f32,
    /// Paused by the activity monitor rather than the player
    suspended: bool,
    events: Vec<GameEvent>,
}

impl GameLoop {
    pub fn new(state: GameState, input: InputState, monitor: ActivityMonitor, sink: Box<dyn ScoreSink>) -> Self {
        Self {
            state,
            input,
            monitor,
            sink,
            accumulator: 0.0,
            suspended: false,
            events: Vec::new(),
        }
    }

    pub fn monitor(&self) -> &ActivityMonitor {
        &self.monitor
    }

    /// Player override for the activity pause
    pub fn force_start(&mut self) {
        self.monitor.force_start();
    }

    /// Events collected since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start a new run; the economy carries over
    pub fn restart(&mut self, seed: u64) {
        self.state.restart(seed);
        self.input.drag.reset();
        // discard one-shots queued against the old run
        let _ = self.input.take_tick_input();
        self.accumulator = 0.0;
        self.suspended = false;
        self.events.clear();
    }

    /// Advance by a wall-clock frame delta
    pub fn frame(&mut self, dt: f32, now: Instant) -> FrameOutcome {
        self.monitor.update(now);
        if self.monitor.should_pause() {
            if self.state.phase == GamePhase::Running {
                self.state.pause();
                self.suspended = true;
                log::info!("Suspended while idle");
            }
            self.accumulator = 0.0;
            return self.outcome(0);
        }
        if self.suspended {
            self.suspended = false;
            self.state.resume();
        }

        if self.state.phase == GamePhase::GameOver {
            return FrameOutcome::GameOver;
        }

        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.take_tick_input();
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.forward_events();
        }
        // drop backlog beyond the substep cap
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        self.outcome(substeps)
    }

    fn forward_events(&mut self) {
        for event in self.state.drain_events() {
            if let GameEvent::EnemyKilled { score } = event {
                self.sink.report_score(score);
            }
            self.events.push(event);
        }
    }

    fn outcome(&self, substeps: u32) -> FrameOutcome {
        match self.state.phase {
            GamePhase::Running => FrameOutcome::Advanced(substeps),
            GamePhase::Paused => FrameOutcome::Paused,
            GamePhase::GameOver => FrameOutcome::GameOver,
        }
    }

    /// Run up to `frames` frames of `frame_dt`, sleeping `paused_delay` per
    /// frame while paused. `steer` feeds input before each frame. Stops early
    /// on game over.
    pub fn run_for<F>(&mut self, frames: u32, frame_dt: f32, paused_delay: Duration, mut steer: F) -> FrameOutcome
    where
        F: FnMut(&GameState, &mut InputState),
    {
        let mut outcome = FrameOutcome::Advanced(0);
        for _ in 0..frames {
            steer(&self.state, &mut self.input);
            outcome = self.frame(frame_dt, Instant::now());
            match outcome {
                FrameOutcome::GameOver => break,
                FrameOutcome::Paused => thread::sleep(paused_delay),
                FrameOutcome::Advanced(_) => {}
            }
        }
        outcome
    }
}
