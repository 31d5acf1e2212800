//! Activity signal
//!
//! An external status is polled periodically. The run pauses while the status
//! is `idle` or `waiting-permission`, unless the player forced it to start.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reported state of the watched process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityStatus {
    Working,
    ToolExecuting,
    Idle,
    WaitingPermission,
}

impl ActivityStatus {
    /// Status values that suspend the run
    pub fn pauses(&self) -> bool {
        matches!(self, ActivityStatus::Idle | ActivityStatus::WaitingPermission)
    }

    /// Status values that clear a forced start
    pub fn is_busy(&self) -> bool {
        matches!(self, ActivityStatus::Working | ActivityStatus::ToolExecuting)
    }
}

/// Status document as served by the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub state: ActivityStatus,
    #[serde(default)]
    pub last_update: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Why a poll produced no status
#[derive(Debug, Error)]
pub enum PollError {
    #[error("status unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed status: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("status source exhausted")]
    Unavailable,
}

/// Something that can be asked for the current status
pub trait ActivitySource {
    fn poll(&mut self) -> Result<ActivityStatus, PollError>;
}

/// Reads a JSON status document (`{"state": "..."}`) from a file
#[derive(Debug, Clone)]
pub struct StatusFileSource {
    path: PathBuf,
}

impl StatusFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ActivitySource for StatusFileSource {
    fn poll(&mut self) -> Result<ActivityStatus, PollError> {
        let text = std::fs::read_to_string(&self.path)?;
        let payload: StatusPayload = serde_json::from_str(&text)?;
        Ok(payload.state)
    }
}

/// Replays a scripted sequence of poll results; the last entry repeats
#[derive(Debug, Default)]
pub struct FixedSource {
    /// Stored reversed so the next result is at the end
    script: Vec<Option<ActivityStatus>>,
}

impl FixedSource {
    /// Always reports `status`
    pub fn constant(status: ActivityStatus) -> Self {
        Self::scripted(vec![Some(status)])
    }

    /// `None` entries simulate a failed poll
    pub fn scripted(script: Vec<Option<ActivityStatus>>) -> Self {
        let mut script = script;
        script.reverse();
        Self { script }
    }
}

impl ActivitySource for FixedSource {
    fn poll(&mut self) -> Result<ActivityStatus, PollError> {
        let next = if self.script.len() > 1 {
            self.script.pop().flatten()
        } else {
            self.script.last().copied().flatten()
        };
        next.ok_or(PollError::Unavailable)
    }
}

/// Rate-limited view of an [`ActivitySource`]
pub struct ActivityMonitor {
    source: Box<dyn ActivitySource>,
    interval: Duration,
    last_poll: Option<Instant>,
    status: Option<ActivityStatus>,
    forced: bool,
    enabled: bool,
}

impl ActivityMonitor {
    pub fn new(source: Box<dyn ActivitySource>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            last_poll: None,
            status: None,
            forced: false,
            enabled: true,
        }
    }

    /// Monitor that never pauses (no status source)
    pub fn disabled() -> Self {
        let mut monitor = Self::new(Box::new(FixedSource::constant(ActivityStatus::Working)), Duration::MAX);
        monitor.enabled = false;
        monitor
    }

    /// Last known status, if any poll has succeeded
    pub fn status(&self) -> Option<ActivityStatus> {
        self.status
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Player override: keep running even while idle
    pub fn force_start(&mut self) {
        self.forced = true;
        log::info!("Run forced to start");
    }

    /// Poll the source if the interval elapsed. A failed poll keeps the last status.
    pub fn update(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        let due = self
            .last_poll
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if !due {
            return;
        }
        self.last_poll = Some(now);

        match self.source.poll() {
            Ok(status) => {
                if self.status != Some(status) {
                    log::info!("Activity status: {status:?}");
                }
                if status.is_busy() && self.forced {
                    self.forced = false;
                    log::debug!("Forced start cleared");
                }
                self.status = Some(status);
            }
            Err(e) => log::warn!("Status poll failed, keeping {:?}: {e}", self.status),
        }
    }

    /// Whether the run should be suspended right now
    pub fn should_pause(&self) -> bool {
        self.enabled && !self.forced && self.status.is_some_and(|s| s.pauses())
    }
}
