//! Leaderboard channel
//!
//! Outbound score reports are fire-and-forget JSON messages shaped
//! `{"type": ..., "data": ...}`. Inbound messages carry the player count and
//! leaderboards. `LocalLeaderboard` keeps the best score per username, top 10.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Maximum number of leaderboard entries to keep
pub const MAX_LEADERBOARD_ENTRIES: usize = 10;

/// Receives the running score whenever it changes
pub trait ScoreSink {
    fn report_score(&mut self, score: u64);
}

/// Sink that drops everything (offline play)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ScoreSink for NullSink {
    fn report_score(&mut self, _score: u64) {}
}

/// Registration payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdateData {
    pub score: u64,
}

/// Client to server messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    Register(RegisterData),
    ScoreUpdate(ScoreUpdateData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    pub username: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCountData {
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardData {
    #[serde(default)]
    pub entries: Vec<LeaderboardEntry>,
}

/// Server to client messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InboundMessage {
    Response(ResponseData),
    Error(ResponseData),
    PlayerCount(PlayerCountData),
    LiveLeaderboard(LeaderboardData),
    #[serde(rename = "alltime_leaderboard")]
    AllTimeLeaderboard(LeaderboardData),
}

impl InboundMessage {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Buffers outbound messages as JSON lines until a transport drains them
#[derive(Debug, Clone, Default)]
pub struct OutboundQueue {
    lines: VecDeque<String>,
    last_score: Option<u64>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: &OutboundMessage) {
        match serde_json::to_string(message) {
            Ok(line) => self.lines.push_back(line),
            Err(e) => log::warn!("Dropping outbound message: {e}"),
        }
    }

    pub fn register(&mut self, username: &str) {
        self.push(&OutboundMessage::Register(RegisterData {
            username: username.to_string(),
            device_id: String::new(),
        }));
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Take every pending line, oldest first
    pub fn drain(&mut self) -> Vec<String> {
        self.lines.drain(..).collect()
    }
}

impl ScoreSink for OutboundQueue {
    fn report_score(&mut self, score: u64) {
        // the server only needs changes
        if self.last_score == Some(score) {
            return;
        }
        self.last_score = Some(score);
        self.push(&OutboundMessage::ScoreUpdate(ScoreUpdateData { score }));
    }
}

/// Latest server-side view, updated from inbound messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardView {
    pub player_count: u32,
    pub live: Vec<LeaderboardEntry>,
    pub all_time: Vec<LeaderboardEntry>,
    pub registered_as: Option<String>,
}

impl LeaderboardView {
    pub fn apply(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Response(data) => {
                log::info!("Registered as {}", data.username);
                self.registered_as = Some(data.username);
            }
            InboundMessage::Error(data) => log::warn!("Leaderboard error: {}", data.message),
            InboundMessage::PlayerCount(data) => self.player_count = data.count,
            InboundMessage::LiveLeaderboard(data) => self.live = data.entries,
            InboundMessage::AllTimeLeaderboard(data) => self.all_time = data.entries,
        }
    }
}

/// Local all-time leaderboard: one entry per username, sorted descending
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LocalLeaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl LocalLeaderboard {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "stickrunner-leaderboard";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score would place (or improve `username`'s entry)
    pub fn qualifies(&self, username: &str, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if let Some(existing) = self.entries.iter().find(|e| e.username == username) {
            return score > existing.score;
        }
        if self.entries.len() < MAX_LEADERBOARD_ENTRIES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Record a score. Returns the 1-indexed rank if the board changed.
    pub fn add_score(&mut self, username: &str, score: u64) -> Option<usize> {
        if !self.qualifies(username, score) {
            return None;
        }
        self.entries.retain(|e| e.username != username);

        // ties keep the earlier holder ahead
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            pos,
            LeaderboardEntry {
                username: username.to_string(),
                score,
            },
        );
        self.entries.truncate(MAX_LEADERBOARD_ENTRIES);
        Some(pos + 1)
    }

    pub fn rank_of(&self, username: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.username == username)
            .map(|i| i + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}
