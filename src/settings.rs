//! Player settings and preferences
//!
//! Persisted separately from the economy through the key-value store.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError, load_json, save_json};

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name reported to the leaderboard (empty = anonymous)
    pub username: String,

    // === Input ===
    /// Lateral units per dragged pixel
    pub pointer_sensitivity: f32,

    // === Activity ===
    /// Suspend the run while the watched process is idle
    pub pause_when_idle: bool,
    /// Milliseconds between status polls
    pub status_poll_ms: u64,
    /// Milliseconds slept per frame while suspended
    pub paused_poll_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: String::new(),
            pointer_sensitivity: 0.01,
            pause_when_idle: true,
            status_poll_ms: 1000,
            paused_poll_ms: 100,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "stickrunner-settings";

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_ms.max(1))
    }

    pub fn paused_poll_delay(&self) -> Duration {
        Duration::from_millis(self.paused_poll_ms)
    }

    /// Username with whitespace trimmed, if one is set
    pub fn display_name(&self) -> Option<&str> {
        let name = self.username.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Load settings, falling back to defaults when absent or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring saved settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        save_json(store, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_settings_round_trip_through_store() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            username: "runner".to_string(),
            pause_when_idle: false,
            ..Default::default()
        };
        settings.save(&mut store).unwrap();
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(Settings::STORAGE_KEY, r#"{"username":"ada"}"#.to_string())
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.username, "ada");
        assert_eq!(settings.status_poll_ms, 1000);
        assert!(settings.pause_when_idle);
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "{not json".to_string()).unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_display_name() {
        let mut settings = Settings::default();
        assert_eq!(settings.display_name(), None);
        settings.username = "  ada ".to_string();
        assert_eq!(settings.display_name(), Some("ada"));
    }
}
