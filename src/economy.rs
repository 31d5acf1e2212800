//! Weapon upgrade economy
//!
//! Coins dropped by zombies buy weapon upgrades. The ledger survives restarts
//! and is persisted through a [`KeyValueStore`]; it is only reset by an
//! explicit player action.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::{KeyValueStore, StoreError, load_json, save_json};
use crate::tuning::WeaponTuning;

/// Store key for upgrade levels and derived stats
pub const UPGRADES_KEY: &str = "stickrunner-weapon-upgrades";
/// Store key for the coin balance
pub const COINS_KEY: &str = "stickrunner-coins";

/// Purchasable weapon upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeKind {
    Damage,
    Velocity,
    FireRate,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 3] = [UpgradeKind::Damage, UpgradeKind::Velocity, UpgradeKind::FireRate];

    pub fn name(&self) -> &'static str {
        match self {
            UpgradeKind::Damage => "Damage",
            UpgradeKind::Velocity => "Velocity",
            UpgradeKind::FireRate => "Rate of Fire",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UpgradeKind::Damage => "+1 damage per bullet",
            UpgradeKind::Velocity => "+10% bullet speed",
            UpgradeKind::FireRate => "Faster shooting",
        }
    }

    pub fn max_level(&self) -> u32 {
        match self {
            UpgradeKind::Damage => 20,
            UpgradeKind::Velocity => 15,
            UpgradeKind::FireRate => 10,
        }
    }

    /// Price of the next level when `level` levels are owned
    pub fn cost(&self, level: u32) -> u64 {
        let level = level as u64;
        match self {
            UpgradeKind::Damage => 10 + level * 5,
            UpgradeKind::Velocity => 15 + level * 8,
            UpgradeKind::FireRate => 20 + level * 10,
        }
    }
}

/// Owned upgrade levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeLevels {
    pub damage: u32,
    pub bullet_velocity: u32,
    pub rate_of_fire: u32,
}

impl UpgradeLevels {
    pub fn get(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Damage => self.damage,
            UpgradeKind::Velocity => self.bullet_velocity,
            UpgradeKind::FireRate => self.rate_of_fire,
        }
    }

    fn get_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::Damage => &mut self.damage,
            UpgradeKind::Velocity => &mut self.bullet_velocity,
            UpgradeKind::FireRate => &mut self.rate_of_fire,
        }
    }

    /// Clamp levels read from storage to what can be bought
    fn clamped(self) -> Self {
        Self {
            damage: self.damage.min(UpgradeKind::Damage.max_level()),
            bullet_velocity: self.bullet_velocity.min(UpgradeKind::Velocity.max_level()),
            rate_of_fire: self.rate_of_fire.min(UpgradeKind::FireRate.max_level()),
        }
    }
}

/// Weapon parameters consumed by shooting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponStats {
    pub damage: u32,
    /// Projectile speed (units/s)
    pub bullet_velocity: f32,
    /// Seconds between shots
    pub fire_interval: f32,
}

impl WeaponStats {
    /// Derive stats from base tuning and owned levels
    pub fn from_levels(base: &WeaponTuning, levels: &UpgradeLevels) -> Self {
        Self {
            damage: base.base_damage + levels.damage,
            bullet_velocity: base.base_speed * base.speed_step.powi(levels.bullet_velocity as i32),
            fire_interval: (base.base_interval - base.interval_step * levels.rate_of_fire as f32)
                .max(base.min_interval),
        }
    }
}

/// One row of the upgrade shop
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeInfo {
    pub kind: UpgradeKind,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u64,
    pub max_level: u32,
    pub current_level: u32,
}

/// Why a purchase was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("not enough coins: need {cost}, have {balance}")]
    InsufficientFunds { cost: u64, balance: u64 },
    #[error("{kind:?} is already at max level {level}")]
    MaxLevel { kind: UpgradeKind, level: u32 },
}

/// Result of a successful purchase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseReceipt {
    pub kind: UpgradeKind,
    pub level: u32,
    pub cost: u64,
    pub balance: u64,
}

/// Serialized form under [`UPGRADES_KEY`]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedUpgrades {
    upgrade_levels: UpgradeLevels,
    stats: WeaponStats,
}

/// Upgrade levels, derived stats and coin balance
#[derive(Debug, Clone, PartialEq)]
pub struct EconomyLedger {
    base: WeaponTuning,
    levels: UpgradeLevels,
    stats: WeaponStats,
    coins: u64,
}

impl Default for EconomyLedger {
    fn default() -> Self {
        Self::new(WeaponTuning::default())
    }
}

impl EconomyLedger {
    pub fn new(base: WeaponTuning) -> Self {
        let levels = UpgradeLevels::default();
        Self {
            stats: WeaponStats::from_levels(&base, &levels),
            base,
            levels,
            coins: 0,
        }
    }

    /// Use `base` for derived stats; levels and coins are kept
    pub fn rebase(&mut self, base: WeaponTuning) {
        if self.base != base {
            self.stats = WeaponStats::from_levels(&base, &self.levels);
            self.base = base;
        }
    }

    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn levels(&self) -> UpgradeLevels {
        self.levels
    }

    pub fn stats(&self) -> WeaponStats {
        self.stats
    }

    /// Add coins; returns the new balance
    pub fn credit(&mut self, amount: u64) -> u64 {
        self.coins = self.coins.saturating_add(amount);
        self.coins
    }

    /// Price of the next level, or `None` at max level
    pub fn next_cost(&self, kind: UpgradeKind) -> Option<u64> {
        let level = self.levels.get(kind);
        (level < kind.max_level()).then(|| kind.cost(level))
    }

    pub fn can_purchase(&self, kind: UpgradeKind) -> bool {
        self.next_cost(kind).is_some_and(|cost| self.coins >= cost)
    }

    /// Buy one level. On `Err` nothing changes.
    pub fn purchase(&mut self, kind: UpgradeKind) -> Result<PurchaseReceipt, PurchaseError> {
        let level = self.levels.get(kind);
        let cost = self.next_cost(kind).ok_or(PurchaseError::MaxLevel { kind, level })?;
        if self.coins < cost {
            return Err(PurchaseError::InsufficientFunds {
                cost,
                balance: self.coins,
            });
        }

        self.coins -= cost;
        *self.levels.get_mut(kind) += 1;
        self.stats = WeaponStats::from_levels(&self.base, &self.levels);
        let receipt = PurchaseReceipt {
            kind,
            level: level + 1,
            cost,
            balance: self.coins,
        };
        log::info!("Purchased {} level {} for {cost} coins", kind.name(), receipt.level);
        Ok(receipt)
    }

    /// Drop every upgrade back to level 0. The coin balance is kept.
    pub fn reset_upgrades(&mut self) {
        self.levels = UpgradeLevels::default();
        self.stats = WeaponStats::from_levels(&self.base, &self.levels);
        log::info!("Weapon upgrades reset");
    }

    /// Shop listing for every upgrade
    pub fn upgrade_info(&self) -> Vec<UpgradeInfo> {
        UpgradeKind::ALL
            .iter()
            .map(|&kind| UpgradeInfo {
                kind,
                name: kind.name(),
                description: kind.description(),
                cost: kind.cost(self.levels.get(kind)),
                max_level: kind.max_level(),
                current_level: self.levels.get(kind),
            })
            .collect()
    }

    /// Load from a store. Missing or unreadable values fall back to defaults.
    pub fn load(store: &dyn KeyValueStore, base: WeaponTuning) -> Self {
        let mut ledger = Self::new(base);

        match load_json::<SavedUpgrades>(store, UPGRADES_KEY) {
            Ok(Some(saved)) => {
                ledger.levels = saved.upgrade_levels.clamped();
                // stats are always derived; the stored copy is informational
                ledger.stats = WeaponStats::from_levels(&ledger.base, &ledger.levels);
                log::info!("Loaded weapon upgrades {:?}", ledger.levels);
            }
            Ok(None) => log::info!("No saved weapon upgrades, starting fresh"),
            Err(e) => log::warn!("Ignoring saved weapon upgrades: {e}"),
        }

        match load_json::<u64>(store, COINS_KEY) {
            Ok(Some(coins)) => ledger.coins = coins,
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring saved coin balance: {e}"),
        }

        ledger
    }

    /// Persist levels, stats and balance
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let saved = SavedUpgrades {
            upgrade_levels: self.levels,
            stats: self.stats,
        };
        save_json(store, UPGRADES_KEY, &saved)?;
        save_json(store, COINS_KEY, &self.coins)?;
        log::debug!("Economy saved ({} coins)", self.coins);
        Ok(())
    }
}
