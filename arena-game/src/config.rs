//! Static game configuration loaded once per session.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rarity::Rarity;
use crate::rewards::{ChestDefinition, RarityConfig, RewardTable};
use crate::tiers::{TierDefinition, validate_tiers};
use crate::upgrades::{UpgradeDefinition, validate_upgrades};

/// Canonical configuration JSON compiled into the crate.
pub const DEFAULT_GAME_DATA: &str = include_str!("../assets/data/game.json");

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("rarity {0} is configured more than once")]
    DuplicateRarity(Rarity),
    #[error("rarity {rarity} has invalid value band [{min_cents}, {max_cents}]")]
    InvalidRange {
        rarity: Rarity,
        min_cents: i64,
        max_cents: i64,
    },
    #[error("rarity {0} has a missing or blank item name")]
    EmptyNamePool(Rarity),
    #[error("chest '{chest}' references undefined rarity {rarity}")]
    UndefinedRarity { chest: String, rarity: Rarity },
    #[error("chest '{0}' has an empty weight distribution")]
    EmptyDistribution(String),
    #[error("chest '{chest}' has invalid weight {weight} for {rarity}")]
    InvalidWeight {
        chest: String,
        rarity: Rarity,
        weight: f64,
    },
    #[error("chest '{0}' weights sum to zero")]
    ZeroTotalWeight(String),
    #[error("chest '{0}' is defined more than once")]
    DuplicateChest(String),
    #[error("chest '{chest}' has negative price {price_cents}")]
    NegativePrice { chest: String, price_cents: i64 },
    #[error("reward-only chest '{0}' must be free")]
    PricedRewardChest(String),
    #[error("chest '{chest}' unlocks at unknown tier {tier}")]
    InvalidUnlockTier { chest: String, tier: u32 },
    #[error("tier table is empty")]
    EmptyTierTable,
    #[error("tier numbered {found} where tier {expected} was expected")]
    TierNumbering { expected: u32, found: u32 },
    #[error("tier 1 must require zero lifetime earnings (got {0})")]
    FirstTierRequirement(i64),
    #[error("tier {0} requires less than the tier before it")]
    DecreasingRequirement(u32),
    #[error("tier {0} has a negative reward")]
    NegativeReward(u32),
    #[error("upgrade '{0}' is defined more than once")]
    DuplicateUpgrade(String),
    #[error("upgrade '{0}' must have a positive cost and effect")]
    InvalidUpgrade(String),
    #[error("starting state must have non-negative rates and balance")]
    InvalidStartingState,
}

/// Ledger values a fresh (or reset) player begins with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingState {
    #[serde(default = "StartingState::default_money_per_click")]
    pub money_per_click_cents: i64,
    #[serde(default)]
    pub money_per_second_cents: i64,
    #[serde(default)]
    pub balance_cents: i64,
}

impl StartingState {
    const fn default_money_per_click() -> i64 {
        100
    }
}

impl Default for StartingState {
    fn default() -> Self {
        Self {
            money_per_click_cents: Self::default_money_per_click(),
            money_per_second_cents: 0,
            balance_cents: 0,
        }
    }
}

/// Everything static a session needs: loot, tiers, upgrades, and starting values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rewards: RewardTable,
    pub tiers: Vec<TierDefinition>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeDefinition>,
    #[serde(default)]
    pub starting: StartingState,
}

impl GameConfig {
    /// Parse and validate a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the relevant
    /// validation error for well-formed but inconsistent data.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every table and the cross references between them.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rewards.validate()?;
        validate_tiers(&self.tiers)?;
        validate_upgrades(&self.upgrades)?;

        let max_tier = self.max_tier();
        if let Some(chest) = self
            .rewards
            .chests
            .iter()
            .find(|chest| chest.unlock_tier > max_tier)
        {
            return Err(ConfigError::InvalidUnlockTier {
                chest: chest.name.clone(),
                tier: chest.unlock_tier,
            });
        }

        let start = &self.starting;
        if start.money_per_click_cents < 0
            || start.money_per_second_cents < 0
            || start.balance_cents < 0
        {
            return Err(ConfigError::InvalidStartingState);
        }
        Ok(())
    }

    /// Canonical configuration compiled into the crate.
    ///
    /// Falls back to a single-chest, single-tier table if the embedded data
    /// ever fails validation.
    #[must_use]
    pub fn default_config() -> Self {
        Self::from_json(DEFAULT_GAME_DATA).unwrap_or_else(|err| {
            log::error!("embedded game config rejected: {err}");
            Self::minimal()
        })
    }

    fn minimal() -> Self {
        Self {
            rewards: RewardTable {
                rarities: vec![RarityConfig {
                    rarity: Rarity::Common,
                    min_cents: 58,
                    max_cents: 876,
                    names: vec!["Knight".to_string()],
                }],
                value_distribution: crate::rewards::ValueDistribution::Triangular,
                chests: vec![ChestDefinition {
                    name: "Wooden Chest".to_string(),
                    price_cents: 1_500,
                    unlock_tier: 1,
                    reward_only: false,
                    odds: crate::rewards::ChestOdds::Guaranteed(Rarity::Common),
                }],
            },
            tiers: vec![TierDefinition::new(1, 0, 0)],
            upgrades: Vec::new(),
            starting: StartingState::default(),
        }
    }

    #[must_use]
    pub fn chest(&self, name: &str) -> Option<&ChestDefinition> {
        self.rewards.chest(name)
    }

    #[must_use]
    pub fn tier(&self, tier: u32) -> Option<&TierDefinition> {
        self.tiers.iter().find(|def| def.tier == tier)
    }

    #[must_use]
    pub fn upgrade(&self, name: &str) -> Option<&UpgradeDefinition> {
        self.upgrades.iter().find(|upgrade| upgrade.name == name)
    }

    /// Highest tier number in the table.
    #[must_use]
    pub fn max_tier(&self) -> u32 {
        self.tiers.last().map_or(1, |def| def.tier)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::ChestOdds;

    #[test]
    fn embedded_config_is_valid() {
        let cfg = GameConfig::from_json(DEFAULT_GAME_DATA).expect("embedded config parses");
        assert_eq!(cfg.rewards.rarities.len(), 5);
        assert_eq!(cfg.rewards.chests.len(), 10);
        assert_eq!(cfg.tiers.len(), 25);
        assert_eq!(cfg.upgrades.len(), 13);
        assert_eq!(cfg.max_tier(), 25);
    }

    #[test]
    fn embedded_config_carries_canonical_numbers() {
        let cfg = GameConfig::default_config();
        let wooden = cfg.chest("Wooden Chest").unwrap();
        assert_eq!(wooden.price_cents, 1_500);
        assert_eq!(wooden.unlock_tier, 1);
        assert_eq!(wooden.odds.reachable(), vec![Rarity::Common, Rarity::Rare]);

        let champion = cfg.chest("Guaranteed Champion").unwrap();
        assert!(champion.reward_only);
        assert_eq!(champion.unlock_tier, 20);
        assert_eq!(champion.odds, ChestOdds::Guaranteed(Rarity::Champion));

        let arena_two = cfg.tier(2).unwrap();
        assert_eq!(arena_two.requirement_cents, 100_000);
        assert_eq!(arena_two.reward_cents, 50_000);
        assert_eq!(cfg.starting.money_per_click_cents, 100);
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn chest_beyond_last_tier_is_rejected() {
        let mut cfg = GameConfig::minimal();
        cfg.rewards.chests[0].unlock_tier = 2;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidUnlockTier {
                chest: "Wooden Chest".to_string(),
                tier: 2,
            })
        );
    }

    #[test]
    fn negative_starting_rates_are_rejected() {
        let mut cfg = GameConfig::minimal();
        cfg.starting.money_per_click_cents = -1;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidStartingState));
    }

    #[test]
    fn minimal_fallback_validates() {
        assert_eq!(GameConfig::minimal().validate(), Ok(()));
    }
}
