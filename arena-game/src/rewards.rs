//! Reward table: rarity value bands, name pools, and chest odds.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::ConfigError;
use crate::rarity::Rarity;

/// Value band and name pool for one rarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityConfig {
    pub rarity: Rarity,
    /// Inclusive lower bound of sampled item values, in cents.
    pub min_cents: i64,
    /// Inclusive upper bound of sampled item values, in cents.
    pub max_cents: i64,
    /// Item names pulled uniformly when this rarity is rolled.
    #[serde(default)]
    pub names: Vec<String>,
}

impl RarityConfig {
    #[must_use]
    pub const fn contains(&self, value_cents: i64) -> bool {
        value_cents >= self.min_cents && value_cents <= self.max_cents
    }
}

/// Shape of the value distribution inside a rarity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueDistribution {
    /// Triangular with the mode pinned at the band minimum; cheap pulls dominate.
    #[default]
    Triangular,
    /// Flat across the band.
    Uniform,
}

/// One authored entry of a chest's weight distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityWeight {
    pub rarity: Rarity,
    pub weight: f64,
}

impl RarityWeight {
    #[must_use]
    pub const fn new(rarity: Rarity, weight: f64) -> Self {
        Self { rarity, weight }
    }
}

/// How a chest decides the rarity of its pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChestOdds {
    /// Cumulative pick over the entries in authoring order.
    Weighted(Vec<RarityWeight>),
    /// Always yields the given rarity.
    Guaranteed(Rarity),
}

impl ChestOdds {
    /// Rarities this chest can actually produce.
    #[must_use]
    pub fn reachable(&self) -> Vec<Rarity> {
        match self {
            Self::Weighted(entries) => entries
                .iter()
                .filter(|entry| entry.weight > 0.0)
                .map(|entry| entry.rarity)
                .collect(),
            Self::Guaranteed(rarity) => vec![*rarity],
        }
    }
}

/// A purchasable (or reward-granted) loot container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestDefinition {
    pub name: String,
    /// Price in cents; zero for reward-only chests.
    #[serde(default)]
    pub price_cents: i64,
    /// Minimum player tier required to see or open the chest.
    #[serde(default = "default_unlock_tier")]
    pub unlock_tier: u32,
    /// Reward-only chests cannot be bought; tier unlocks hand out vouchers.
    #[serde(default)]
    pub reward_only: bool,
    pub odds: ChestOdds,
}

const fn default_unlock_tier() -> u32 {
    1
}

impl ChestDefinition {
    /// Build a purchasable weighted chest.
    #[must_use]
    pub fn weighted(
        name: impl Into<String>,
        price_cents: i64,
        unlock_tier: u32,
        weights: Vec<RarityWeight>,
    ) -> Self {
        Self {
            name: name.into(),
            price_cents,
            unlock_tier,
            reward_only: false,
            odds: ChestOdds::Weighted(weights),
        }
    }

    /// Build a free reward chest that always yields `rarity`.
    #[must_use]
    pub fn reward(name: impl Into<String>, unlock_tier: u32, rarity: Rarity) -> Self {
        Self {
            name: name.into(),
            price_cents: 0,
            unlock_tier,
            reward_only: true,
            odds: ChestOdds::Guaranteed(rarity),
        }
    }
}

/// Static loot configuration shared by every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    pub rarities: Vec<RarityConfig>,
    #[serde(default)]
    pub value_distribution: ValueDistribution,
    pub chests: Vec<ChestDefinition>,
}

impl RewardTable {
    #[must_use]
    pub fn rarity(&self, rarity: Rarity) -> Option<&RarityConfig> {
        self.rarities.iter().find(|cfg| cfg.rarity == rarity)
    }

    #[must_use]
    pub fn chest(&self, name: &str) -> Option<&ChestDefinition> {
        self.chests.iter().find(|chest| chest.name == name)
    }

    /// Chests whose unlock tier is exactly `tier`, in config order.
    pub fn chests_unlocked_at(&self, tier: u32) -> impl Iterator<Item = &ChestDefinition> {
        self.chests
            .iter()
            .filter(move |chest| chest.unlock_tier == tier)
    }

    /// Validate rarity bands, name pools, and every chest distribution.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for cfg in &self.rarities {
            if !seen.insert(cfg.rarity) {
                return Err(ConfigError::DuplicateRarity(cfg.rarity));
            }
            if cfg.min_cents <= 0 || cfg.min_cents >= cfg.max_cents {
                return Err(ConfigError::InvalidRange {
                    rarity: cfg.rarity,
                    min_cents: cfg.min_cents,
                    max_cents: cfg.max_cents,
                });
            }
            if cfg.names.is_empty() || cfg.names.iter().any(|name| name.trim().is_empty()) {
                return Err(ConfigError::EmptyNamePool(cfg.rarity));
            }
        }

        let mut chest_names = HashSet::new();
        for chest in &self.chests {
            if !chest_names.insert(chest.name.as_str()) {
                return Err(ConfigError::DuplicateChest(chest.name.clone()));
            }
            self.validate_chest(chest)?;
        }
        Ok(())
    }

    fn validate_chest(&self, chest: &ChestDefinition) -> Result<(), ConfigError> {
        if chest.price_cents < 0 {
            return Err(ConfigError::NegativePrice {
                chest: chest.name.clone(),
                price_cents: chest.price_cents,
            });
        }
        if chest.reward_only && chest.price_cents != 0 {
            return Err(ConfigError::PricedRewardChest(chest.name.clone()));
        }
        if chest.unlock_tier == 0 {
            return Err(ConfigError::InvalidUnlockTier {
                chest: chest.name.clone(),
                tier: chest.unlock_tier,
            });
        }

        match &chest.odds {
            ChestOdds::Guaranteed(rarity) => self.require_rarity(&chest.name, *rarity),
            ChestOdds::Weighted(entries) => {
                if entries.is_empty() {
                    return Err(ConfigError::EmptyDistribution(chest.name.clone()));
                }
                let mut total = 0.0;
                for entry in entries {
                    self.require_rarity(&chest.name, entry.rarity)?;
                    if !entry.weight.is_finite() || entry.weight < 0.0 {
                        return Err(ConfigError::InvalidWeight {
                            chest: chest.name.clone(),
                            rarity: entry.rarity,
                            weight: entry.weight,
                        });
                    }
                    total += entry.weight;
                }
                if total <= 0.0 {
                    return Err(ConfigError::ZeroTotalWeight(chest.name.clone()));
                }
                Ok(())
            }
        }
    }

    fn require_rarity(&self, chest: &str, rarity: Rarity) -> Result<(), ConfigError> {
        if self.rarity(rarity).is_some() {
            Ok(())
        } else {
            Err(ConfigError::UndefinedRarity {
                chest: chest.to_string(),
                rarity,
            })
        }
    }
}
