//! Chest opening: the one place items enter a ledger.
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::config::GameConfig;
use crate::ledger::{Item, PlayerLedger};
use crate::picker::roll_rarity;
use crate::rarity::Rarity;
use crate::rewards::ChestDefinition;
use crate::sampler::sample_value;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChestError {
    #[error("unknown chest '{0}'")]
    UnknownChest(String),
    #[error("'{chest}' unlocks at tier {required_tier} (current tier {current_tier})")]
    ChestLocked {
        chest: String,
        required_tier: u32,
        current_tier: u32,
    },
    #[error("'{chest}' costs {price_cents} cents but balance is {balance_cents}")]
    InsufficientFunds {
        chest: String,
        price_cents: i64,
        balance_cents: i64,
    },
    #[error("no '{0}' reward chest to open")]
    NoRewardChest(String),
    #[error("'{0}' has no rarity with positive weight")]
    EmptyDistribution(String),
    #[error("rarity {0} has no value band configured")]
    MissingRarityBand(Rarity),
    #[error("rarity {0} has no item names configured")]
    EmptyNamePool(Rarity),
}

/// Opens chests against a ledger using an injected random source.
#[derive(Debug, Clone, Copy)]
pub struct ChestEngine<'a> {
    config: &'a GameConfig,
}

impl<'a> ChestEngine<'a> {
    #[must_use]
    pub const fn new(config: &'a GameConfig) -> Self {
        Self { config }
    }

    /// Open `chest_name` for `ledger`.
    ///
    /// The lock is checked before affordability. Rarity, value and name are
    /// all resolved before the ledger is touched, so any error leaves it
    /// exactly as it was. Purchasable chests debit their price from the
    /// balance; reward-only chests consume a voucher instead.
    ///
    /// # Errors
    ///
    /// Returns [`ChestError`] when the chest is unknown, locked, unaffordable,
    /// has no voucher, or resolves to a misconfigured rarity.
    pub fn open<R>(
        &self,
        chest_name: &str,
        ledger: &mut PlayerLedger,
        rng: &mut R,
    ) -> Result<Item, ChestError>
    where
        R: Rng + ?Sized,
    {
        let chest = self
            .config
            .chest(chest_name)
            .ok_or_else(|| ChestError::UnknownChest(chest_name.to_string()))?;
        Self::check_access(chest, ledger)?;

        let rarity = roll_rarity(&chest.odds, rng)
            .ok_or_else(|| ChestError::EmptyDistribution(chest.name.clone()))?;
        let band = self
            .config
            .rewards
            .rarity(rarity)
            .ok_or(ChestError::MissingRarityBand(rarity))?;
        let value_cents = sample_value(band, self.config.rewards.value_distribution, rng);
        let name = band
            .names
            .choose(rng)
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .ok_or(ChestError::EmptyNamePool(rarity))?;

        if chest.reward_only {
            if !ledger.take_reward_chest(&chest.name) {
                return Err(ChestError::NoRewardChest(chest.name.clone()));
            }
        } else {
            ledger.debit(chest.price_cents);
        }
        ledger.record_chest_opened();
        let item = ledger.collect(name, rarity, value_cents, &chest.name);
        log::debug!(
            "opened '{}': {} '{}' worth {} cents",
            chest.name,
            item.rarity,
            item.name,
            item.value_cents
        );
        Ok(item)
    }

    fn check_access(chest: &ChestDefinition, ledger: &PlayerLedger) -> Result<(), ChestError> {
        if ledger.current_tier() < chest.unlock_tier {
            return Err(ChestError::ChestLocked {
                chest: chest.name.clone(),
                required_tier: chest.unlock_tier,
                current_tier: ledger.current_tier(),
            });
        }
        if chest.reward_only {
            if !ledger.has_reward_chest(&chest.name) {
                return Err(ChestError::NoRewardChest(chest.name.clone()));
            }
        } else if ledger.balance_cents() < chest.price_cents {
            return Err(ChestError::InsufficientFunds {
                chest: chest.name.clone(),
                price_cents: chest.price_cents,
                balance_cents: ledger.balance_cents(),
            });
        }
        Ok(())
    }
}

/// Purchasable chests unlocked at the ledger's tier, in config order.
pub fn available_chests<'a>(
    ledger: &PlayerLedger,
    config: &'a GameConfig,
) -> impl Iterator<Item = &'a ChestDefinition> + 'a {
    let tier = ledger.current_tier();
    config
        .rewards
        .chests
        .iter()
        .filter(move |chest| !chest.reward_only && chest.unlock_tier <= tier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StartingState;
    use crate::rewards::{RarityConfig, RarityWeight, RewardTable, ValueDistribution};
    use crate::tiers::TierDefinition;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn band(rarity: Rarity, min_cents: i64, max_cents: i64) -> RarityConfig {
        RarityConfig {
            rarity,
            min_cents,
            max_cents,
            names: vec![format!("{rarity} Card")],
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            rewards: RewardTable {
                rarities: vec![
                    band(Rarity::Common, 58, 876),
                    band(Rarity::Rare, 877, 2_895),
                    band(Rarity::Legendary, 8_955, 48_788),
                ],
                value_distribution: ValueDistribution::Triangular,
                chests: vec![
                    ChestDefinition::weighted(
                        "Wooden Chest",
                        1_500,
                        1,
                        vec![
                            RarityWeight::new(Rarity::Common, 85.0),
                            RarityWeight::new(Rarity::Rare, 15.0),
                        ],
                    ),
                    ChestDefinition::weighted(
                        "Silver Chest",
                        7_500,
                        2,
                        vec![RarityWeight::new(Rarity::Rare, 1.0)],
                    ),
                    ChestDefinition::reward("Guaranteed Legendary", 2, Rarity::Legendary),
                ],
            },
            tiers: vec![
                TierDefinition::new(1, 0, 0),
                TierDefinition::new(2, 100_000, 50_000),
            ],
            upgrades: Vec::new(),
            starting: StartingState::default(),
        }
    }

    fn ledger_with_balance(balance_cents: i64) -> PlayerLedger {
        PlayerLedger::new(&StartingState {
            balance_cents,
            ..StartingState::default()
        })
    }

    #[test]
    fn wooden_chest_debits_price_and_records_one_item() {
        let config = config();
        let mut ledger = ledger_with_balance(2_000);
        let mut rng = ChaCha20Rng::seed_from_u64(11);

        let item = ChestEngine::new(&config)
            .open("Wooden Chest", &mut ledger, &mut rng)
            .unwrap();

        assert_eq!(ledger.balance_cents(), 500);
        assert_eq!(ledger.lifetime_earned_cents(), 0);
        assert_eq!(ledger.counters().chests_opened, 1);
        assert_eq!(ledger.counters().items_collected, 1);
        assert_eq!(ledger.collection(), [item.clone()]);
        assert!(matches!(item.rarity, Rarity::Common | Rarity::Rare));
        assert_eq!(item.chest, "Wooden Chest");
    }

    #[test]
    fn insufficient_funds_leaves_ledger_unchanged() {
        let config = config();
        let mut ledger = ledger_with_balance(1_499);
        let before = ledger.clone();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let err = ChestEngine::new(&config)
            .open("Wooden Chest", &mut ledger, &mut rng)
            .unwrap_err();

        assert_eq!(
            err,
            ChestError::InsufficientFunds {
                chest: "Wooden Chest".to_string(),
                price_cents: 1_500,
                balance_cents: 1_499,
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn lock_is_reported_before_funds() {
        let config = config();
        let mut ledger = ledger_with_balance(0);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert_eq!(
            ChestEngine::new(&config).open("Silver Chest", &mut ledger, &mut rng),
            Err(ChestError::ChestLocked {
                chest: "Silver Chest".to_string(),
                required_tier: 2,
                current_tier: 1,
            })
        );
    }

    #[test]
    fn unknown_chest_is_rejected() {
        let config = config();
        let mut ledger = ledger_with_balance(100_000);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert_eq!(
            ChestEngine::new(&config).open("Mystery Chest", &mut ledger, &mut rng),
            Err(ChestError::UnknownChest("Mystery Chest".to_string()))
        );
    }

    #[test]
    fn reward_chest_consumes_a_voucher_instead_of_balance() {
        let config = config();
        let mut ledger = ledger_with_balance(0);
        ledger.advance_tier(2);
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let engine = ChestEngine::new(&config);

        assert_eq!(
            engine.open("Guaranteed Legendary", &mut ledger, &mut rng),
            Err(ChestError::NoRewardChest("Guaranteed Legendary".to_string()))
        );

        ledger.grant_reward_chest("Guaranteed Legendary");
        let item = engine
            .open("Guaranteed Legendary", &mut ledger, &mut rng)
            .unwrap();
        assert_eq!(item.rarity, Rarity::Legendary);
        assert!((8_955..=48_788).contains(&item.value_cents));
        assert_eq!(ledger.balance_cents(), 0);
        assert!(ledger.reward_chests().is_empty());
    }

    #[test]
    fn empty_name_pool_is_an_error_without_side_effects() {
        let mut config = config();
        config.rewards.rarities[1].names.clear();
        config.rewards.chests[0].odds =
            crate::rewards::ChestOdds::Guaranteed(Rarity::Rare);
        let mut ledger = ledger_with_balance(5_000);
        let before = ledger.clone();
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        assert_eq!(
            ChestEngine::new(&config).open("Wooden Chest", &mut ledger, &mut rng),
            Err(ChestError::EmptyNamePool(Rarity::Rare))
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn available_chests_follow_tier_and_skip_reward_only() {
        let config = config();
        let mut ledger = ledger_with_balance(0);
        let names: Vec<_> = available_chests(&ledger, &config)
            .map(|chest| chest.name.as_str())
            .collect();
        assert_eq!(names, ["Wooden Chest"]);

        ledger.advance_tier(2);
        let names: Vec<_> = available_chests(&ledger, &config)
            .map(|chest| chest.name.as_str())
            .collect();
        assert_eq!(names, ["Wooden Chest", "Silver Chest"]);
    }
}
