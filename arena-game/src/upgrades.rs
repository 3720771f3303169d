//! Income upgrades bought from the balance.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::config::{ConfigError, GameConfig};
use crate::ledger::PlayerLedger;

/// What an upgrade adds to the ledger's income rates. Effects stack additively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpgradeEffect {
    Click { per_click_cents: i64 },
    Passive { per_second_cents: i64 },
}

impl UpgradeEffect {
    const fn magnitude(self) -> i64 {
        match self {
            Self::Click { per_click_cents } => per_click_cents,
            Self::Passive { per_second_cents } => per_second_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub name: String,
    pub cost_cents: i64,
    pub effect: UpgradeEffect,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpgradeError {
    #[error("unknown upgrade '{0}'")]
    UnknownUpgrade(String),
    #[error("upgrade '{0}' is already owned")]
    AlreadyOwned(String),
    #[error("upgrade '{upgrade}' costs {cost_cents} cents but balance is {balance_cents}")]
    InsufficientFunds {
        upgrade: String,
        cost_cents: i64,
        balance_cents: i64,
    },
}

/// Reject duplicate names and non-positive costs or effects.
///
/// # Errors
///
/// Returns [`ConfigError::DuplicateUpgrade`] or [`ConfigError::InvalidUpgrade`].
pub fn validate_upgrades(upgrades: &[UpgradeDefinition]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for upgrade in upgrades {
        if !seen.insert(upgrade.name.as_str()) {
            return Err(ConfigError::DuplicateUpgrade(upgrade.name.clone()));
        }
        if upgrade.cost_cents <= 0 || upgrade.effect.magnitude() <= 0 {
            return Err(ConfigError::InvalidUpgrade(upgrade.name.clone()));
        }
    }
    Ok(())
}

/// Purchase `name` once, debiting its cost and applying its effect.
///
/// Nothing changes on error.
///
/// # Errors
///
/// Returns [`UpgradeError`] when the upgrade is unknown, already owned, or
/// the balance cannot cover it.
pub fn buy_upgrade(
    ledger: &mut PlayerLedger,
    config: &GameConfig,
    name: &str,
) -> Result<UpgradeEffect, UpgradeError> {
    let upgrade = config
        .upgrade(name)
        .ok_or_else(|| UpgradeError::UnknownUpgrade(name.to_string()))?;
    if ledger.owns_upgrade(name) {
        return Err(UpgradeError::AlreadyOwned(name.to_string()));
    }
    if ledger.balance_cents() < upgrade.cost_cents {
        return Err(UpgradeError::InsufficientFunds {
            upgrade: name.to_string(),
            cost_cents: upgrade.cost_cents,
            balance_cents: ledger.balance_cents(),
        });
    }

    ledger.debit(upgrade.cost_cents);
    ledger.apply_upgrade(&upgrade.name, upgrade.effect);
    log::debug!(
        "bought upgrade '{}' for {} cents: {:?}",
        upgrade.name,
        upgrade.cost_cents,
        upgrade.effect
    );
    Ok(upgrade.effect)
}

/// Upgrades not yet owned, in config order.
pub fn available_upgrades<'a>(
    ledger: &'a PlayerLedger,
    config: &'a GameConfig,
) -> impl Iterator<Item = &'a UpgradeDefinition> + 'a {
    config
        .upgrades
        .iter()
        .filter(move |upgrade| !ledger.owns_upgrade(&upgrade.name))
}
