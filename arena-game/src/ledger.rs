//! Player ledger: the mutable aggregate every gameplay operation acts on.
//!
//! Fields are private; the chest engine, tier progression, income and upgrade
//! modules mutate the ledger through crate-private helpers, and the only
//! public mutators are [`PlayerLedger::earn`], [`PlayerLedger::sell`] and
//! [`PlayerLedger::reset`]. Spending never touches lifetime earnings.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::config::{GameConfig, StartingState};
use crate::rarity::Rarity;
use crate::upgrades::UpgradeEffect;

/// Passive income accrues per nanosecond; this many carry units make one cent.
pub(crate) const PASSIVE_CARRY_SCALE: i64 = 1_000_000_000;

/// Ledger-unique identity of a pulled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pulled card. Its value is fixed at pull time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub rarity: Rarity,
    pub value_cents: i64,
    /// Chest the item came out of.
    pub chest: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCounters {
    pub chests_opened: u64,
    pub items_collected: u64,
    pub items_sold: u64,
    pub total_clicks: u64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("item {0} is not in the collection")]
    ItemNotOwned(ItemId),
    #[error("invalid ledger snapshot: {0}")]
    InvalidSnapshot(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLedger {
    balance_cents: i64,
    lifetime_earned_cents: i64,
    current_tier: u32,
    claimed_tiers: BTreeSet<u32>,
    collection: Vec<Item>,
    counters: LedgerCounters,
    money_per_click_cents: i64,
    money_per_second_cents: i64,
    upgrades_owned: Vec<String>,
    reward_chests: Vec<String>,
    next_item_id: u64,
    /// Sub-cent passive income owed from earlier ticks, in cent-nanoseconds per second.
    #[serde(default)]
    passive_carry: i64,
}

impl Default for PlayerLedger {
    fn default() -> Self {
        Self::new(&StartingState::default())
    }
}

impl PlayerLedger {
    #[must_use]
    pub fn new(start: &StartingState) -> Self {
        Self {
            balance_cents: start.balance_cents,
            lifetime_earned_cents: 0,
            current_tier: 1,
            claimed_tiers: BTreeSet::new(),
            collection: Vec::new(),
            counters: LedgerCounters::default(),
            money_per_click_cents: start.money_per_click_cents,
            money_per_second_cents: start.money_per_second_cents,
            upgrades_owned: Vec::new(),
            reward_chests: Vec::new(),
            next_item_id: 1,
            passive_carry: 0,
        }
    }

    /// Reinitialise every field, including claimed tiers and item ids.
    pub fn reset(&mut self, start: &StartingState) {
        *self = Self::new(start);
    }

    #[must_use]
    pub const fn balance_cents(&self) -> i64 {
        self.balance_cents
    }

    #[must_use]
    pub const fn lifetime_earned_cents(&self) -> i64 {
        self.lifetime_earned_cents
    }

    #[must_use]
    pub const fn current_tier(&self) -> u32 {
        self.current_tier
    }

    #[must_use]
    pub const fn claimed_tiers(&self) -> &BTreeSet<u32> {
        &self.claimed_tiers
    }

    /// Owned items in pull order.
    #[must_use]
    pub fn collection(&self) -> &[Item] {
        &self.collection
    }

    #[must_use]
    pub const fn counters(&self) -> LedgerCounters {
        self.counters
    }

    #[must_use]
    pub const fn money_per_click_cents(&self) -> i64 {
        self.money_per_click_cents
    }

    #[must_use]
    pub const fn money_per_second_cents(&self) -> i64 {
        self.money_per_second_cents
    }

    /// Upgrade names in purchase order.
    #[must_use]
    pub fn upgrades_owned(&self) -> &[String] {
        &self.upgrades_owned
    }

    /// Unopened reward-only chest vouchers.
    #[must_use]
    pub fn reward_chests(&self) -> &[String] {
        &self.reward_chests
    }

    #[must_use]
    pub fn owns(&self, id: ItemId) -> bool {
        self.collection.iter().any(|item| item.id == id)
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.collection.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn owns_upgrade(&self, name: &str) -> bool {
        self.upgrades_owned.iter().any(|owned| owned == name)
    }

    #[must_use]
    pub fn has_reward_chest(&self, chest: &str) -> bool {
        self.reward_chests.iter().any(|held| held == chest)
    }

    /// Sum of the sell values of every owned item.
    #[must_use]
    pub fn collection_value(&self) -> i64 {
        self.collection
            .iter()
            .fold(0_i64, |acc, item| acc.saturating_add(item.value_cents))
    }

    #[must_use]
    pub fn count_by_rarity(&self) -> BTreeMap<Rarity, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.collection {
            *counts.entry(item.rarity).or_insert(0) += 1;
        }
        counts
    }

    /// Credit income that counts toward tier progression.
    ///
    /// Negative amounts are ignored. Returns the amount credited.
    pub fn earn(&mut self, cents: i64) -> i64 {
        let cents = cents.max(0);
        self.balance_cents = self.balance_cents.saturating_add(cents);
        self.lifetime_earned_cents = self.lifetime_earned_cents.saturating_add(cents);
        cents
    }

    /// Sell one owned item by identity, crediting its value to the balance.
    ///
    /// Proceeds are not lifetime earnings.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ItemNotOwned`] if `id` is not in the collection.
    pub fn sell(&mut self, id: ItemId) -> Result<i64, LedgerError> {
        let index = self
            .collection
            .iter()
            .position(|item| item.id == id)
            .ok_or(LedgerError::ItemNotOwned(id))?;
        let item = self.collection.remove(index);
        self.credit_reward(item.value_cents);
        self.counters.items_sold += 1;
        log::debug!(
            "sold {} '{}' ({}) for {} cents",
            item.id,
            item.name,
            item.rarity,
            item.value_cents
        );
        Ok(item.value_cents)
    }

    /// Check a restored snapshot against the config it will run under.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSnapshot`] describing the first problem.
    pub fn validate_against(&self, config: &GameConfig) -> Result<(), LedgerError> {
        let invalid = |msg: String| Err(LedgerError::InvalidSnapshot(msg));
        if self.balance_cents < 0 {
            return invalid(format!("negative balance {}", self.balance_cents));
        }
        if self.lifetime_earned_cents < 0 {
            return invalid(format!(
                "negative lifetime earnings {}",
                self.lifetime_earned_cents
            ));
        }
        if config.tier(self.current_tier).is_none() {
            return invalid(format!("unknown current tier {}", self.current_tier));
        }
        let reached = crate::tiers::qualifying_tier(&config.tiers, self.lifetime_earned_cents);
        if self.current_tier > reached {
            return invalid(format!(
                "current tier {} not reached by lifetime earnings {} (qualifies for {reached})",
                self.current_tier, self.lifetime_earned_cents
            ));
        }
        if !(0..PASSIVE_CARRY_SCALE).contains(&self.passive_carry) {
            return invalid(format!("passive income carry {} out of range", self.passive_carry));
        }
        if let Some(tier) = self
            .claimed_tiers
            .iter()
            .find(|tier| **tier < 2 || **tier > self.current_tier)
        {
            return invalid(format!(
                "claimed tier {tier} outside 2..={}",
                self.current_tier
            ));
        }
        for voucher in &self.reward_chests {
            if !config.chest(voucher).is_some_and(|chest| chest.reward_only) {
                return invalid(format!("voucher for non-reward chest '{voucher}'"));
            }
        }
        if let Some(item) = self.collection.iter().find(|item| item.id.0 >= self.next_item_id) {
            return invalid(format!("item {} at or past next id {}", item.id, self.next_item_id));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSnapshot`] if serialization fails.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string(self).map_err(|err| LedgerError::InvalidSnapshot(err.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSnapshot`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|err| LedgerError::InvalidSnapshot(err.to_string()))
    }

    pub(crate) fn credit_reward(&mut self, cents: i64) {
        self.balance_cents = self.balance_cents.saturating_add(cents.max(0));
    }

    /// Callers check affordability first.
    pub(crate) fn debit(&mut self, cents: i64) {
        self.balance_cents -= cents;
    }

    pub(crate) fn record_click(&mut self) {
        self.counters.total_clicks += 1;
    }

    pub(crate) fn record_chest_opened(&mut self) {
        self.counters.chests_opened += 1;
    }

    pub(crate) fn collect(
        &mut self,
        name: String,
        rarity: Rarity,
        value_cents: i64,
        chest: &str,
    ) -> Item {
        let item = Item {
            id: ItemId(self.next_item_id),
            name,
            rarity,
            value_cents,
            chest: chest.to_string(),
        };
        self.next_item_id += 1;
        self.collection.push(item.clone());
        self.counters.items_collected += 1;
        item
    }

    /// Returns false if the tier was already claimed.
    pub(crate) fn claim_tier(&mut self, tier: u32) -> bool {
        self.claimed_tiers.insert(tier)
    }

    pub(crate) fn advance_tier(&mut self, tier: u32) {
        self.current_tier = self.current_tier.max(tier);
    }

    pub(crate) const fn passive_carry(&self) -> i64 {
        self.passive_carry
    }

    pub(crate) const fn set_passive_carry(&mut self, carry: i64) {
        self.passive_carry = carry;
    }

    pub(crate) fn grant_reward_chest(&mut self, chest: &str) {
        self.reward_chests.push(chest.to_string());
    }

    /// Consume one voucher; false if none is held.
    pub(crate) fn take_reward_chest(&mut self, chest: &str) -> bool {
        match self.reward_chests.iter().position(|held| held == chest) {
            Some(index) => {
                self.reward_chests.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn apply_upgrade(&mut self, name: &str, effect: UpgradeEffect) {
        match effect {
            UpgradeEffect::Click { per_click_cents } => {
                self.money_per_click_cents = self.money_per_click_cents.saturating_add(per_click_cents);
            }
            UpgradeEffect::Passive { per_second_cents } => {
                self.money_per_second_cents =
                    self.money_per_second_cents.saturating_add(per_second_cents);
            }
        }
        self.upgrades_owned.push(name.to_string());
    }
}
