//! Arena tier progression driven by lifetime earnings.
//!
//! Tiers are visited monotonically. Crossing several thresholds in one check
//! grants every intervening tier's reward in ascending order, and the
//! ledger's claimed-tier set guarantees each reward is paid at most once for
//! the lifetime of a save, even across reloads.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::ConfigError;
use crate::ledger::PlayerLedger;
use crate::rewards::RewardTable;

/// One progression gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub tier: u32,
    /// Lifetime earnings (cents) needed to qualify.
    pub requirement_cents: i64,
    /// Balance credited once when the tier is first reached.
    #[serde(default)]
    pub reward_cents: i64,
}

impl TierDefinition {
    #[must_use]
    pub const fn new(tier: u32, requirement_cents: i64, reward_cents: i64) -> Self {
        Self {
            tier,
            requirement_cents,
            reward_cents,
        }
    }
}

/// Emitted once per newly claimed tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUnlockEvent {
    pub tier: u32,
    pub reward_cents: i64,
    /// Purchasable chests that become visible at this tier.
    #[serde(default)]
    pub unlocked_chests: Vec<String>,
    /// Reward-only chest vouchers handed out at this tier.
    #[serde(default)]
    pub reward_chests: Vec<String>,
}

/// Events produced by one progression check; usually zero or one.
pub type UnlockEvents = SmallVec<[TierUnlockEvent; 2]>;

/// Display helper describing the distance to the next tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgress {
    pub current: u32,
    /// `None` once the last tier has been reached.
    pub next: Option<u32>,
    pub earned_toward_next_cents: i64,
    pub remaining_cents: i64,
}

/// Validate tier numbering and requirement ordering.
///
/// # Errors
///
/// Returns a [`ConfigError`] when tiers are not numbered `1..=N`, tier 1 has
/// a non-zero requirement, requirements decrease, or a reward is negative.
pub fn validate_tiers(tiers: &[TierDefinition]) -> Result<(), ConfigError> {
    let Some(first) = tiers.first() else {
        return Err(ConfigError::EmptyTierTable);
    };
    if first.requirement_cents != 0 {
        return Err(ConfigError::FirstTierRequirement(first.requirement_cents));
    }

    let mut previous_requirement = 0;
    for (expected, def) in (1_u32..).zip(tiers) {
        if def.tier != expected {
            return Err(ConfigError::TierNumbering {
                expected,
                found: def.tier,
            });
        }
        if def.requirement_cents < previous_requirement {
            return Err(ConfigError::DecreasingRequirement(def.tier));
        }
        if def.reward_cents < 0 {
            return Err(ConfigError::NegativeReward(def.tier));
        }
        previous_requirement = def.requirement_cents;
    }
    Ok(())
}

/// Highest tier whose requirement is covered by `lifetime_cents`.
#[must_use]
pub fn qualifying_tier(tiers: &[TierDefinition], lifetime_cents: i64) -> u32 {
    tiers
        .iter()
        .filter(|def| def.requirement_cents <= lifetime_cents)
        .map(|def| def.tier)
        .max()
        .unwrap_or(1)
}

/// Advance the ledger to the highest tier its lifetime earnings qualify for.
///
/// Every tier between the current one (exclusive) and the qualifying one
/// (inclusive) that has not been claimed yet pays its reward into the
/// balance, is added to the claimed set, and yields an event, in ascending
/// order. Reward currency does not count as lifetime earnings, so a payout
/// can never trigger a further tier. Calling this again without new
/// earnings is a no-op.
pub fn check_and_advance(
    ledger: &mut PlayerLedger,
    tiers: &[TierDefinition],
    rewards: &RewardTable,
) -> UnlockEvents {
    let mut events = UnlockEvents::new();
    let target = qualifying_tier(tiers, ledger.lifetime_earned_cents());
    let current = ledger.current_tier();
    if target <= current {
        return events;
    }

    for def in tiers
        .iter()
        .filter(|def| def.tier > current && def.tier <= target)
    {
        if !ledger.claim_tier(def.tier) {
            continue;
        }
        ledger.credit_reward(def.reward_cents);

        let mut unlocked_chests = Vec::new();
        let mut reward_chests = Vec::new();
        for chest in rewards.chests_unlocked_at(def.tier) {
            if chest.reward_only {
                ledger.grant_reward_chest(&chest.name);
                reward_chests.push(chest.name.clone());
            } else {
                unlocked_chests.push(chest.name.clone());
            }
        }

        log::debug!(
            "tier {} claimed: reward {} cents, unlocked {:?}, vouchers {:?}",
            def.tier,
            def.reward_cents,
            unlocked_chests,
            reward_chests
        );
        events.push(TierUnlockEvent {
            tier: def.tier,
            reward_cents: def.reward_cents,
            unlocked_chests,
            reward_chests,
        });
    }

    ledger.advance_tier(target);
    events
}

/// Progress toward the tier after the ledger's current one.
#[must_use]
pub fn tier_progress(ledger: &PlayerLedger, tiers: &[TierDefinition]) -> TierProgress {
    let current = ledger.current_tier();
    let lifetime = ledger.lifetime_earned_cents();
    let floor = tiers
        .iter()
        .find(|def| def.tier == current)
        .map_or(0, |def| def.requirement_cents);

    match tiers.iter().find(|def| def.tier > current) {
        Some(next) => TierProgress {
            current,
            next: Some(next.tier),
            earned_toward_next_cents: (lifetime - floor).max(0),
            remaining_cents: (next.requirement_cents - lifetime).max(0),
        },
        None => TierProgress {
            current,
            next: None,
            earned_toward_next_cents: (lifetime - floor).max(0),
            remaining_cents: 0,
        },
    }
}
