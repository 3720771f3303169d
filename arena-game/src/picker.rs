//! Cumulative-weight rarity selection
use rand::Rng;

use crate::rarity::Rarity;
use crate::rewards::{ChestOdds, RarityWeight};

fn usable_weight(entry: &RarityWeight) -> Option<f64> {
    (entry.weight.is_finite() && entry.weight > 0.0).then_some(entry.weight)
}

/// Pick a rarity from `entries` for a roll in `[0, 1)`.
///
/// Weights are magnitudes: the roll is scaled by their total, then the first
/// entry (in authoring order) whose running sum reaches the scaled roll wins.
/// Zero-weight entries contribute nothing and are never returned. A roll that
/// lands past the final boundary falls back to the last positive entry.
///
/// Returns `None` only when no entry carries positive weight.
#[must_use]
pub fn pick_rarity(entries: &[RarityWeight], roll: f64) -> Option<Rarity> {
    let total: f64 = entries.iter().filter_map(usable_weight).sum();
    if total <= 0.0 {
        return None;
    }

    let roll = if roll.is_finite() { roll.max(0.0) } else { 0.0 };
    let target = roll * total;
    let mut cumulative = 0.0;
    let mut last = None;

    for entry in entries {
        let Some(weight) = usable_weight(entry) else {
            continue;
        };
        cumulative += weight;
        last = Some(entry.rarity);
        if cumulative >= target {
            return last;
        }
    }

    last
}

/// Resolve a chest's odds into a rarity, drawing from `rng` only when needed.
///
/// Guaranteed odds short-circuit without consuming randomness.
pub fn roll_rarity<R>(odds: &ChestOdds, rng: &mut R) -> Option<Rarity>
where
    R: Rng + ?Sized,
{
    match odds {
        ChestOdds::Guaranteed(rarity) => Some(*rarity),
        ChestOdds::Weighted(entries) => pick_rarity(entries, rng.r#gen::<f64>()),
    }
}
