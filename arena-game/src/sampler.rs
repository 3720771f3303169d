//! Item value sampling within a rarity band
use rand::Rng;

use crate::numbers::{i64_to_f64, round_f64_to_i64};
use crate::rewards::{RarityConfig, ValueDistribution};

/// Sample an item value in cents from `band`.
///
/// The result is rounded to the cent and always lies in
/// `[band.min_cents, band.max_cents]`.
pub fn sample_value<R>(band: &RarityConfig, distribution: ValueDistribution, rng: &mut R) -> i64
where
    R: Rng + ?Sized,
{
    let u = rng.r#gen::<f64>();
    let fraction = match distribution {
        // Inverse CDF of a triangular distribution with mode at the lower bound.
        ValueDistribution::Triangular => 1.0 - (1.0 - u).sqrt(),
        ValueDistribution::Uniform => u,
    };
    let span = i64_to_f64(band.max_cents - band.min_cents);
    let raw = i64_to_f64(band.min_cents) + span * fraction;
    round_f64_to_i64(raw).clamp(band.min_cents, band.max_cents)
}
