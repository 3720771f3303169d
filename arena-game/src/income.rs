//! Click and passive income, the only sources of lifetime earnings.
use std::time::Duration;

use crate::ledger::{PASSIVE_CARRY_SCALE, PlayerLedger};

/// Credit one click. Returns the amount earned.
pub fn click(ledger: &mut PlayerLedger) -> i64 {
    ledger.record_click();
    ledger.earn(ledger.money_per_click_cents())
}

/// Credit passive income for `elapsed`. Returns the whole cents credited.
///
/// Fractions of a cent are carried in the ledger into the next tick, so many
/// short ticks pay the same as one long tick over the same span.
pub fn tick(ledger: &mut PlayerLedger, elapsed: Duration) -> i64 {
    let rate = ledger.money_per_second_cents();
    if rate <= 0 || elapsed.is_zero() {
        return 0;
    }
    let nanos = i128::try_from(elapsed.as_nanos()).unwrap_or(i128::MAX);
    let owed = i128::from(rate)
        .saturating_mul(nanos)
        .saturating_add(i128::from(ledger.passive_carry()));
    let scale = i128::from(PASSIVE_CARRY_SCALE);
    let earned = i64::try_from(owed / scale).unwrap_or(i64::MAX);
    ledger.set_passive_carry(i64::try_from(owed % scale).unwrap_or(0));
    ledger.earn(earned)
}
