//! Numeric conversion helpers centralizing safe numeric casts.
//!
//! Currency is stored as integer cents everywhere in the engine; the only
//! place floating point leaks in is value sampling, which funnels through here.

use num_traits::cast::cast;

/// Number of cents in one whole currency unit.
pub const CENTS_PER_UNIT: i64 = 100;

/// Round a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    // i64::MAX is not representable as f64; the upper clamp lands one past it.
    cast::<f64, i64>(clamped).unwrap_or(if clamped > 0.0 { i64::MAX } else { i64::MIN })
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Render a cent amount as `$1,234.56` style text.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = abs / CENTS_PER_UNIT.unsigned_abs();
    let frac = abs % CENTS_PER_UNIT.unsigned_abs();

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{frac:02}")
}
