//! Number formatting for hologram text.
//!
//! Amounts are always shown the same way regardless of the server locale:
//! `,` groups thousands and at most one fractional digit is kept, rounding
//! ties to even (`#,##0.#`).

use crate::config::MILLIS_PER_TICK;

/// Insert `,` between groups of three in a run of ASCII digits.
fn group_digits(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Format the magnitude of a damage or healing amount.
///
/// The sign is dropped; non-finite input renders as `0`. Rounding works on
/// the exact binary value, so `4.35` (stored just below the tie) shows as
/// `4.3` and `0.05` (stored just above it) as `0.1`.
///
/// # Examples
/// ```
/// use damage_numbers_types::formatting::format_amount;
/// assert_eq!(format_amount(7.0), "7");
/// assert_eq!(format_amount(4.25), "4.2");
/// assert_eq!(format_amount(-3.5), "3.5");
/// assert_eq!(format_amount(12_345.67), "12,345.7");
/// ```
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return "0".to_string();
    }
    // `{:.1}` rounds the exact value, ties to even
    let fixed = format!("{:.1}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "0"));
    let whole = group_digits(whole);
    if frac == "0" {
        whole
    } else {
        format!("{whole}.{frac}")
    }
}

/// Format a tick count with its wall-clock equivalent, for diagnostics.
///
/// # Examples
/// ```
/// use damage_numbers_types::formatting::format_ticks;
/// assert_eq!(format_ticks(10), "10 ticks (500ms)");
/// assert_eq!(format_ticks(1), "1 tick (50ms)");
/// ```
pub fn format_ticks(ticks: u64) -> String {
    let unit = if ticks == 1 { "tick" } else { "ticks" };
    format!("{} {} ({}ms)", ticks, unit, ticks.saturating_mul(MILLIS_PER_TICK))
}
