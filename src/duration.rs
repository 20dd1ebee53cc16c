//! Duration literals: a sequence of decimal numbers, each with an optional
//! fraction and a required unit suffix, such as `"300ms"`, `"1.5h"` or
//! `"2h45m"`.
//!
//! Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `"0"` is
//! accepted without a unit. A leading `+` is allowed; a leading `-` is only
//! accepted when the total is zero, since [`Duration`] cannot be negative.
//!
//! [`format`] is the inverse: it renders the largest units first and drops
//! zero fractions, so `Duration::from_secs(3723)` becomes `"1h2m3s"`.

use std::time::Duration;

use crate::error::DurationError;

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(NANOSECOND),
        // U+00B5 micro sign and U+03BC greek small letter mu
        "us" | "\u{b5}s" | "\u{3bc}s" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Parse a duration literal.
pub fn parse(literal: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(literal.to_string());

    let (negative, mut rest) = match literal.as_bytes().first() {
        Some(b'-') => (true, &literal[1..]),
        Some(b'+') => (false, &literal[1..]),
        Some(_) => (false, literal),
        None => return Err(DurationError::Empty),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !rest.is_empty() {
        if !rest.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_digits, after_int) = rest.split_at(int_end);
        let whole: u64 = if int_digits.is_empty() {
            0
        } else {
            int_digits
                .parse()
                .map_err(|_| DurationError::Overflow(literal.to_string()))?
        };

        let mut frac_digits = "";
        rest = after_int;
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_digits = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        let unit_end = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, after_unit) = rest.split_at(unit_end);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(literal.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            literal: literal.to_string(),
        })?;
        rest = after_unit;

        let overflow = || DurationError::Overflow(literal.to_string());
        let mut amount = whole.checked_mul(scale).ok_or_else(overflow)?;
        if !frac_digits.is_empty() {
            amount = amount
                .checked_add(fraction_nanos(frac_digits, scale))
                .ok_or_else(overflow)?;
        }
        total = total.checked_add(amount).ok_or_else(overflow)?;
    }

    if negative && total != 0 {
        return Err(DurationError::Negative(literal.to_string()));
    }
    Ok(Duration::from_nanos(total))
}

/// Nanoseconds contributed by the digits after the decimal point.
fn fraction_nanos(digits: &str, scale: u64) -> u64 {
    // Digits past the 18th cannot change a u64 nanosecond count.
    let digits = &digits[..digits.len().min(18)];
    let numerator: u64 = digits.parse().unwrap_or(0);
    let denominator = 10f64.powi(digits.len() as i32);
    (numerator as f64 * (scale as f64 / denominator)) as u64
}

/// Render a duration in its canonical unit-suffixed form.
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".into();
    }

    if nanos < u128::from(SECOND) {
        let (precision, unit) = if nanos < u128::from(MICROSECOND) {
            (0, "ns")
        } else if nanos < u128::from(MILLISECOND) {
            (3, "\u{b5}s")
        } else {
            (6, "ms")
        };
        let (whole, frac) = split_fraction(nanos, precision);
        return format!("{whole}{frac}{unit}");
    }

    let (secs, frac) = split_fraction(nanos, 9);
    let minutes = secs / 60;
    if minutes == 0 {
        return format!("{secs}{frac}s");
    }
    let hours = minutes / 60;
    if hours == 0 {
        return format!("{minutes}m{}{frac}s", secs % 60);
    }
    format!("{hours}h{}m{}{frac}s", minutes % 60, secs % 60)
}

/// Split `value` into its whole part and a `.ddd` suffix of `precision`
/// decimal digits with trailing zeros removed (empty when all zero).
fn split_fraction(value: u128, precision: u32) -> (u128, String) {
    let divisor = 10u128.pow(precision);
    let whole = value / divisor;
    let frac = value % divisor;
    if frac == 0 {
        return (whole, String::new());
    }
    let digits = format!("{:0width$}", frac, width = precision as usize);
    (whole, format!(".{}", digits.trim_end_matches('0')))
}
