//! Numeric coercion for loosely typed amount and quantity fields

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use serde_json::Value;
use std::str::FromStr;

/// Largest amount accepted at ingestion, in won (10^15)
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Largest quantity accepted at ingestion
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Why a raw value could not be used as a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceError {
    /// No number could be read from the value
    NotNumeric,
    /// A number was read but its magnitude exceeds the accepted maximum
    OutOfRange,
}

/// Coerce an amount to whole won, rounding half away from zero.
///
/// Accepts JSON numbers and numeric strings. Thousands separators are
/// ignored and trailing garbage after a numeric prefix is dropped
/// (`"12,000원"` is 12000). Magnitudes above [`MAX_AMOUNT`] are rejected.
pub fn coerce_amount(value: &Value) -> Result<i64, CoerceError> {
    coerce(value, RoundingMode::HalfUp, MAX_AMOUNT)
}

/// Coerce a quantity to a whole number, truncating any fraction
pub fn coerce_quantity(value: &Value) -> Result<i64, CoerceError> {
    coerce(value, RoundingMode::Down, MAX_QUANTITY)
}

fn coerce(value: &Value, mode: RoundingMode, max: i64) -> Result<i64, CoerceError> {
    let decimal = match value {
        Value::Number(n) => {
            let text = n.to_string();
            BigDecimal::from_str(&text)
                .ok()
                .or_else(|| parse_prefix(&text))
                .ok_or(CoerceError::NotNumeric)?
        }
        Value::String(s) => parse_prefix(s).ok_or(CoerceError::NotNumeric)?,
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => {
            return Err(CoerceError::NotNumeric)
        }
    };
    let whole = decimal.with_scale_round(0, mode);
    if whole.abs() > BigDecimal::from(max) {
        return Err(CoerceError::OutOfRange);
    }
    whole.to_i64().ok_or(CoerceError::OutOfRange)
}

fn parse_prefix(text: &str) -> Option<BigDecimal> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in cleaned.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    let number = cleaned[..end].trim_end_matches('.');
    BigDecimal::from_str(number).ok()
}
