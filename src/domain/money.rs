use std::fmt;

use serde::Serializer;
use serde_json::Value;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For INR, 1 rupee = 100 paise, so ₹50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a human-readable amount.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000, "-3.999" -> -399
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    parse_decimal(input, Rounding::Truncate)
}

/// Read an amount from a JSON value. The ledger service reports amounts either as
/// numbers (`950`, `950.5`, `1e-7`) or as decimal strings (`"950.50"`).
///
/// Amounts are rounded to the nearest cent, except that a non-zero amount never
/// rounds to zero: `0.004` reads as 1 cent and `-0.004` as -1 cent, so its sign
/// survives.
pub fn cents_from_json(value: &Value) -> Result<Cents, ParseCentsError> {
    match value {
        Value::Number(n) => {
            if let Some(units) = n.as_i64() {
                units.checked_mul(100).ok_or(ParseCentsError::Overflow)
            } else if n.is_u64() {
                Err(ParseCentsError::Overflow)
            } else {
                n.as_f64()
                    .ok_or(ParseCentsError::InvalidFormat)
                    .and_then(cents_from_f64)
            }
        }
        Value::String(s) => match parse_decimal(s, Rounding::Nearest) {
            Err(ParseCentsError::InvalidFormat) if s.contains(['e', 'E']) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseCentsError::InvalidFormat)
                .and_then(cents_from_f64),
            parsed => parsed,
        },
        _ => Err(ParseCentsError::NotAnAmount),
    }
}

fn cents_from_f64(units: f64) -> Result<Cents, ParseCentsError> {
    if !units.is_finite() {
        return Err(ParseCentsError::InvalidFormat);
    }
    let scaled = (units * 100.0).round();
    // i64::MAX as f64 rounds up to 2^63, which no longer fits
    if scaled.abs() >= i64::MAX as f64 {
        return Err(ParseCentsError::Overflow);
    }
    let cents = scaled as Cents;
    if cents == 0 && units != 0.0 {
        return Ok(if units > 0.0 { 1 } else { -1 });
    }
    Ok(cents)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    Truncate,
    Nearest,
}

fn parse_decimal(input: &str, rounding: Rounding) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, fraction_str) = digits.split_once('.').unwrap_or((digits, ""));
    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(units_str) || !all_digits(fraction_str) {
        return Err(ParseCentsError::InvalidFormat);
    }

    // Only digits remain, so a failed parse means the value does not fit.
    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::Overflow)?
    };

    // Pad or cut the fraction to two digits
    let fraction_digits = fraction_str.as_bytes();
    let digit = |i: usize| fraction_digits.get(i).map_or(0, |b| i64::from(b - b'0'));
    let fraction = digit(0) * 10 + digit(1);

    let mut cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or(ParseCentsError::Overflow)?;

    if rounding == Rounding::Nearest {
        if digit(2) >= 5 {
            cents = cents.checked_add(1).ok_or(ParseCentsError::Overflow)?;
        }
        let beyond_cents = fraction_digits.iter().skip(2).any(|b| *b != b'0');
        if cents == 0 && beyond_cents {
            cents = 1;
        }
    }

    Ok(if negative { -cents } else { cents })
}

/// Serialize cents as whole currency units: an integer when there is no
/// fractional part, a decimal otherwise.
pub fn serialize_units<S>(cents: &Cents, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if cents % 100 == 0 {
        serializer.serialize_i64(cents / 100)
    } else {
        serializer.serialize_f64(*cents as f64 / 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    Overflow,
    NotAnAmount,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::Overflow => write!(f, "amount out of range"),
            ParseCentsError::NotAnAmount => write!(f, "expected a number or a numeric string"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
