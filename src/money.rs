//! Money amounts as they arrive from users and settings files, and the single
//! coercion path every calculation goes through.

use crate::country::Country;
use rust_decimal::{Decimal, RoundingStrategy};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency markers stripped from the front of typed amounts. Longest first.
const CURRENCY_MARKERS: &[&str] = &["HK$", "$", "¥", "£", "€"];

/// An amount exactly as it was entered: missing, a number, free text, or some
/// other JSON value. Kept untyped so settings and history preserve what the
/// user typed; use [`coerce_money`] before doing arithmetic.
///
/// JSON strings always read back as `Text`, so a value written and read again
/// serializes to the same bytes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum RawAmount {
    #[default]
    Blank,
    Number(#[schemars(with = "f64")] Decimal),
    Text(String),
    Other(serde_json::Value),
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => RawAmount::Blank,
            serde_json::Value::String(text) => RawAmount::Text(text),
            serde_json::Value::Number(number) => match to_decimal(&number.to_string()) {
                Some(value) => RawAmount::Number(value),
                None => RawAmount::Other(serde_json::Value::Number(number)),
            },
            other => RawAmount::Other(other),
        })
    }
}

impl From<&str> for RawAmount {
    fn from(text: &str) -> Self {
        RawAmount::Text(text.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(text: String) -> Self {
        RawAmount::Text(text)
    }
}

impl From<Decimal> for RawAmount {
    fn from(value: Decimal) -> Self {
        RawAmount::Number(value)
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAmount::Blank => Ok(()),
            RawAmount::Number(value) => write!(f, "{}", value),
            RawAmount::Text(text) => write!(f, "{}", text),
            RawAmount::Other(value) => write!(f, "{}", value),
        }
    }
}

/// How a [`RawAmount`] turned into a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coerced {
    /// Nothing was entered.
    Blank,
    /// A usable non-negative amount.
    Value(Decimal),
    /// A negative amount, which counts as zero. Holds the value as entered.
    Clamped(Decimal),
    /// Input that holds no leading number. Holds the input as text.
    Unparsable(String),
}

impl Coerced {
    /// The amount that participates in arithmetic.
    pub fn amount(&self) -> Decimal {
        match self {
            Coerced::Value(value) => *value,
            Coerced::Blank | Coerced::Clamped(_) | Coerced::Unparsable(_) => Decimal::ZERO,
        }
    }
}

/// Classify a raw amount without discarding why it may have become zero.
pub fn parse_amount(raw: &RawAmount) -> Coerced {
    let parsed = match raw {
        RawAmount::Blank => return Coerced::Blank,
        RawAmount::Number(value) => *value,
        RawAmount::Text(text) if text.trim().is_empty() => return Coerced::Blank,
        RawAmount::Text(text) => match parse_text(text) {
            Some(value) => value,
            None => return Coerced::Unparsable(text.clone()),
        },
        RawAmount::Other(value) => return Coerced::Unparsable(value.to_string()),
    };

    if parsed.is_sign_negative() && !parsed.is_zero() {
        Coerced::Clamped(parsed)
    } else {
        Coerced::Value(parsed)
    }
}

/// Coerce any raw amount to a non-negative number. Blank, unparsable and
/// negative input all count as zero; this never fails.
pub fn coerce_money(raw: &RawAmount) -> Decimal {
    let coerced = parse_amount(raw);
    match &coerced {
        Coerced::Clamped(value) => log::warn!("negative amount {} counted as 0", value),
        Coerced::Unparsable(text) => log::debug!("unparsable amount {:?} counted as 0", text),
        Coerced::Blank | Coerced::Value(_) => {}
    }
    coerced.amount()
}

/// Multiply two amounts, saturating instead of overflowing.
pub fn mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or(Decimal::MAX)
}

/// Add two amounts, saturating instead of overflowing.
pub fn add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}

fn parse_text(text: &str) -> Option<Decimal> {
    let (sign, rest) = split_sign(text.trim());
    let rest = CURRENCY_MARKERS
        .iter()
        .find_map(|marker| rest.strip_prefix(marker))
        .unwrap_or(rest);
    // "HK$-500" carries its sign after the marker
    let (sign, rest) = match sign {
        Some(_) => (sign, rest),
        None => split_sign(rest),
    };

    let cleaned: String = rest
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let value = to_decimal(&numeric_prefix(&cleaned)?)?;
    Some(if sign == Some('-') { -value } else { value })
}

fn split_sign(text: &str) -> (Option<char>, &str) {
    match text.chars().next() {
        Some(sign @ ('-' | '+')) => (Some(sign), &text[1..]),
        _ => (None, text),
    }
}

/// Parse a plain or scientific decimal. Magnitudes past what `Decimal` holds
/// saturate to `Decimal::MAX` (or `MIN`); ones below its precision become zero.
fn to_decimal(number: &str) -> Option<Decimal> {
    let parsed = if number.contains(['e', 'E']) {
        Decimal::from_scientific(number)
    } else {
        Decimal::from_str(number)
    };
    if let Ok(value) = parsed {
        return Some(value);
    }

    let (sign, unsigned) = split_sign(number);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, saturating_exponent(exponent)?),
        None => (unsigned, 0),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    if !int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let int = int.trim_start_matches('0');
    let magnitude = if !int.is_empty() {
        int.len() as i64 - 1
    } else {
        match frac.find(|c| c != '0') {
            Some(zeros) => -(zeros as i64) - 1,
            None => return Some(Decimal::ZERO),
        }
    };

    if magnitude.saturating_add(exponent) < 28 {
        Some(Decimal::ZERO)
    } else if sign == Some('-') {
        Some(Decimal::MIN)
    } else {
        Some(Decimal::MAX)
    }
}

fn saturating_exponent(exponent: &str) -> Option<i64> {
    let (sign, digits) = split_sign(exponent);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let negative = sign == Some('-');
    Some(match digits.parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    })
}

/// The longest leading `digits[.digits][e[+-]digits]` run, the way a browser's
/// `parseFloat` reads it. A bare leading `.` gets a `0` prepended.
fn numeric_prefix(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let int_end = digits_from(0);
    let mut end = int_end;
    let mut digit_count = int_end;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            digit_count += frac_end - end - 1;
            end = frac_end;
        }
    }
    if digit_count == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_start = end + 1;
        if exp_start < bytes.len() && matches!(bytes[exp_start], b'+' | b'-') {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    let number = &s[..end];
    Some(if number.starts_with('.') {
        format!("0{}", number)
    } else {
        number.to_string()
    })
}

/// Whole Hong Kong dollars with thousands separators, e.g. `HK$79,500`.
pub fn format_hkd(amount: Decimal) -> String {
    format!("HK${}", group_thousands(amount))
}

/// Whole units of a country's currency, e.g. `¥1,500,000`.
pub fn format_foreign(amount: Decimal, country: Country) -> String {
    format!("{}{}", country.symbol(), group_thousands(amount))
}

fn group_thousands(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
