//! # Amount Formatting
//!
//! Pure functions between what the cashier types and integer pesos.
//!
//! ```text
//! keystrokes "12a345"  ──► format_amount_input ──► { value: 12345, display: "12,345" }
//! field text "$ 12,345" ──► parse_formatted_amount ──► Money(12345)
//! ```
//!
//! No function here touches an input element; callers write `display` back
//! into the field themselves.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Largest amount an input field can hold. Longer entries saturate here.
pub const MAX_INPUT_VALUE: i64 = 999_999_999_999_999;

/// Result of formatting a raw amount field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormattedAmount {
    /// Integer value in pesos.
    pub value: i64,
    /// Thousands-separated text to show in the field (empty when no digits).
    pub display: String,
}

/// Keeps only the digits of `raw` and re-renders them with `,` separators.
///
/// ```rust
/// use drogueria_core::format::format_amount_input;
///
/// let f = format_amount_input("12a345");
/// assert_eq!(f.value, 12345);
/// assert_eq!(f.display, "12,345");
///
/// let empty = format_amount_input("abc");
/// assert_eq!(empty.value, 0);
/// assert_eq!(empty.display, "");
/// ```
pub fn format_amount_input(raw: &str) -> FormattedAmount {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let significant = digits.trim_start_matches('0');

    if digits.is_empty() {
        return FormattedAmount {
            value: 0,
            display: String::new(),
        };
    }

    let value = saturating_digits(significant);

    FormattedAmount {
        value,
        display: group_thousands(value as u64),
    }
}

/// Reads a run of ASCII digits, saturating at [`MAX_INPUT_VALUE`].
fn saturating_digits(digits: &str) -> i64 {
    digits
        .bytes()
        .try_fold(0i64, |acc, b| {
            let next = acc * 10 + i64::from(b - b'0');
            (next <= MAX_INPUT_VALUE).then_some(next)
        })
        .unwrap_or(MAX_INPUT_VALUE)
}

/// Parses a previously formatted amount back to pesos.
///
/// Strips `$`, `,` and whitespace, then reads the leading integer (an
/// optional sign followed by digits). Anything else yields zero.
///
/// ```rust
/// use drogueria_core::format::parse_formatted_amount;
///
/// assert_eq!(parse_formatted_amount("$ 12,345").pesos(), 12345);
/// assert_eq!(parse_formatted_amount("1,500.75").pesos(), 1500);
/// assert_eq!(parse_formatted_amount("").pesos(), 0);
/// assert_eq!(parse_formatted_amount("abc").pesos(), 0);
/// ```
pub fn parse_formatted_amount(raw: &str) -> Money {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    let (negative, rest) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Money::zero();
    }

    let value = saturating_digits(&digits);
    Money::from_pesos(if negative { -value } else { value })
}

/// Renders `n` with `,` every three digits.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_strips_everything_but_digits() {
        let f = format_amount_input("$ 1.234.567");
        assert_eq!(f.value, 1_234_567);
        assert_eq!(f.display, "1,234,567");
    }

    #[test]
    fn test_format_leading_zeros() {
        let f = format_amount_input("0005000");
        assert_eq!(f.value, 5_000);
        assert_eq!(f.display, "5,000");

        let zero = format_amount_input("000");
        assert_eq!(zero.value, 0);
        assert_eq!(zero.display, "0");
    }

    #[test]
    fn test_format_caps_runaway_input() {
        let f = format_amount_input(&"9".repeat(40));
        assert_eq!(f.value, MAX_INPUT_VALUE);
    }

    #[test]
    fn test_sixteen_digits_saturate_instead_of_truncating() {
        let f = format_amount_input("1234567890123456");
        assert_eq!(f.value, MAX_INPUT_VALUE);
        assert_eq!(f.display, "999,999,999,999,999");

        let f = format_amount_input("123456789012345");
        assert_eq!(f.value, 123_456_789_012_345);

        assert_eq!(parse_formatted_amount("1234567890123456").pesos(), MAX_INPUT_VALUE);
        assert_eq!(parse_formatted_amount("-99999999999999999999").pesos(), -MAX_INPUT_VALUE);
    }

    #[test]
    fn test_parse_formatted_amount() {
        assert_eq!(parse_formatted_amount("25,000").pesos(), 25_000);
        assert_eq!(parse_formatted_amount(" $30,000 ").pesos(), 30_000);
        assert_eq!(parse_formatted_amount("-5,000").pesos(), -5_000);
        assert_eq!(parse_formatted_amount("12abc").pesos(), 12);
        assert_eq!(parse_formatted_amount("--5").pesos(), 0);
    }

    #[test]
    fn test_format_then_parse_agree() {
        let f = format_amount_input("7500");
        assert_eq!(parse_formatted_amount(&f.display).pesos(), f.value);
    }
}
