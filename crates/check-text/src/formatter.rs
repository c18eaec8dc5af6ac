//! French amount and date formatting for check fields

use crate::{CheckTextError, Result};
use chrono::NaiveDate;

/// Format an amount string with a space every three integer digits
///
/// Existing whitespace is removed first. The decimal part (after the first
/// `.`) is kept verbatim.
///
/// # Examples
/// ```
/// use check_text::format_amount_with_spaces;
/// assert_eq!(format_amount_with_spaces("10000"), "10 000");
/// assert_eq!(format_amount_with_spaces("1 2345.50"), "12 345.50");
/// ```
pub fn format_amount_with_spaces(value: &str) -> String {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let (integer_part, decimal_part) = match cleaned.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (cleaned.as_str(), None),
    };

    let grouped = group_digits(integer_part, ' ');
    match decimal_part {
        Some(dec) => format!("{grouped}.{dec}"),
        None => grouped,
    }
}

/// Parse a user-typed amount, ignoring whitespace
///
/// Returns `None` when the value is not a number or is not positive.
pub fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let amount: f64 = cleaned.parse().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Format a date as `dd/mm/yyyy`
pub fn format_date_fr(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Format an ISO `yyyy-mm-dd` date string as `dd/mm/yyyy`
///
/// An empty input yields an empty string, like an unset form field.
pub fn format_iso_date_fr(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CheckTextError::InvalidDate(value.to_string()))?;
    Ok(format_date_fr(date))
}

/// Insert `sep` between groups of three digits, counting from the right
///
/// Non-digit characters (sign, stray letters) are left where they are.
fn group_digits(digits: &str, sep: char) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let digit_count = chars.iter().filter(|c| c.is_ascii_digit()).count();
    let mut result = String::with_capacity(chars.len() + digit_count / 3);
    let mut seen = 0;

    for c in chars {
        if c.is_ascii_digit() {
            let remaining = digit_count - seen;
            if seen > 0 && remaining % 3 == 0 {
                result.push(sep);
            }
            seen += 1;
        }
        result.push(c);
    }

    result
}
