//! Price parsing and locale formatting
//!
//! The target sites print prices in the Turkish convention: `.` for
//! thousands grouping, `,` for decimals, trailing currency marker
//! (`54.999,00 TL`). Embedded payloads and structured data use plain
//! JSON numbers instead. Parsing accepts both conventions; formatting
//! always emits the site convention.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a price string in either separator convention
///
/// Returns None for strings with no parsable numeric value. Currency
/// markers and whitespace are ignored.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');

    let normalized = match (has_dot, has_comma) {
        (true, true) => {
            // The later separator is the decimal point
            let last_dot = cleaned.rfind('.').unwrap_or(0);
            let last_comma = cleaned.rfind(',').unwrap_or(0);
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (true, false) => {
            if is_grouped(&cleaned, '.') {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (false, true) => {
            if is_grouped(&cleaned, ',') {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (false, false) => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// True when `value` looks like grouped thousands with `sep`
/// (e.g. `54.999` or `1.234.567`)
fn is_grouped(value: &str, sep: char) -> bool {
    let digits = value.trim_start_matches('-');
    let mut groups = digits.split(sep);

    let first = match groups.next() {
        Some(g) => g,
        None => return false,
    };
    if first.is_empty() || first.len() > 3 {
        return false;
    }

    let mut saw_group = false;
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        saw_group = true;
    }
    saw_group
}

/// Extracts a price from a JSON value (number or string)
pub fn price_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => parse_price(&n.to_string()),
        serde_json::Value::String(s) => parse_price(s),
        _ => None,
    }
}

/// Formats a price in the site convention with the trailing currency marker
///
/// Two decimals, `.` grouping, `,` decimal separator: `54.999,00 TL`.
pub fn format_price(price: Decimal, currency_marker: &str) -> String {
    let mut rounded = price.round_dp(2);
    rounded.rescale(2);
    let plain = rounded.to_string();

    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };

    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    format!("{sign}{grouped},{frac_part} {currency_marker}")
}
