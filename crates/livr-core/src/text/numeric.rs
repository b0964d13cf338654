//! Lenient parsing of locale-formatted quantities.
//!
//! None of these functions fail: unparseable input yields `0` / `0.0`.
//! Profiles routinely declare fields that are absent or blank on some
//! documents, and callers rely on getting a zero instead of an error.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Dot-grouped thousands with no decimal part: "2.000", "12.500.000".
    static ref DOT_GROUPED: Regex = Regex::new(r"^-?\d{1,3}(?:\.\d{3})+$").unwrap();
}

/// Parse a quantity into an integer, truncating toward zero.
///
/// Heuristic, not a guarantee: a value that is purely dot-grouped thousands
/// is read as an integer (`"2.000"` → 2000); otherwise the comma is taken as
/// a decimal separator, and if several dots remain they are all treated as
/// thousands separators.
pub fn to_integer(raw: &str) -> i64 {
    let compact = strip_spaces(raw);
    if compact.is_empty() {
        return 0;
    }

    let mut s = if DOT_GROUPED.is_match(&compact) {
        compact.replace('.', "")
    } else {
        compact.replace(',', ".")
    };

    if s.matches('.').count() > 1 {
        s = s.replace('.', "");
    }

    match s.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

/// Parse a European-formatted decimal (`"1.234,56"` → 1234.56).
///
/// Dots are thousands separators and a single comma is the decimal separator.
pub fn to_float(raw: &str) -> f64 {
    let s = strip_spaces(raw).replace('.', "").replace(',', ".");
    parse_finite(&s)
}

/// Parse a number whose decimal separator is whichever of `,`/`.` comes last.
///
/// `"1 234,56"`, `"1,234.56"` and `"1234.56"` all yield 1234.56.
pub fn to_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    parse_finite(&normalized)
}

fn strip_spaces(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00a0}' | '\u{202f}'))
        .collect()
}

fn parse_finite(s: &str) -> f64 {
    match s.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}
