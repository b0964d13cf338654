//! Case, accent, whitespace and punctuation canonicalization.
//!
//! Two canonical forms are exposed:
//! - [`normalize_light`] keeps punctuation and is used for literal substring
//!   searches such as supplier detection.
//! - [`normalize_full`] also drops ASCII punctuation and is used to compare
//!   table header tokens.
//!
//! [`clean_line`] is a separate, case-preserving cleanup applied to every line
//! before profile regexes are run against it.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Lowercase, strip diacritics and collapse whitespace.
///
/// `normalize_light("  Électricité\tGénérale ")` yields `"electricite generale"`.
pub fn normalize_light(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        // compatibility decompositions may reintroduce capitals (e.g. "㎁")
        .to_lowercase();

    collapse_whitespace(&folded)
}

/// [`normalize_light`] followed by removal of ASCII punctuation.
pub fn normalize_full(text: &str) -> String {
    let light = normalize_light(text);
    let stripped: String = light.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    collapse_whitespace(&stripped)
}

/// Collapse whitespace (including no-break spaces) to single spaces and trim.
///
/// Case and accents are preserved so that profile regexes keep their meaning.
pub fn clean_line(line: &str) -> String {
    collapse_whitespace(&line.replace('\u{00a0}', " "))
}

/// Split page text into non-empty trimmed lines.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Tokens of an expected table header, in [`normalize_full`] form.
///
/// `"Pos. Code Désignation"` becomes `["pos", "code", "designation"]`.
pub fn header_tokens(header: &str) -> Vec<String> {
    normalize_full(header)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}
