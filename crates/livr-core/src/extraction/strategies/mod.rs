//! Line-stream item strategies.

pub mod multi_block;
pub mod multiline;
pub mod single_line;

use indexmap::IndexMap;
use regex::{Captures, Regex};

use crate::models::delivery::{FieldValue, Item, OrderGroup};

/// Items produced by a strategy.
#[derive(Debug, Clone, Default)]
pub struct StrategyOutput {
    /// Items in document order.
    pub items: Vec<Item>,
    /// Order groups, for header-keyed layouts.
    pub orders: Option<Vec<OrderGroup>>,
}

impl StrategyOutput {
    pub fn items(items: Vec<Item>) -> Self {
        Self { items, orders: None }
    }
}

/// Named groups of a match, in pattern order. Non-participating groups are null.
pub(crate) fn named_fields(regex: &Regex, caps: &Captures<'_>) -> IndexMap<String, FieldValue> {
    regex
        .capture_names()
        .flatten()
        .map(|name| {
            let value = FieldValue::from_capture(caps.name(name).map(|m| m.as_str()));
            (name.to_string(), value)
        })
        .collect()
}

/// Captures of a header line.
///
/// Named groups are used when the pattern has any, otherwise positional
/// groups keyed by their index.
pub(crate) fn header_fields(regex: &Regex, caps: &Captures<'_>) -> IndexMap<String, FieldValue> {
    if regex.capture_names().flatten().next().is_some() {
        return named_fields(regex, caps);
    }

    (1..caps.len())
        .map(|i| {
            let value = FieldValue::from_capture(caps.get(i).map(|m| m.as_str()));
            (i.to_string(), value)
        })
        .collect()
}
