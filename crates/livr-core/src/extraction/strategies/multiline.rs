//! Items printed over several lines.
//!
//! A start line opens an item and carries its code and quantity. The
//! description is either inline on the start line or found by looking ahead a
//! few lines. Order references printed on separate header lines are attached
//! to the nearest item, looking forward first.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use super::{header_fields, StrategyOutput};
use crate::models::delivery::{FieldValue, Item, OrderGroup};
use crate::profile::MultilineRules;
use crate::text::clean_line;

/// Lines after an item in which a following header still belongs to it.
pub const ORDER_WINDOW: usize = 10;

/// A header line and its first non-empty capture.
#[derive(Debug, Clone)]
struct HeaderMark {
    line: usize,
    reference: Option<(String, String)>,
}

struct Start<'t> {
    line: usize,
    caps: Captures<'t>,
}

/// Extract multi-line items from a line stream.
pub fn extract(lines: &[String], rules: &MultilineRules, header: Option<&Regex>) -> StrategyOutput {
    let cleaned: Vec<String> = lines.iter().map(|l| clean_line(l)).collect();

    let mut starts = Vec::new();
    let mut headers = Vec::new();
    for (i, line) in cleaned.iter().enumerate() {
        if let Some(caps) = rules.start.captures(line) {
            trace!("Item start at line {}: {}", i, line);
            starts.push(Start { line: i, caps });
        }
        if let Some(header) = header {
            if let Some(caps) = header.captures(line) {
                let reference = header_fields(header, &caps)
                    .into_iter()
                    .find_map(|(name, value)| match value {
                        FieldValue::Text(v) if !v.is_empty() => Some((name, v)),
                        _ => None,
                    });
                trace!("Header at line {}: {:?}", i, reference);
                headers.push(HeaderMark { line: i, reference });
            }
        }
    }

    let mut items = Vec::with_capacity(starts.len());
    let mut refs: Vec<Option<&(String, String)>> = Vec::with_capacity(starts.len());
    for start in &starts {
        let mark = nearest_header(&headers, start.line);
        let reference = mark.and_then(|m| m.reference.as_ref());

        let mut fields = IndexMap::new();
        fields.insert("code".to_string(), group(&start.caps, &rules.code_group));
        fields.insert("quantity".to_string(), group(&start.caps, &rules.quantity_group));
        fields.insert(
            "description".to_string(),
            FieldValue::from_capture(find_description(&cleaned, start, rules).as_deref()),
        );

        items.push(Item {
            fields,
            order_ref: reference.map(|(_, v)| v.clone()),
        });
        refs.push(reference);
    }

    let orders = header.map(|_| group_by_order(&items, &refs));
    debug!(
        "Multiline strategy: {} items, {} header lines",
        items.len(),
        headers.len()
    );

    StrategyOutput { items, orders }
}

fn group(caps: &Captures<'_>, name: &str) -> FieldValue {
    FieldValue::from_capture(caps.name(name).map(|m| m.as_str()))
}

/// First header within the forward window, else the closest one at or before
/// the item line.
fn nearest_header(headers: &[HeaderMark], line: usize) -> Option<&HeaderMark> {
    let after = headers.partition_point(|h| h.line <= line);

    if let Some(next) = headers.get(after) {
        if next.line <= line + ORDER_WINDOW {
            return Some(next);
        }
    }

    after.checked_sub(1).and_then(|i| headers.get(i))
}

fn find_description(lines: &[String], start: &Start<'_>, rules: &MultilineRules) -> Option<String> {
    let inline = start
        .caps
        .name(&rules.inline_description_group)
        .or_else(|| {
            (rules.max_lookahead == 0)
                .then(|| start.caps.name(&rules.description_group))
                .flatten()
        })
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty());
    if let Some(inline) = inline {
        return Some(inline.to_string());
    }

    let pattern = rules.description.as_ref()?;
    let window = lines.iter().skip(start.line + 1).take(rules.max_lookahead);

    for line in window {
        if rules.start.is_match(line) || rules.is_boundary(line) {
            break;
        }
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let text = caps
            .name(&rules.description_group)
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if !text.is_empty() && !rules.is_boundary(text) {
            return Some(text.to_string());
        }
    }

    None
}

fn group_by_order(items: &[Item], refs: &[Option<&(String, String)>]) -> Vec<OrderGroup> {
    let mut groups: IndexMap<&str, OrderGroup> = IndexMap::new();

    for (item, reference) in items.iter().zip(refs) {
        let Some((name, value)) = reference else {
            continue;
        };
        groups
            .entry(value.as_str())
            .or_insert_with(|| OrderGroup {
                header: IndexMap::from([(name.clone(), FieldValue::Text(value.clone()))]),
                items: Vec::new(),
            })
            .items
            .push(item.clone());
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn anchored(pattern: &str) -> Regex {
        Regex::new(&format!("^(?:{pattern})")).unwrap()
    }

    fn rules(max_lookahead: usize) -> MultilineRules {
        MultilineRules {
            start: anchored(r"(?P<item>\d{6})\s+(?P<qty>\d+)(?:\s+(?P<description_inline>.+))?$"),
            description: Some(anchored(r"Desc:\s*(?P<desc>.*)")),
            max_lookahead,
            code_group: "item".to_string(),
            quantity_group: "qty".to_string(),
            description_group: "desc".to_string(),
            inline_description_group: "description_inline".to_string(),
            boundary_markers: vec!["Subtotal".to_string()],
        }
    }

    fn header() -> Regex {
        Regex::new(r"Your order no\. (?P<order>\S+)").unwrap()
    }

    #[test]
    fn test_description_found_by_lookahead() {
        let output = extract(
            &lines(&["100200 4", "some noise", "Desc: Cable 3x2.5"]),
            &rules(5),
            None,
        );

        assert_eq!(output.items.len(), 1);
        let item = &output.items[0];
        assert_eq!(item.text("code"), Some("100200"));
        assert_eq!(item.text("quantity"), Some("4"));
        assert_eq!(item.text("description"), Some("Cable 3x2.5"));
        assert!(output.orders.is_none());
    }

    #[test]
    fn test_new_start_blocks_description() {
        let output = extract(
            &lines(&["100200 4", "100300 1", "Desc: Switch"]),
            &rules(5),
            None,
        );

        assert_eq!(output.items[0].get("description"), Some(&FieldValue::Null));
        assert_eq!(output.items[1].text("description"), Some("Switch"));
    }

    #[test]
    fn test_boundary_blocks_description() {
        let output = extract(
            &lines(&["100200 4", "Subtotal 12,00", "Desc: Late"]),
            &rules(5),
            None,
        );
        assert_eq!(output.items[0].get("description"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_lookahead_is_bounded() {
        let output = extract(
            &lines(&["100200 4", "a", "b", "Desc: Too far"]),
            &rules(2),
            None,
        );
        assert_eq!(output.items[0].get("description"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_empty_description_keeps_scanning() {
        let output = extract(
            &lines(&["100200 4", "Desc:", "Desc: Relay"]),
            &rules(5),
            None,
        );
        assert_eq!(output.items[0].text("description"), Some("Relay"));
    }

    #[test]
    fn test_inline_description_skips_lookahead() {
        let output = extract(
            &lines(&["100200 4 Breaker 16A", "Desc: Other"]),
            &rules(5),
            None,
        );
        assert_eq!(output.items[0].text("description"), Some("Breaker 16A"));
    }

    #[test]
    fn test_forward_order_preferred_over_backward() {
        let output = extract(
            &lines(&[
                "Your order no. PO-OLD",
                "100200 4",
                "Desc: Cable",
                "x",
                "Your order no. PO-NEW",
            ]),
            &rules(5),
            Some(&header()),
        );
        assert_eq!(output.items[0].order_ref.as_deref(), Some("PO-NEW"));
    }

    #[test]
    fn test_backward_order_when_forward_window_empty() {
        let mut input = vec!["Your order no. PO-1".to_string(), "100200 4".to_string()];
        input.extend((0..ORDER_WINDOW).map(|i| format!("filler {i}")));
        input.push("Your order no. PO-2".to_string());

        let output = extract(&input, &rules(0), Some(&header()));
        assert_eq!(output.items[0].order_ref.as_deref(), Some("PO-1"));
    }

    #[test]
    fn test_no_header_leaves_order_unset() {
        let output = extract(&lines(&["100200 4"]), &rules(5), Some(&header()));
        assert_eq!(output.items[0].order_ref, None);
        assert_eq!(output.orders, Some(Vec::new()));
    }

    #[test]
    fn test_orders_grouped_by_reference() {
        let mut input = vec![
            "100200 4".to_string(),
            "100201 2".to_string(),
            "Your order no. PO-1".to_string(),
        ];
        input.extend((0..ORDER_WINDOW).map(|i| format!("filler {i}")));
        input.push("100300 1".to_string());
        input.push("Your order no. PO-2".to_string());

        let output = extract(&input, &rules(0), Some(&header()));

        let orders = output.orders.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].reference(), Some("PO-1"));
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[1].reference(), Some("PO-2"));
        assert_eq!(orders[1].items[0].text("code"), Some("100300"));
    }

    #[test]
    fn test_items_in_start_order() {
        let output = extract(&lines(&["100200 4", "100100 1", "100300 2"]), &rules(5), None);
        let codes: Vec<_> = output.items.iter().filter_map(|i| i.text("code")).collect();
        assert_eq!(codes, vec!["100200", "100100", "100300"]);
    }
}
