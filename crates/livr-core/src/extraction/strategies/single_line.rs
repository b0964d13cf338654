//! One item per line.

use regex::Regex;
use tracing::{debug, trace};

use super::named_fields;
use crate::models::delivery::Item;
use crate::text::clean_line;

/// Match every line against the anchored item regex.
///
/// Lines that do not match are skipped; boilerplate inside a block is
/// expected.
pub fn extract(lines: &[String], item: &Regex) -> Vec<Item> {
    let mut items = Vec::new();

    for line in lines {
        let line = clean_line(line);
        if let Some(caps) = item.captures(&line) {
            trace!("Item line: {}", line);
            items.push(Item {
                fields: named_fields(item, &caps),
                order_ref: None,
            });
        }
    }

    debug!("Single-line strategy: {} items from {} lines", items.len(), lines.len());
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::delivery::FieldValue;
    use pretty_assertions::assert_eq;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn anchored(pattern: &str) -> Regex {
        Regex::new(&format!("^(?:{pattern})")).unwrap()
    }

    #[test]
    fn test_matches_from_line_start() {
        let item = anchored(r"(?P<code>[A-Z]\d+)\s+(?P<qty>\d+)");
        let items = extract(&lines(&["A1 3", "ref A2 4", "B7 10"]), &item);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text("code"), Some("A1"));
        assert_eq!(items[1].text("qty"), Some("10"));
    }

    #[test]
    fn test_fields_in_pattern_order() {
        let item = anchored(r"(?P<qty>\d+)\s+(?P<code>\w+)");
        let items = extract(&lines(&["2 X"]), &item);
        let names: Vec<&str> = items[0].fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["qty", "code"]);
    }

    #[test]
    fn test_optional_group_is_null() {
        let item = anchored(r"(?P<code>\w+)(?:\s+(?P<unit>PCS))?$");
        let items = extract(&lines(&["A1"]), &item);
        assert_eq!(items[0].get("unit"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_line_is_cleaned_before_matching() {
        let item = anchored(r"(?P<code>\w+) (?P<qty>\d+)$");
        let items = extract(&lines(&["  A1 \u{a0}  7  "]), &item);
        assert_eq!(items[0].text("qty"), Some("7"));
    }
}
