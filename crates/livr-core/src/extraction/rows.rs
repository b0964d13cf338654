//! Item reconstruction from table grids.
//!
//! Wrapped rows are absorbed by buffering: a row that does not match the item
//! regex is kept and prefixed to the next row until the joined text matches.
//! A row that does not match on its own and whose leading words are the
//! expected header, word for word, is a repeated header: it is skipped and
//! clears the buffer.

use regex::Regex;
use tracing::{debug, trace};

use crate::extraction::strategies::named_fields;
use crate::models::delivery::{FieldValue, Item, Table};
use crate::profile::GridRules;
use crate::text::{clean_line, header_tokens, normalize_full};

/// Join a row's cells into one line, dropping placeholder `nan` cells.
pub fn clean_row(cells: &[String]) -> String {
    let joined = cells
        .iter()
        .flat_map(|c| c.split_whitespace())
        .filter(|token| !matches!(*token, "nan" | "NaN"))
        .collect::<Vec<_>>()
        .join(" ");
    clean_line(&joined)
}

/// Rebuild items from the rows of one table.
pub fn extract_table(table: &Table, rules: &GridRules) -> Vec<Item> {
    let tokens = header_tokens(&rules.header);
    let mut items = Vec::new();
    let mut buffer = String::new();

    for row in &table.rows {
        let row = clean_row(row);
        if row.is_empty() {
            continue;
        }
        if is_header_row(&row, &tokens, rules) {
            if !buffer.is_empty() {
                debug!("Dropping unmatched rows before header: {}", buffer);
                buffer.clear();
            }
            continue;
        }

        let candidate = if buffer.is_empty() {
            row
        } else {
            format!("{buffer} {row}")
        };

        match match_item(&candidate, rules) {
            Some(item) => {
                trace!("Row item: {}", candidate);
                items.push(item);
                buffer.clear();
            }
            None => buffer = candidate,
        }
    }

    if !buffer.is_empty() {
        match match_item(&buffer, rules) {
            Some(item) => items.push(item),
            None => debug!("Dropping unmatched rows at end of table: {}", buffer),
        }
    }

    items
}

/// Rebuild items from every table, in table order.
pub fn extract_tables<'a>(tables: impl IntoIterator<Item = &'a Table>, rules: &GridRules) -> Vec<Item> {
    tables
        .into_iter()
        .flat_map(|t| extract_table(t, rules))
        .collect()
}

fn is_header_row(row: &str, tokens: &[String], rules: &GridRules) -> bool {
    if tokens.is_empty() || rules.item.is_match(row) {
        return false;
    }
    let row = normalize_full(row);
    let mut words = row.split_whitespace();
    tokens.iter().all(|t| words.next() == Some(t.as_str()))
}

fn match_item(candidate: &str, rules: &GridRules) -> Option<Item> {
    let caps = rules.item.captures(candidate)?;
    let mut item = Item {
        fields: named_fields(&rules.item, &caps),
        order_ref: None,
    };
    if let Some(pattern) = &rules.code_in_description {
        recover_code(&mut item, pattern);
    }
    Some(item)
}

/// Fill a blank `code` from the description text.
fn recover_code(item: &mut Item, pattern: &Regex) {
    if !item.get("code").is_none_or(FieldValue::is_blank) {
        return;
    }
    let Some(description) = item.text("description") else {
        return;
    };
    let Some(caps) = pattern.captures(description) else {
        return;
    };

    let code = caps
        .name("code")
        .or_else(|| caps.get(1))
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().to_string());
    if let Some(code) = code {
        trace!("Recovered code '{}' from description", code);
        item.set("code", FieldValue::Text(code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules(code_in_description: Option<&str>) -> GridRules {
        GridRules {
            item: Regex::new(
                r"^(?:(?P<code>[A-Z]{2}\d{3})?\s*(?P<description>.+?)\s+(?P<quantity>\d+)\s+PCS$)",
            )
            .unwrap(),
            header: "Code Description Qty".to_string(),
            fixed_flavor: None,
            preferred_flavors: Vec::new(),
            code_in_description: code_in_description.map(|p| Regex::new(p).unwrap()),
        }
    }

    fn table(rows: &[&[&str]]) -> Table {
        Table::new(
            1,
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_clean_row_drops_nan() {
        let row = vec!["AB123".to_string(), "nan".to_string(), " Cable  ".to_string(), "NaN".to_string()];
        assert_eq!(clean_row(&row), "AB123 Cable");
    }

    #[test]
    fn test_single_row_items() {
        let items = extract_table(
            &table(&[&["AB123", "Cable", "4 PCS"], &["AB124", "Plug", "2 PCS"]]),
            &rules(None),
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].text("code"), Some("AB124"));
    }

    #[test]
    fn test_wrapped_row_is_buffered() {
        let items = extract_table(
            &table(&[&["AB123", "Cable very", "nan"], &["nan", "long name", "4 PCS"]]),
            &rules(None),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text("description"), Some("Cable very long name"));
    }

    #[test]
    fn test_unmatched_remainder_is_dropped() {
        let items = extract_table(
            &table(&[&["AB123", "Cable", "4 PCS"], &["Total", "", ""]]),
            &rules(None),
        );
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_code_recovered_from_description() {
        let items = extract_table(
            &table(&[&["", "Breaker ref XY789 16A", "1 PCS"]]),
            &rules(Some(r"ref (?P<code>[A-Z]{2}\d{3})")),
        );
        assert_eq!(items[0].text("code"), Some("XY789"));
    }

    #[test]
    fn test_existing_code_is_kept() {
        let items = extract_table(
            &table(&[&["AB123", "Breaker ref XY789", "1 PCS"]]),
            &rules(Some(r"ref ([A-Z]{2}\d{3})")),
        );
        assert_eq!(items[0].text("code"), Some("AB123"));
    }

    #[test]
    fn test_header_row_is_skipped() {
        let items = extract_table(
            &table(&[&["Code", "Description", "Qty"], &["AB123", "Cable", "4 PCS"]]),
            &rules(None),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text("code"), Some("AB123"));
    }

    #[test]
    fn test_repeated_header_clears_buffer() {
        let items = extract_table(
            &table(&[
                &["Carried over"],
                &["Code", "Description", "Qty"],
                &["AB124", "Plug", "2 PCS"],
            ]),
            &rules(None),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text("description"), Some("Plug"));
    }

    #[test]
    fn test_item_containing_header_words_is_kept() {
        let grid = GridRules {
            item: Regex::new(r"^(?:(?P<code>[A-Z]\d{3})\s+(?P<description>.+?)\s+(?P<quantity>\d+)$)")
                .unwrap(),
            header: "Pos Code".to_string(),
            ..rules(None)
        };
        let items = extract_table(
            &table(&[
                &["Pos", "Code"],
                &["A100", "Cable", "2"],
                &["A101", "Position decoder", "4"],
            ]),
            &grid,
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].text("description"), Some("Position decoder"));
    }

    #[test]
    fn test_header_words_out_of_order_are_not_a_header() {
        let items = extract_table(
            &table(&[&["Qty", "Code", "Description"], &["AB123", "Cable", "4 PCS"]]),
            &rules(None),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text("description"), Some("Qty Code Description AB123 Cable"));
    }

    #[test]
    fn test_items_across_tables() {
        let first = table(&[&["AB123", "Cable", "4 PCS"]]);
        let second = table(&[&["AB124", "Plug", "2 PCS"]]);
        let items = extract_tables([&first, &second], &rules(None));
        assert_eq!(items.len(), 2);
    }
}
