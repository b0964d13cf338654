//! Document-level metadata: delivery date and purchase-order references.

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::models::delivery::DocumentMetadata;
use crate::profile::MetadataRules;

// two-digit years first: %Y also accepts short years
const DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y-%m-%d"];

/// Parse a printed date with the usual delivery-note formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Extract metadata from the document text.
pub fn extract(text: &str, rules: &MetadataRules) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::default();

    if let Some(pattern) = &rules.date {
        if let Some(raw) = pattern.captures(text).and_then(|c| first_capture(&c)) {
            metadata.date = parse_date(&raw);
            debug!("Document date: {} (parsed: {:?})", raw, metadata.date);
            metadata.date_document = Some(raw);
        }
    }

    if let Some(pattern) = &rules.order {
        metadata.purchase_orders = purchase_orders(text, pattern);
    }

    metadata
}

fn first_capture(caps: &regex::Captures<'_>) -> Option<String> {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn purchase_orders(text: &str, pattern: &Regex) -> Vec<String> {
    let mut orders: Vec<String> = Vec::new();
    for caps in pattern.captures_iter(text) {
        if let Some(order) = first_capture(&caps) {
            if !orders.contains(&order) {
                orders.push(order);
            }
        }
    }
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules(date: Option<&str>, order: Option<&str>) -> MetadataRules {
        MetadataRules {
            date: date.map(|p| Regex::new(p).unwrap()),
            order: order.map(|p| Regex::new(p).unwrap()),
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7);
        assert_eq!(parse_date("07/03/2024"), expected);
        assert_eq!(parse_date("07.03.2024"), expected);
        assert_eq!(parse_date("07-03-2024"), expected);
        assert_eq!(parse_date("2024-03-07"), expected);
        assert_eq!(parse_date("07/03/24"), expected);
        assert_eq!(parse_date("March 7"), None);
    }

    #[test]
    fn test_extract_date() {
        let metadata = extract(
            "Delivery note\nDate: 12.01.2025\n",
            &rules(Some(r"Date:\s*(\d{2}\.\d{2}\.\d{4})"), None),
        );
        assert_eq!(metadata.date_document.as_deref(), Some("12.01.2025"));
        assert_eq!(metadata.date, NaiveDate::from_ymd_opt(2025, 1, 12));
    }

    #[test]
    fn test_unparseable_date_kept_as_text() {
        let metadata = extract("Date: soon", &rules(Some(r"Date:\s*(\w+)"), None));
        assert_eq!(metadata.date_document.as_deref(), Some("soon"));
        assert_eq!(metadata.date, None);
    }

    #[test]
    fn test_purchase_orders_deduplicated() {
        let metadata = extract(
            "PO: 4500123\nPO: 4500999\nPO: 4500123",
            &rules(None, Some(r"PO:\s*(\d+)")),
        );
        assert_eq!(metadata.purchase_orders, vec!["4500123", "4500999"]);
    }

    #[test]
    fn test_no_rules_is_empty() {
        assert!(extract("anything", &MetadataRules::default()).is_empty());
    }
}
