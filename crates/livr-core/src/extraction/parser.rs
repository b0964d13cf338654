//! Delivery-note extraction pipeline.
//!
//! `read → resolve supplier → run the profile strategy → convert numeric
//! fields → document metadata`.

use tracing::{debug, info, warn};

use super::block::isolate_block;
use super::strategies::{multi_block, multiline, single_line, StrategyOutput};
use super::{layout, metadata, postprocess, rows};
use crate::error::Result;
use crate::models::config::ExtractionConfig;
use crate::models::delivery::{ExtractionResult, SourceDocument};
use crate::pdf::{PageSelection, PageTextProvider, TableGridProvider};
use crate::profile::{resolve, CompiledProfile, LineScope, ProfileSet, Resolution, Strategy};

/// Profile-driven item extractor.
pub struct DeliveryParser {
    profiles: ProfileSet,
    /// Table rows inspected for the expected header.
    header_rows: usize,
    /// Compare detection patterns in normalized form.
    normalize_detection: bool,
    /// Flavors tried when a profile names none.
    default_flavors: Vec<String>,
    /// Attach flavor diagnostics to grid results.
    include_layout_diagnostics: bool,
}

impl DeliveryParser {
    /// Create a parser with default settings.
    pub fn new(profiles: ProfileSet) -> Self {
        Self {
            profiles,
            header_rows: 6,
            normalize_detection: true,
            default_flavors: Vec::new(),
            include_layout_diagnostics: true,
        }
    }

    /// Create a parser from the extraction configuration.
    pub fn from_config(profiles: ProfileSet, config: &ExtractionConfig) -> Self {
        Self::new(profiles)
            .with_header_rows(config.header_rows)
            .with_normalized_detection(config.normalize_detection)
            .with_default_flavors(config.default_flavors.clone())
            .with_layout_diagnostics(config.include_layout_diagnostics)
    }

    /// Set the number of table rows searched for the header.
    pub fn with_header_rows(mut self, rows: usize) -> Self {
        self.header_rows = rows;
        self
    }

    /// Set detection normalization.
    pub fn with_normalized_detection(mut self, normalize: bool) -> Self {
        self.normalize_detection = normalize;
        self
    }

    /// Set the flavors tried when a profile names none.
    pub fn with_default_flavors(mut self, flavors: Vec<String>) -> Self {
        self.default_flavors = flavors;
        self
    }

    /// Set whether grid results carry flavor diagnostics.
    pub fn with_layout_diagnostics(mut self, include: bool) -> Self {
        self.include_layout_diagnostics = include;
        self
    }

    /// The compiled profiles.
    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    /// Detect the supplier of a document.
    pub fn detect(&self, document: &SourceDocument) -> Resolution<'_> {
        resolve(&document.lines, &self.profiles, self.normalize_detection)
    }

    /// Read a document from a provider and extract its items.
    ///
    /// Grid-mode profiles have their candidate flavors read before the
    /// provider is released; extraction itself only sees the in-memory
    /// document.
    pub fn process<P>(&self, provider: P, pages: &PageSelection) -> Result<ExtractionResult>
    where
        P: PageTextProvider + TableGridProvider,
    {
        let timer = Timer::start();

        let mut document = SourceDocument::read(&provider, pages)?;
        let resolution = self.detect(&document);

        let provider_flavors = provider.default_flavors();
        if let Some(profile) = resolution.profile {
            if let Strategy::Grid(rules) = &profile.strategy {
                let candidates =
                    layout::candidate_flavors(rules, &self.default_flavors, &provider_flavors);
                document.read_grids(&provider, &candidates, pages);
            }
        }
        drop(provider);

        let mut result = self.extract_resolved(&document, resolution, &provider_flavors);
        result.processing_time_ms = timer.elapsed_ms();
        Ok(result)
    }

    /// Extract items from an already read document.
    pub fn parse(&self, document: &SourceDocument) -> ExtractionResult {
        let timer = Timer::start();

        let resolution = self.detect(document);
        let read_flavors: Vec<String> = document.grids.keys().cloned().collect();

        let mut result = self.extract_resolved(document, resolution, &read_flavors);
        result.processing_time_ms = timer.elapsed_ms();
        result
    }

    fn extract_resolved(
        &self,
        document: &SourceDocument,
        resolution: Resolution<'_>,
        provider_flavors: &[String],
    ) -> ExtractionResult {
        let Some(profile) = resolution.profile else {
            info!("No supplier profile for document ({} lines)", document.lines.len());
            return ExtractionResult::unknown(document);
        };

        let mut result = ExtractionResult {
            supplier: resolution.supplier,
            profile_loaded: true,
            strategy: Some(profile.strategy.kind()),
            page_count: document.page_count,
            pages_parsed: document.pages_parsed.clone(),
            ..Default::default()
        };

        let mut output = self.run_strategy(profile, document, provider_flavors, &mut result);

        postprocess::apply(&mut output.items, &profile.numeric_fields);
        if let Some(orders) = output.orders.as_mut() {
            for order in orders {
                postprocess::apply(&mut order.items, &profile.numeric_fields);
            }
        }

        result.metadata = metadata::extract(&document.lines.join("\n"), &profile.metadata);
        result.line_count = output.items.len();
        result.items = output.items;
        result.orders = output.orders;

        info!(
            "Extracted {} items for supplier '{}' ({} strategy)",
            result.line_count,
            result.supplier,
            profile.strategy.kind()
        );
        result
    }

    fn run_strategy(
        &self,
        profile: &CompiledProfile,
        document: &SourceDocument,
        provider_flavors: &[String],
        result: &mut ExtractionResult,
    ) -> StrategyOutput {
        match &profile.strategy {
            Strategy::SingleLine { block, item } => {
                let isolated;
                let lines = match block {
                    Some(rules) => {
                        isolated = isolate_block(&document.lines, rules);
                        if isolated.is_empty() {
                            result.warnings.push("item block is empty".to_string());
                        }
                        &isolated
                    }
                    None => &document.lines,
                };
                StrategyOutput::items(single_line::extract(lines, item))
            }
            Strategy::MultiBlock { header, item } => {
                multi_block::extract(&document.lines, header, item)
            }
            Strategy::Multiline { rules, header, scope } => {
                let isolated;
                let lines = match scope {
                    LineScope::Full => &document.lines,
                    LineScope::Block(block) => {
                        isolated = isolate_block(&document.lines, block);
                        if isolated.is_empty() {
                            result.warnings.push("item block is empty".to_string());
                        }
                        &isolated
                    }
                };
                multiline::extract(lines, rules, header.as_ref())
            }
            Strategy::Grid(rules) => {
                if document.grids.is_empty() {
                    warn!("Grid profile '{}' but no tables were read", profile.name);
                }
                let candidates =
                    layout::candidate_flavors(rules, &self.default_flavors, provider_flavors);
                let selection = layout::select_layout(
                    &document.grids,
                    &document.page_text(),
                    rules,
                    &candidates,
                    self.header_rows,
                );

                if selection.forced
                    && !selection.chosen_diagnostics().is_some_and(|d| d.header_match)
                {
                    let message = format!(
                        "forced flavor '{}' did not match the expected header",
                        selection.chosen_flavor.as_deref().unwrap_or_default()
                    );
                    warn!("{}", message);
                    result.warnings.push(message);
                }

                let (tables, warning) = layout::tables_for(&selection, &document.grids);
                result.warnings.extend(warning);
                debug!("Extracting rows from {} tables", tables.len());
                let items = rows::extract_tables(tables, rules);

                if self.include_layout_diagnostics {
                    result.layout = Some(selection);
                }
                StrategyOutput::items(items)
            }
        }
    }
}

/// Wall-clock timer. Reads zero on wasm32, which has no `Instant`.
struct Timer {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
}

impl Timer {
    fn start() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            start: std::time::Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        #[cfg(not(target_arch = "wasm32"))]
        let ms = self.start.elapsed().as_millis() as u64;
        #[cfg(target_arch = "wasm32")]
        let ms = 0;
        ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::delivery::{FieldValue, StrategyKind, UNKNOWN_SUPPLIER};
    use crate::models::profile::ProfileStore;
    use crate::pdf::TextDocument;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn parser(json: &str) -> DeliveryParser {
        let store = ProfileStore::from_json(json).unwrap();
        DeliveryParser::new(ProfileSet::compile(&store).unwrap())
    }

    const SINGLE: &str = r#"{
        "suppliers": {
            "ESL": {
                "detection_patterns": ["ESL Electrical"],
                "block": { "start": "^Pos\\s+Code", "stop": "^Total" },
                "item_pattern": "(?P<pos>\\d+)\\s+(?P<code>[A-Z]{2}\\d{4})\\s+(?P<description>.+?)\\s+(?P<quantity>[\\d.,]+)$",
                "post_processing": { "integer_fields": ["quantity"] },
                "metadata": { "date_pattern": "Date:\\s*(\\S+)", "order_pattern": "PO\\s+(\\d+)" }
            },
            "Other": {
                "detection_patterns": ["Other Corp"],
                "item_pattern": "(?P<code>\\d+)"
            }
        }
    }"#;

    #[test]
    fn test_end_to_end_single_block() {
        let text = "ESL Electrical Ltd\nDate: 03/02/2025\nPO 4500123\nPos Code Description Qty\n\
                    1 AB1000 Cable 3G1.5 2.000\n\
                    2 AB1001 Socket 4\n\
                    this line is malformed\n\
                    3 AB1002 Breaker 16A 3,5\n\
                    Total 3 lines\n4 AB9999 After block 1";
        let result = parser(SINGLE).parse(&SourceDocument::from_text(text));

        assert_eq!(result.supplier, "ESL");
        assert!(result.profile_loaded);
        assert_eq!(result.strategy, Some(StrategyKind::SingleLine));
        assert_eq!(result.line_count, 3);

        let codes: Vec<_> = result.items.iter().filter_map(|i| i.text("code")).collect();
        assert_eq!(codes, vec!["AB1000", "AB1001", "AB1002"]);

        let quantities: Vec<_> = result.items.iter().map(|i| i.get("quantity").cloned()).collect();
        assert_eq!(
            quantities,
            vec![
                Some(FieldValue::Integer(2000)),
                Some(FieldValue::Integer(4)),
                Some(FieldValue::Integer(3)),
            ]
        );

        assert_eq!(result.metadata.date, NaiveDate::from_ymd_opt(2025, 2, 3));
        assert_eq!(result.metadata.purchase_orders, vec!["4500123"]);
        assert!(result.orders.is_none());
    }

    #[test]
    fn test_unknown_supplier() {
        let result = parser(SINGLE).parse(&SourceDocument::from_text("Nobody here"));
        assert_eq!(result.supplier, UNKNOWN_SUPPLIER);
        assert!(!result.profile_loaded);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_missing_block_is_warned() {
        let result = parser(SINGLE).parse(&SourceDocument::from_text("ESL Electrical\n1 AB1000 X 2"));
        assert!(result.items.is_empty());
        assert_eq!(result.warnings, vec!["item block is empty"]);
    }

    #[test]
    fn test_multi_block_orders() {
        let parser = parser(
            r#"{ "suppliers": { "Linear": {
                "detection_patterns": ["Linear Supply"],
                "multi_block": true,
                "header_pattern": "Your order:\\s*(?P<po>\\S+)",
                "item_pattern": "(?P<code>\\d{5})\\s+(?P<quantity>\\d+)",
                "post_processing": { "integer_fields": ["quantity"] }
            } } }"#,
        );
        let text = "Linear Supply\nYour order: A-1\n10001 2\nYour order: A-2\nYour order: A-3\n10002 7";
        let result = parser.parse(&SourceDocument::from_text(text));

        assert_eq!(result.strategy, Some(StrategyKind::MultiBlock));
        let orders = result.orders.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].reference(), Some("A-3"));
        assert_eq!(orders[1].items[0].get("quantity"), Some(&FieldValue::Integer(7)));
        assert_eq!(result.items[1].order_ref.as_deref(), Some("A-3"));
    }

    #[test]
    fn test_multiline_with_float_quantity() {
        let parser = parser(
            r#"{ "suppliers": { "Linden": {
                "detection_patterns": ["Linden"],
                "block": { "start": "^Item", "stop": "^End" },
                "multiline": {
                    "start_pattern": "(?P<item>\\d{6})\\s+(?P<qty>[\\d.,]+)",
                    "description_pattern": "\\s*(?P<desc>[A-Za-z].*)"
                },
                "post_processing": { "float_fields": ["quantity"] }
            } } }"#,
        );
        let text = "Linden BV\nItem Qty\n100200 1.250,5\nCopper cable\nEnd\n100300 1\nIgnored";
        let result = parser.parse(&SourceDocument::from_text(text));

        assert_eq!(result.line_count, 1);
        let item = &result.items[0];
        assert_eq!(item.get("quantity"), Some(&FieldValue::Float(1250.5)));
        assert_eq!(item.text("description"), Some("Copper cable"));
    }

    const GRID: &str = r#"{ "suppliers": { "Grid": {
        "detection_patterns": ["Grid Supplies"],
        "item_pattern": "(?P<code>[A-Z]\\d{3})\\s+(?P<description>.+?)\\s+(?P<quantity>\\d+)$",
        "table": { "header": "Code Description Qty" },
        "post_processing": { "integer_fields": ["quantity"] }
    } } }"#;

    #[test]
    fn test_grid_end_to_end() {
        let text = "Grid Supplies\nDelivery\n\
                    Code   Description   Qty\n\
                    A100   Cable   nan   2\n\
                    A101   Plug   3\n";
        let doc = TextDocument::from_text(text);
        let result = parser(GRID).process(doc, &PageSelection::All).unwrap();

        assert_eq!(result.strategy, Some(StrategyKind::Grid));
        let layout = result.layout.unwrap();
        assert_eq!(layout.chosen_flavor.as_deref(), Some("stream"));
        assert!(!layout.forced);
        assert_eq!(layout.flavor_results.len(), 2);

        let codes: Vec<_> = result.items.iter().filter_map(|i| i.text("code")).collect();
        assert_eq!(codes, vec!["A100", "A101"]);
        assert_eq!(result.items[0].get("quantity"), Some(&FieldValue::Integer(2)));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_grid_wrapped_row() {
        let text = "Grid Supplies\n\
                    Code   Description   Qty\n\
                    A100   Cable very\n\
                    long name  4\n\
                    A101   Plug          3\n";
        let result = parser(GRID)
            .process(TextDocument::from_text(text), &PageSelection::All)
            .unwrap();

        let descriptions: Vec<_> = result.items.iter().filter_map(|i| i.text("description")).collect();
        assert_eq!(descriptions, vec!["Cable very long name", "Plug"]);
        assert_eq!(result.items[0].get("quantity"), Some(&FieldValue::Integer(4)));
    }

    #[test]
    fn test_grid_without_header_match_uses_all_tables() {
        let text = "Grid Supplies\nA100   Plug   3\nA101   Cable   2\n";
        let result = parser(GRID)
            .process(TextDocument::from_text(text), &PageSelection::All)
            .unwrap();

        assert_eq!(result.items.len(), 2);
        assert!(result.layout.unwrap().chosen_flavor.is_none());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_process_page_selection() {
        let text = "ESL Electrical\x0cPos Code\n1 AB1000 Cable 2\nTotal";
        let selection: PageSelection = "2".parse().unwrap();
        let result = parser(SINGLE)
            .process(TextDocument::from_text(text), &selection)
            .unwrap();

        // only page 2 is read, the single-profile fallback does not apply
        assert_eq!(result.supplier, UNKNOWN_SUPPLIER);
        assert_eq!(result.page_count, 2);
        assert_eq!(result.pages_parsed, vec![2]);
    }
}
