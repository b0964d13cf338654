//! Delivery-note data models: source documents, items, order groups and the
//! terminal extraction result.

use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Supplier name reported when no profile matched.
pub const UNKNOWN_SUPPLIER: &str = "unknown";

/// A value captured for one item field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Group did not participate in the match or the field was not found.
    Null,
    /// Converted by the integer normalizer.
    Integer(i64),
    /// Converted by a float normalizer.
    Float(f64),
    /// Verbatim capture.
    Text(String),
}

impl FieldValue {
    /// Wrap an optional capture.
    pub fn from_capture(capture: Option<&str>) -> Self {
        match capture {
            Some(s) => Self::Text(s.to_string()),
            None => Self::Null,
        }
    }

    /// The raw text, when this is still a verbatim capture.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is null or blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One extracted line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Field values keyed by field name, in capture order.
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,

    /// Associated order/header reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_ref: Option<String>,
}

impl Item {
    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Get a field as text, if it is still a verbatim capture.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_str)
    }

    /// Set a field value, keeping the position of an existing field.
    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }
}

/// A header-defined group of items (e.g. one purchase order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderGroup {
    /// Captures of the header line.
    pub header: IndexMap<String, FieldValue>,
    /// Items attributed to this header, in line order.
    pub items: Vec<Item>,
}

impl OrderGroup {
    /// First non-empty header capture, used as the order reference.
    pub fn reference(&self) -> Option<&str> {
        self.header
            .values()
            .filter_map(FieldValue::as_str)
            .find(|v| !v.is_empty())
    }
}

/// A table returned by a grid provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Page the table was found on (1-indexed).
    pub page: usize,
    /// Rows of raw cell values.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from rows.
    pub fn new(page: usize, rows: Vec<Vec<String>>) -> Self {
        Self { page, rows }
    }
}

/// In-memory representation of a read document.
///
/// Built once by [`SourceDocument::read`]; extraction never goes back to
/// the underlying file.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    /// Total number of pages in the source.
    pub page_count: usize,
    /// Pages consumed (1-indexed).
    pub pages_parsed: Vec<usize>,
    /// Raw text of each consumed page.
    pub pages: Vec<String>,
    /// Non-empty trimmed lines of all consumed pages.
    pub lines: Vec<String>,
    /// Tables per flavor, read only in grid mode. Errors are kept as text.
    pub grids: IndexMap<String, Result<Vec<Table>, String>>,
}

impl SourceDocument {
    /// Build a document from page texts.
    pub fn from_pages(page_count: usize, pages_parsed: Vec<usize>, pages: Vec<String>) -> Self {
        let lines = pages
            .iter()
            .flat_map(|p| crate::text::split_lines(p))
            .map(str::to_string)
            .collect();

        Self {
            page_count,
            pages_parsed,
            pages,
            lines,
            grids: IndexMap::new(),
        }
    }

    /// Build a single-page document from plain text.
    pub fn from_text(text: &str) -> Self {
        Self::from_pages(1, vec![1], vec![text.to_string()])
    }

    /// All consumed page text joined with newlines.
    pub fn page_text(&self) -> String {
        self.pages.join("\n")
    }
}

/// Extraction strategy selected for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One regex per line inside an isolated block.
    SingleLine,
    /// Header lines delimit groups of one-line items.
    MultiBlock,
    /// Items span several lines; descriptions found by lookahead.
    Multiline,
    /// Items rebuilt from table-grid rows.
    Grid,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SingleLine => "single_line",
            Self::MultiBlock => "multi_block",
            Self::Multiline => "multiline",
            Self::Grid => "grid",
        };
        f.pad(name)
    }
}

/// Outcome of trying one layout flavor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlavorDiagnostics {
    /// Number of tables the flavor produced.
    pub tables_found: usize,
    /// Whether the expected header was found.
    pub header_match: bool,
    /// Indices of the tables whose head holds the header.
    pub matched_tables: Vec<usize>,
    /// Extraction error, if the flavor failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of layout flavor selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSelection {
    /// Chosen flavor. A forced flavor is always chosen; check the
    /// diagnostics to know whether it is trustworthy.
    pub chosen_flavor: Option<String>,
    /// Whether the flavor was forced by the profile.
    pub forced: bool,
    /// Per-flavor diagnostics, in trial order.
    pub flavor_results: IndexMap<String, FlavorDiagnostics>,
}

impl LayoutSelection {
    /// Diagnostics of the chosen flavor.
    pub fn chosen_diagnostics(&self) -> Option<&FlavorDiagnostics> {
        self.chosen_flavor
            .as_ref()
            .and_then(|f| self.flavor_results.get(f))
    }
}

/// Document-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Document date as printed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_document: Option<String>,
    /// Document date, when it could be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Purchase-order references, de-duplicated in first-seen order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purchase_orders: Vec<String>,
}

impl DocumentMetadata {
    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.date_document.is_none() && self.purchase_orders.is_empty()
    }
}

/// Terminal value of the extraction pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Source file, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Detected supplier or "unknown".
    pub supplier: String,
    /// Whether a profile was resolved.
    pub profile_loaded: bool,
    /// Strategy used for the items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    /// Total pages in the source.
    pub page_count: usize,
    /// Pages consumed (1-indexed).
    pub pages_parsed: Vec<usize>,
    /// Number of items.
    pub line_count: usize,
    /// Extracted items, in document order.
    pub items: Vec<Item>,
    /// Order groups (header-keyed strategy only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<Vec<OrderGroup>>,
    /// Layout selection diagnostics (grid mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutSelection>,
    /// Document-level metadata.
    #[serde(default, skip_serializing_if = "DocumentMetadata::is_empty")]
    pub metadata: DocumentMetadata,
    /// Non-fatal anomalies met during extraction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Result for a document no profile matched.
    pub fn unknown(document: &SourceDocument) -> Self {
        Self {
            supplier: UNKNOWN_SUPPLIER.to_string(),
            page_count: document.page_count,
            pages_parsed: document.pages_parsed.clone(),
            ..Default::default()
        }
    }
}
