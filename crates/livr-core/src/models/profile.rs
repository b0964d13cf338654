//! On-disk supplier profile schema.
//!
//! A profile store is a JSON object whose `suppliers` map is scanned in
//! declaration order during supplier detection:
//!
//! ```json
//! {
//!   "suppliers": {
//!     "ESL": {
//!       "detection_patterns": ["ESL Electrical"],
//!       "block": { "start": "^Pos\\s+Code", "stop": "^Page \\d+ of" },
//!       "item_pattern": "(?P<code>\\S+)\\s+(?P<description>.+?)\\s+(?P<quantity>[\\d.,]+)$",
//!       "post_processing": { "integer_fields": ["quantity"] }
//!     }
//!   }
//! }
//! ```
//!
//! These records are validated and compiled by [`crate::profile`].

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{InputError, LivrError, ProfileError};

/// Ordered collection of supplier profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileStore {
    /// Profiles keyed by supplier name, in declaration order.
    #[serde(default)]
    pub suppliers: IndexMap<String, ProfileSpec>,
}

impl ProfileStore {
    /// Load a profile store from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, LivrError> {
        if !path.exists() {
            return Err(InputError::ProfileStoreNotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a profile store from JSON text.
    pub fn from_json(json: &str) -> Result<Self, LivrError> {
        serde_json::from_str(json)
            .map_err(|e| ProfileError::InvalidStore(e.to_string()).into())
    }

    /// Number of declared profiles.
    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    /// Whether the store declares no profile.
    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }
}

/// Layout rules for one supplier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSpec {
    /// Literal strings; any occurrence identifies the supplier.
    pub detection_patterns: Vec<String>,

    /// Start/stop markers bounding the item table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockSpec>,

    /// One-line item regex with named groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_pattern: Option<String>,

    /// Group-defining line regex (e.g. an order header).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_pattern: Option<String>,

    /// Multi-line item layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline: Option<MultilineSpec>,

    /// Items are grouped under header lines.
    pub multi_block: bool,

    /// Numeric conversions applied after extraction.
    pub post_processing: PostProcessingSpec,

    /// Grid-mode layout rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableSpec>,

    /// Document-level metadata rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataSpec>,
}

/// Item table boundaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockSpec {
    /// The block begins on the line after the first match.
    pub start: String,
    /// The block ends before the first following match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
}

/// Items printed over several lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultilineSpec {
    /// Regex opening an item; captures code and quantity.
    pub start_pattern: String,
    /// Regex matching a description continuation line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_pattern: Option<String>,
    /// Lines scanned after a start line when looking for a description.
    pub max_lookahead_lines: usize,
    /// Group holding the product code in `start_pattern`.
    pub code_group: String,
    /// Group holding the quantity in `start_pattern`.
    pub quantity_group: String,
    /// Group holding the text in `description_pattern`.
    pub description_group: String,
    /// Group of `start_pattern` carrying an inline description.
    pub inline_description_group: String,
    /// Line prefixes that end a description lookahead.
    pub boundary_markers: Vec<String>,
}

impl Default for MultilineSpec {
    fn default() -> Self {
        Self {
            start_pattern: String::new(),
            description_pattern: None,
            max_lookahead_lines: 5,
            code_group: "item".to_string(),
            quantity_group: "qty".to_string(),
            description_group: "desc".to_string(),
            inline_description_group: "description_inline".to_string(),
            boundary_markers: vec!["Subtotal".to_string()],
        }
    }
}

/// Declared numeric fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessingSpec {
    /// Fields parsed with the lenient integer parser.
    pub integer_fields: Vec<String>,
    /// Fields parsed as European decimals.
    pub float_fields: Vec<String>,
    /// Fields parsed with separator auto-detection.
    pub number_fields: Vec<String>,
}

/// Grid-mode rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSpec {
    /// Expected header text of the item table.
    pub header: String,
    /// Flavor to use unconditionally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_flavor: Option<String>,
    /// Ordered flavor candidates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preferred_flavors: Vec<String>,
    /// Regex recovering a code from the description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_in_description: Option<String>,
}

/// Document-level metadata rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSpec {
    /// Regex whose first group is the document date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_pattern: Option<String>,
    /// Regex whose first group is a purchase-order reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_pattern: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_store_preserves_declaration_order() {
        let json = r#"{
            "suppliers": {
                "Zeta": { "detection_patterns": ["zeta"], "item_pattern": "(?P<code>\\d+)" },
                "Alpha": { "detection_patterns": ["alpha"], "item_pattern": "(?P<code>\\d+)" },
                "Mid": { "detection_patterns": ["mid"], "item_pattern": "(?P<code>\\d+)" }
            }
        }"#;

        let store = ProfileStore::from_json(json).unwrap();
        let names: Vec<&str> = store.suppliers.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_multiline_defaults() {
        let json = r#"{ "start_pattern": "^(?P<item>\\d+)" }"#;
        let spec: MultilineSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.max_lookahead_lines, 5);
        assert_eq!(spec.code_group, "item");
        assert_eq!(spec.quantity_group, "qty");
        assert_eq!(spec.description_group, "desc");
        assert_eq!(spec.boundary_markers, vec!["Subtotal".to_string()]);
    }

    #[test]
    fn test_invalid_store_is_profile_error() {
        let err = ProfileStore::from_json("{ \"suppliers\": [1, 2] }").unwrap_err();
        assert!(matches!(err, LivrError::Profile(ProfileError::InvalidStore(_))));
    }

    #[test]
    fn test_missing_store_is_input_error() {
        let err = ProfileStore::from_file(Path::new("/nonexistent/profiles.json")).unwrap_err();
        assert!(matches!(err, LivrError::Input(InputError::ProfileStoreNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"{ "suppliers": { "ESL": { "detection_patterns": ["ESL"], "item_pattern": "(?P<code>\\d+)" } } }"#,
        )
        .unwrap();

        let store = ProfileStore::from_file(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.suppliers["ESL"].detection_patterns, vec!["ESL".to_string()]);
    }
}
