//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LivrError;

/// Main configuration for the livr pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LivrConfig {
    /// Document reading configuration.
    pub source: SourceConfig,

    /// Profile store configuration.
    pub profiles: ProfilesConfig,

    /// Extraction engine configuration.
    pub extraction: ExtractionConfig,
}

/// Document reading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Page selection: "all", "3", "1-3" or "1,3,5-6".
    pub pages: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pages: "all".to_string(),
        }
    }
}

/// Profile store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    /// Path to the JSON profile store.
    pub path: PathBuf,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("profiles.json"),
        }
    }
}

/// Extraction engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rows of each table inspected when matching the expected header.
    pub header_rows: usize,

    /// Compare detection patterns after light normalization.
    pub normalize_detection: bool,

    /// Flavors tried when a profile declares none (empty = provider default).
    pub default_flavors: Vec<String>,

    /// Attach per-flavor diagnostics to grid-mode results.
    pub include_layout_diagnostics: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_rows: 6,
            normalize_detection: true,
            default_flavors: Vec::new(),
            include_layout_diagnostics: true,
        }
    }
}

impl LivrConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, LivrError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| LivrError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), LivrError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
