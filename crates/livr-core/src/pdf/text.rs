//! Plain-text documents. Pages are separated by form feeds.

use std::path::Path;

use tracing::debug;

use super::grid::{tables_from_text, TEXT_FLAVORS};
use super::{PageSelection, PageTextProvider, Result, TableGridProvider};
use crate::error::ReadError;
use crate::models::delivery::Table;

const PAGE_BREAK: char = '\x0c';

/// A document already available as text, such as `pdftotext -layout` output.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    /// Read a UTF-8 text file.
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let doc = Self::from_text(&content);
        debug!("Loaded text document with {} pages", doc.pages.len());
        Ok(doc)
    }

    /// Split text into pages.
    pub fn from_text(text: &str) -> Self {
        Self {
            pages: text.split(PAGE_BREAK).map(str::to_string).collect(),
        }
    }
}

impl PageTextProvider for TextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<String> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .cloned()
            .ok_or_else(|| ReadError::TextExtraction(format!("page {page} out of range")))
    }
}

impl TableGridProvider for TextDocument {
    fn default_flavors(&self) -> Vec<String> {
        TEXT_FLAVORS.iter().map(|f| f.to_string()).collect()
    }

    fn extract_tables(&self, flavor: &str, pages: &PageSelection) -> Result<Vec<Table>> {
        tables_from_text(flavor, &self.page_texts(pages)?)
    }
}
