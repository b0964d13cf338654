//! PDF page text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, warn};

use super::grid::{tables_from_text, TEXT_FLAVORS};
use super::{PageSelection, PageTextProvider, Result, TableGridProvider};
use crate::error::ReadError;
use crate::models::delivery::Table;

/// Text-layer PDF reader.
///
/// All page texts are extracted when the document is loaded; the PDF bytes
/// are not kept.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    page_count: usize,
    pages: Vec<String>,
}

impl PdfExtractor {
    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut doc = Document::load_mem(data).map_err(|e| ReadError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let raw = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(ReadError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| ReadError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(ReadError::NoPages);
        }

        let mut pages = pdf_extract::extract_text_from_mem_by_pages(&raw)
            .map_err(|e| ReadError::TextExtraction(e.to_string()))?;
        if pages.len() != page_count {
            warn!(
                "Text layer has {} pages, document has {}",
                pages.len(),
                page_count
            );
            pages.resize(page_count, String::new());
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { page_count, pages })
    }
}

impl PageTextProvider for PdfExtractor {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text(&self, page: usize) -> Result<String> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .cloned()
            .ok_or_else(|| ReadError::TextExtraction(format!("page {page} out of range")))
    }
}

impl TableGridProvider for PdfExtractor {
    fn default_flavors(&self) -> Vec<String> {
        TEXT_FLAVORS.iter().map(|f| f.to_string()).collect()
    }

    fn extract_tables(&self, flavor: &str, pages: &PageSelection) -> Result<Vec<Table>> {
        tables_from_text(flavor, &self.page_texts(pages)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_default() {
        let extractor = PdfExtractor::default();
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.page_text(1).is_err());
    }

    #[test]
    fn test_invalid_pdf_is_parse_error() {
        let err = PdfExtractor::from_bytes(b"not a pdf").unwrap_err();
        assert!(matches!(err, ReadError::Parse(_)));
    }
}
