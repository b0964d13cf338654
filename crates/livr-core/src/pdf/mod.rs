//! Document acquisition.
//!
//! Providers read page text and table grids from a source file. A
//! [`SourceDocument`] is read completely before extraction runs, so the
//! provider can be dropped as soon as reading is done.

#[cfg(feature = "pdf")]
mod extractor;
mod grid;
mod text;

#[cfg(feature = "pdf")]
pub use extractor::PdfExtractor;
pub use grid::{tables_from_text, DELIMITED, STREAM, TEXT_FLAVORS};
pub use text::TextDocument;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{InputError, LivrError, ReadError};
use crate::models::delivery::{SourceDocument, Table};

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ReadError>;

/// Source of plain page text.
pub trait PageTextProvider {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Text of one page (1-indexed).
    fn page_text(&self, page: usize) -> Result<String>;

    /// Text of the selected pages, in page order.
    fn page_texts(&self, pages: &PageSelection) -> Result<Vec<(usize, String)>> {
        pages
            .resolve(self.page_count())
            .into_iter()
            .map(|p| Ok((p, self.page_text(p)?)))
            .collect()
    }
}

/// Source of table grids.
pub trait TableGridProvider {
    /// Flavors tried when a profile names none.
    fn default_flavors(&self) -> Vec<String>;

    /// Tables found on the selected pages with one flavor.
    fn extract_tables(&self, flavor: &str, pages: &PageSelection) -> Result<Vec<Table>>;
}

/// One entry of a page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSpec {
    /// A single page; pages past the end select the last page.
    Single(usize),
    /// An inclusive range, truncated at the last page.
    Range(usize, usize),
}

/// Pages to read: `all`, `3`, `1-3` or `1,3,5-6`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    #[default]
    All,
    Pages(Vec<PageSpec>),
}

impl PageSelection {
    /// Concrete 1-indexed pages for a document, sorted and de-duplicated.
    pub fn resolve(&self, page_count: usize) -> Vec<usize> {
        if page_count == 0 {
            return Vec::new();
        }
        let specs = match self {
            Self::All => return (1..=page_count).collect(),
            Self::Pages(specs) => specs,
        };

        let mut pages = Vec::new();
        for spec in specs {
            match *spec {
                PageSpec::Single(p) => pages.push(p.clamp(1, page_count)),
                PageSpec::Range(a, b) => {
                    let (start, end) = (a.min(b).max(1), a.max(b).max(1));
                    pages.extend(start..=end.min(page_count));
                }
            }
        }
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

impl FromStr for PageSelection {
    type Err = InputError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let spec = s.trim().to_lowercase();
        if spec.is_empty() || spec == "all" {
            return Ok(Self::All);
        }

        let invalid = || InputError::InvalidPages(s.to_string());
        let number = |n: &str| n.trim().parse::<usize>().map_err(|_| invalid());

        let mut specs = Vec::new();
        for chunk in spec.split(',').map(str::trim) {
            if chunk.is_empty() {
                continue;
            }
            let entry = match chunk.split_once('-') {
                Some((a, b)) => PageSpec::Range(number(a)?, number(b)?),
                None => PageSpec::Single(number(chunk)?),
            };
            specs.push(entry);
        }

        if specs.is_empty() {
            return Err(invalid());
        }
        Ok(Self::Pages(specs))
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let specs = match self {
            Self::All => return f.write_str("all"),
            Self::Pages(specs) => specs,
        };
        let parts: Vec<String> = specs
            .iter()
            .map(|s| match s {
                PageSpec::Single(p) => p.to_string(),
                PageSpec::Range(a, b) => format!("{a}-{b}"),
            })
            .collect();
        f.write_str(&parts.join(","))
    }
}

/// Supported source document kinds.
#[derive(Debug)]
pub enum DocumentSource {
    Text(TextDocument),
    #[cfg(feature = "pdf")]
    Pdf(PdfExtractor),
}

impl PageTextProvider for DocumentSource {
    fn page_count(&self) -> usize {
        match self {
            Self::Text(doc) => doc.page_count(),
            #[cfg(feature = "pdf")]
            Self::Pdf(pdf) => pdf.page_count(),
        }
    }

    fn page_text(&self, page: usize) -> Result<String> {
        match self {
            Self::Text(doc) => doc.page_text(page),
            #[cfg(feature = "pdf")]
            Self::Pdf(pdf) => pdf.page_text(page),
        }
    }
}

impl TableGridProvider for DocumentSource {
    fn default_flavors(&self) -> Vec<String> {
        match self {
            Self::Text(doc) => doc.default_flavors(),
            #[cfg(feature = "pdf")]
            Self::Pdf(pdf) => pdf.default_flavors(),
        }
    }

    fn extract_tables(&self, flavor: &str, pages: &PageSelection) -> Result<Vec<Table>> {
        match self {
            Self::Text(doc) => doc.extract_tables(flavor, pages),
            #[cfg(feature = "pdf")]
            Self::Pdf(pdf) => pdf.extract_tables(flavor, pages),
        }
    }
}

/// Open a document by extension: `.txt` always, `.pdf` with the `pdf` feature.
pub fn open_document(path: &Path) -> std::result::Result<DocumentSource, LivrError> {
    if !path.exists() {
        return Err(InputError::DocumentNotFound(path.to_path_buf()).into());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "txt" => Ok(DocumentSource::Text(TextDocument::open(path)?)),
        #[cfg(feature = "pdf")]
        "pdf" => {
            let data = std::fs::read(path).map_err(ReadError::from)?;
            Ok(DocumentSource::Pdf(PdfExtractor::from_bytes(&data)?))
        }
        other => Err(InputError::UnsupportedType(if other.is_empty() {
            path.display().to_string()
        } else {
            other.to_string()
        })
        .into()),
    }
}

impl SourceDocument {
    /// Read the selected pages of a provider.
    pub fn read<P: PageTextProvider + ?Sized>(provider: &P, pages: &PageSelection) -> Result<Self> {
        let page_count = provider.page_count();
        if page_count == 0 {
            return Err(ReadError::NoPages);
        }

        let (pages_parsed, texts): (Vec<usize>, Vec<String>) =
            provider.page_texts(pages)?.into_iter().unzip();
        debug!("Read {} of {} pages", pages_parsed.len(), page_count);

        Ok(Self::from_pages(page_count, pages_parsed, texts))
    }

    /// Read the tables of every flavor. A failing flavor is recorded, not fatal.
    pub fn read_grids<P: TableGridProvider + ?Sized>(
        &mut self,
        provider: &P,
        flavors: &[String],
        pages: &PageSelection,
    ) {
        for flavor in flavors {
            if self.grids.contains_key(flavor) {
                continue;
            }
            let tables = provider.extract_tables(flavor, pages).map_err(|e| {
                warn!("Flavor '{}' failed: {}", flavor, e);
                e.to_string()
            });
            self.grids.insert(flavor.clone(), tables);
        }
    }
}
