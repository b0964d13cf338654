//! Core library for profile-driven delivery-note extraction.
//!
//! This crate provides:
//! - Supplier profiles, validated and compiled at load time
//! - Supplier detection over normalized document text
//! - Item extraction strategies (single-line, header-keyed, multi-line, table grid)
//! - Lenient numeric normalization of quantities
//! - Page text and table grids from PDF and plain-text documents

pub mod error;
pub mod extraction;
pub mod models;
pub mod pdf;
pub mod profile;
pub mod text;

pub use error::{InputError, LivrError, ProfileError, ReadError, Result};
pub use extraction::DeliveryParser;
pub use models::config::LivrConfig;
pub use models::delivery::{
    DocumentMetadata, ExtractionResult, FieldValue, Item, LayoutSelection, OrderGroup,
    SourceDocument, StrategyKind, Table, UNKNOWN_SUPPLIER,
};
pub use models::profile::{ProfileSpec, ProfileStore};
pub use pdf::{open_document, DocumentSource, PageSelection, PageTextProvider, TableGridProvider, TextDocument};
#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;
pub use profile::{CompiledProfile, ProfileSet, Resolution, Strategy};
