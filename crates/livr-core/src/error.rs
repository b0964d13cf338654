//! Error types for the livr-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the livr library.
#[derive(Error, Debug)]
pub enum LivrError {
    /// Input validation failed before any extraction work began.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// The page-text or table-grid provider failed for this document.
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// A supplier profile is broken and cannot serve any document.
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while validating caller input.
#[derive(Error, Debug)]
pub enum InputError {
    /// The source document does not exist.
    #[error("document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The profile store does not exist.
    #[error("profile store not found: {}", .0.display())]
    ProfileStoreNotFound(PathBuf),

    /// The document type is not supported.
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),

    /// The page selection could not be parsed.
    #[error("invalid page selection: {0}")]
    InvalidPages(String),
}

/// Errors raised by page-text and table-grid providers.
#[derive(Error, Debug)]
pub enum ReadError {
    /// Failed to open/parse the source document.
    #[error("failed to parse document: {0}")]
    Parse(String),

    /// Failed to extract page text.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The flavor is not supported by the provider.
    #[error("unsupported layout flavor: {0}")]
    UnsupportedFlavor(String),

    /// The document is encrypted and cannot be processed.
    #[error("document is encrypted")]
    Encrypted,

    /// The document is empty or has no pages.
    #[error("document has no pages")]
    NoPages,

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading and compiling supplier profiles.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// A profile regex does not compile.
    #[error("profile '{profile}': invalid regex in {field}: {source}")]
    InvalidRegex {
        profile: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The populated fields select more than one extraction strategy.
    #[error("profile '{profile}': ambiguous extraction strategy: {reason}")]
    AmbiguousStrategy { profile: String, reason: String },

    /// The populated fields select no extraction strategy.
    #[error("profile '{profile}': no extraction strategy ({reason})")]
    NoStrategy { profile: String, reason: String },

    /// A field is declared under more than one numeric conversion.
    #[error("profile '{profile}': field '{field}' declared under several post-processing kinds")]
    ConflictingPostProcessing { profile: String, field: String },

    /// The profile store could not be parsed.
    #[error("invalid profile store: {0}")]
    InvalidStore(String),
}

/// Result type for the livr library.
pub type Result<T> = std::result::Result<T, LivrError>;
