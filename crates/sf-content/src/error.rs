//! Error types for content operations.

use thiserror::Error;

/// Errors that can occur while decoding packages or accessing storage.
#[derive(Error, Debug)]
pub enum ContentError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Shared-type error (identifiers, library names)
    #[error(transparent)]
    Common(#[from] sf_common::Error),

    /// Missing required file in the package
    #[error("missing required file: {0}")]
    MissingFile(String),

    /// Structurally invalid package
    #[error("invalid package: {0}")]
    InvalidPackage(String),

    /// Relative path escapes its root or is otherwise unusable
    #[error("unsafe path: {0}")]
    UnsafePath(String),

    /// No content entry with this id
    #[error("content not found: {0}")]
    ContentNotFound(String),

    /// Content entry exists but the file does not
    #[error("file '{path}' not found in content {content_id}")]
    FileNotFound { content_id: String, path: String },

    /// Library is not installed
    #[error("library not installed: {0}")]
    LibraryNotFound(String),

    /// Library file referenced by library.json is missing
    #[error("file '{path}' missing from library {library}")]
    LibraryFileNotFound { library: String, path: String },
}

/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Ingestion failure, split by the stage that failed.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The buffer is not a valid package.
    #[error("package could not be decoded: {0}")]
    Decode(#[source] ContentError),

    /// The package decoded but could not be persisted.
    #[error("package could not be persisted: {0}")]
    Persist(#[source] ContentError),
}
