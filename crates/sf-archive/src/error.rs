//! Error types for archive assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while assembling an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Manifest serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Staging tree traversal error
    #[error("cannot read staging tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// The source directory does not exist
    #[error("source directory not found: {0}")]
    SourceNotFound(PathBuf),

    /// The entry page is not present in the source directory
    #[error("starting page '{0}' not found in source directory")]
    MissingStartingPage(String),

    /// A staged file name cannot be represented in the archive
    #[error("unsupported file name in staging tree: {0}")]
    InvalidFileName(PathBuf),
}
