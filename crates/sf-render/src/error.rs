//! Error types for bundle rendering.

use thiserror::Error;

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors that can occur while rendering a bundle.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Content store or library storage error.
    #[error("content error: {0}")]
    Content(#[from] sf_content::ContentError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The content does not name a usable main library.
    #[error("main library '{0}' is not among the content's dependencies")]
    MissingMainLibrary(String),

    /// A library the content depends on is not installed.
    #[error("library dependency cannot be resolved: {0}")]
    UnresolvedDependency(String),

    /// A file of the H5P core runtime cannot be read.
    #[error("core runtime file '{path}' cannot be read: {source}")]
    MissingCoreAsset {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A content parameter references a file path that cannot be used.
    #[error("invalid content file reference: {0}")]
    InvalidReference(String),
}
