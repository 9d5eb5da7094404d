//! Error types for shared helpers.

use thiserror::Error;

/// Result type alias for sf-common operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing identities or loading locale tables.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A string that does not parse as the requested identifier.
    #[error("invalid {kind} identifier: {value}")]
    InvalidId { kind: &'static str, value: String },

    /// A library name that is not `machineName-major.minor`.
    #[error("invalid library name: {0}")]
    InvalidLibraryName(String),
}
