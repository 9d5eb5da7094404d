//! Error taxonomy for the conversion pipeline.
//!
//! Every stage failure maps to one [`ConvertError`] variant with:
//! - A stable numeric code
//! - A category for grouping
//! - A retryability hint
//! - The HTTP status used at the request boundary
//!
//! At the request boundary errors serialize to:
//! ```json
//! { "message": "masteryScore is required", "status": 400, "error": {} }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sf_archive::ArchiveError;
use sf_content::{ContentError, IngestError};
use sf_render::RenderError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request fields missing or malformed.
    Request,
    /// Source package cannot be decoded.
    Package,
    /// Content cannot be rendered.
    Render,
    /// Content store or staging tree writes failed.
    Storage,
    /// Archive assembly failed.
    Packaging,
    /// Configuration file errors.
    Config,
    /// Other file I/O.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Request => write!(f, "request"),
            ErrorCategory::Package => write!(f, "package"),
            ErrorCategory::Render => write!(f, "render"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Packaging => write!(f, "packaging"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified pipeline error.
#[derive(Error, Debug)]
pub enum ConvertError {
    // Request boundary (10-19)
    #[error("{0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    // Source content (20-29)
    #[error("package cannot be decoded: {0}")]
    PackageDecode(#[source] ContentError),

    #[error("content cannot be rendered: {0}")]
    Render(#[from] RenderError),

    // Storage (30-39)
    #[error("content cannot be persisted: {0}")]
    ContentPersist(#[source] ContentError),

    #[error("cannot copy '{path}' into staging directory: {source}")]
    ResourceCopy {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // Packaging (40-49)
    #[error("packaging failed: {0}")]
    Packaging(#[from] ArchiveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for ConvertError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Decode(e) => ConvertError::PackageDecode(e),
            IngestError::Persist(e) => ConvertError::ContentPersist(e),
        }
    }
}

impl ConvertError {
    pub fn resource_copy(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ConvertError::ResourceCopy {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Stable numeric code.
    pub fn code(&self) -> u32 {
        match self {
            ConvertError::Validation(_) => 10,
            ConvertError::Config(_) => 11,
            ConvertError::PackageDecode(_) => 20,
            ConvertError::Render(_) => 21,
            ConvertError::ContentPersist(_) => 30,
            ConvertError::ResourceCopy { .. } => 31,
            ConvertError::Packaging(_) => 40,
            ConvertError::Io(_) => 41,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::Validation(_) => ErrorCategory::Request,
            ConvertError::Config(_) => ErrorCategory::Config,
            ConvertError::PackageDecode(_) => ErrorCategory::Package,
            ConvertError::Render(_) => ErrorCategory::Render,
            ConvertError::ContentPersist(_) | ConvertError::ResourceCopy { .. } => {
                ErrorCategory::Storage
            }
            ConvertError::Packaging(_) => ErrorCategory::Packaging,
            ConvertError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Whether the same request might succeed later. Nothing retries
    /// automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConvertError::ContentPersist(_)
                | ConvertError::ResourceCopy { .. }
                | ConvertError::Io(_)
        )
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ConvertError::Validation(_) | ConvertError::PackageDecode(_) => 400,
            _ => 500,
        }
    }

    /// Structured body for the request boundary.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            message: self.to_string(),
            status: self.http_status(),
            error: serde_json::json!({
                "code": self.code(),
                "category": self.category(),
                "retryable": self.is_retryable(),
            }),
        }
    }
}

/// Error body returned at the request boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
    pub error: serde_json::Value,
}

impl ErrorResponse {
    /// A client error with an empty error object.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 400,
            error: serde_json::json!({}),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"message":"internal error","status":{},"error":{{}}}}"#, self.status)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_errors_split_by_stage() {
        let decode: ConvertError =
            IngestError::Decode(ContentError::MissingFile("h5p.json".into())).into();
        assert!(matches!(decode, ConvertError::PackageDecode(_)));
        assert_eq!(decode.http_status(), 400);
        assert!(!decode.is_retryable());

        let persist: ConvertError = IngestError::Persist(ContentError::Io(std::io::Error::other(
            "disk full",
        )))
        .into();
        assert!(matches!(persist, ConvertError::ContentPersist(_)));
        assert_eq!(persist.http_status(), 500);
        assert!(persist.is_retryable());
    }

    #[test]
    fn test_resource_copy_names_path() {
        let err = ConvertError::resource_copy("img/a.png", std::io::Error::other("denied"));
        assert!(err.to_string().contains("img/a.png"));
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_validation_response() {
        let response = ConvertError::Validation("masteryScore is required".into()).to_response();
        assert_eq!(response.status, 400);
        assert_eq!(response.message, "masteryScore is required");
        assert_eq!(response.error["category"], "request");
    }

    #[test]
    fn test_bad_request_body() {
        let json = ErrorResponse::bad_request("filePath is required").to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["message"], "filePath is required");
        assert_eq!(value["status"], 400);
        assert_eq!(value["error"], serde_json::json!({}));
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            ConvertError::Validation(String::new()),
            ConvertError::Config(String::new()),
            ConvertError::PackageDecode(ContentError::MissingFile(String::new())),
            ConvertError::Render(RenderError::MissingMainLibrary(String::new())),
            ConvertError::ContentPersist(ContentError::ContentNotFound(String::new())),
            ConvertError::resource_copy("x", std::io::Error::other("x")),
            ConvertError::Packaging(ArchiveError::MissingStartingPage(String::new())),
            ConvertError::Io(std::io::Error::other("x")),
        ];
        let mut codes: Vec<_> = errors.iter().map(ConvertError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
