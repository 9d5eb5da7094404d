//! Content and actor identity types.
//!
//! A `ContentId` names one entry in the content store for the lifetime of
//! a single conversion. It doubles as a directory name on disk, so parsing
//! only admits path-safe characters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Identifier of a content entry (temporary or saved).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Generate a fresh, collision-free identifier.
    pub fn generate() -> Self {
        ContentId(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Parse an existing identifier string.
    ///
    /// Accepts ASCII alphanumerics, `-` and `_` only.
    pub fn parse(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && s.len() <= 64
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::InvalidId {
                kind: "content",
                value: s.to_string(),
            });
        }
        Ok(ContentId(s.to_string()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The actor on whose behalf content-store calls are made.
///
/// Carries no authorization semantics; it is threaded through every store
/// call so implementations can attribute writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId {
    pub id: String,
    pub name: String,
}

impl ActorId {
    /// Create an actor with an explicit id and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The throwaway actor the converter uses for its own store calls.
    pub fn converter() -> Self {
        Self::new("scormify", "scormify converter")
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
