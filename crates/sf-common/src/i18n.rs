//! Localized default strings.
//!
//! Translation lookup itself lives outside the converter; the pipeline
//! only needs a handful of fallback strings for metadata a package omits.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Translation keys the converter looks up.
pub mod keys {
    pub const DEFAULT_AUTHOR: &str = "editor.exportDialog.defaults.authorName";
    pub const DEFAULT_TITLE: &str = "editor.exportDialog.defaults.title";
}

/// Resolves a translation key to a display string.
pub trait Translator: Send + Sync {
    /// Translate `key`; implementations return the key itself when unknown.
    fn translate(&self, key: &str) -> String;
}

/// Translator backed by a fixed key/value table.
#[derive(Debug, Clone)]
pub struct StaticTranslator {
    strings: HashMap<String, String>,
}

impl StaticTranslator {
    /// The built-in English table.
    pub fn english() -> Self {
        let strings = [
            (keys::DEFAULT_AUTHOR, "Anonymous"),
            (keys::DEFAULT_TITLE, "Untitled content"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { strings }
    }

    /// Build from an explicit table.
    pub fn from_map(strings: HashMap<String, String>) -> Self {
        Self { strings }
    }

    /// Load a flat JSON object of `key: string` pairs, layered over English.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let overrides: HashMap<String, String> = serde_json::from_str(&json)?;
        let mut translator = Self::english();
        translator.strings.extend(overrides);
        Ok(translator)
    }
}

impl Default for StaticTranslator {
    fn default() -> Self {
        Self::english()
    }
}

impl Translator for StaticTranslator {
    fn translate(&self, key: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
