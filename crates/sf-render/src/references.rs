//! Content file references in content parameters.
//!
//! Any JSON object carrying a string `path` field refers to a file. Files
//! that live on other hosts or inline as `data:` URIs are not part of the
//! content entry and are skipped.

use serde_json::Value;
use std::collections::BTreeSet;

use sf_content::safe_relative_path;

use crate::error::{RenderError, Result};

/// Suffix marking a file that still lives in temporary storage.
const TEMPORARY_MARKER: &str = "#tmp";

/// Collect every local content file referenced by `parameters`.
pub fn collect_content_files(parameters: &Value) -> Result<BTreeSet<String>> {
    let mut files = BTreeSet::new();
    walk(parameters, &mut files)?;
    Ok(files)
}

fn walk(value: &Value, files: &mut BTreeSet<String>) -> Result<()> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get("path") {
                if let Some(local) = local_path(path)? {
                    files.insert(local);
                }
            }
            for child in map.values() {
                walk(child, files)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, files)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn local_path(path: &str) -> Result<Option<String>> {
    if is_external(path) {
        return Ok(None);
    }
    let path = path.strip_suffix(TEMPORARY_MARKER).unwrap_or(path);
    safe_relative_path(path).map_err(|_| RenderError::InvalidReference(path.to_string()))?;
    Ok(Some(path.to_string()))
}

fn is_external(path: &str) -> bool {
    path.is_empty() || path.starts_with("data:") || path.starts_with("//") || path.contains("://")
}
