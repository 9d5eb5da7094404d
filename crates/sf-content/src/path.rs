//! Relative-path validation shared by the decoder, the store and staging.

use std::path::PathBuf;

use crate::error::{ContentError, Result};

/// Validate a `/`-separated relative path and convert it to a `PathBuf`.
///
/// Rejects empty paths, absolute paths, `.`/`..` components, empty
/// components, backslashes and NUL bytes, so the result can be joined onto
/// any root without escaping it.
pub fn safe_relative_path(path: &str) -> Result<PathBuf> {
    let unsafe_path = || ContentError::UnsafePath(path.to_string());

    if path.is_empty() || path.starts_with('/') || path.contains('\\') || path.contains('\0') {
        return Err(unsafe_path());
    }

    let mut out = PathBuf::new();
    for component in path.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(unsafe_path());
        }
        // Windows drive prefixes such as `C:`.
        if component.len() == 2 && component.ends_with(':') {
            return Err(unsafe_path());
        }
        out.push(component);
    }
    Ok(out)
}
