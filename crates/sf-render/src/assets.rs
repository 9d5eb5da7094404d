//! Stylesheet asset embedding.
//!
//! Library stylesheets reference fonts and images with `url(...)`. Inlined
//! into a single document those relative URLs no longer resolve, so each one
//! is replaced with a `data:` URI carrying the file itself.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::{debug, warn};

static URL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn url_pattern() -> Option<&'static Regex> {
    URL_PATTERN
        .get_or_init(|| Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).ok())
        .as_ref()
}

/// Replace relative `url()` targets in `css` with `data:` URIs.
///
/// `css_path` is the stylesheet's path inside its library. `read` loads a
/// library-relative file and returns `None` when it does not exist; such
/// references are left untouched.
pub fn embed_css_assets<F>(css: &str, css_path: &str, mut read: F) -> String
where
    F: FnMut(&str) -> Option<Vec<u8>>,
{
    let Some(pattern) = url_pattern() else {
        return css.to_string();
    };
    let base = css_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

    pattern
        .replace_all(css, |caps: &Captures<'_>| {
            let original = caps[0].to_string();
            let target = caps[1].trim();
            if is_inline_or_remote(target) {
                return original;
            }
            let Some(path) = resolve_relative(base, strip_query(target)) else {
                debug!(css = css_path, target, "url() escapes library directory");
                return original;
            };
            match read(&path) {
                Some(bytes) => format!(
                    "url(\"data:{};base64,{}\")",
                    mime_for(&path),
                    STANDARD.encode(bytes)
                ),
                None => {
                    warn!(css = css_path, path = %path, "Stylesheet asset not found");
                    original
                }
            }
        })
        .into_owned()
}

fn is_inline_or_remote(target: &str) -> bool {
    target.starts_with("data:")
        || target.starts_with('#')
        || target.starts_with("//")
        || target.contains("://")
}

fn strip_query(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

/// Join `target` onto `base`, folding `.` and `..` segments.
///
/// Returns `None` if the result would leave the library directory.
fn resolve_relative(base: &str, target: &str) -> Option<String> {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// MIME type for an embedded asset, by extension.
pub fn mime_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "css" => "text/css",
        _ => "application/octet-stream",
    }
}
