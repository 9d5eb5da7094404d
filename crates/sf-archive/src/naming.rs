//! Archive file naming.

/// Reduce a free-text title to a filename-safe stem.
///
/// Drops every character that is not an ASCII letter, digit or whitespace,
/// then drops all whitespace, which leaves only ASCII alphanumerics. Titles
/// written entirely in other scripts reduce to an empty string.
pub fn sanitize_title(title: &str) -> String {
    title.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// `<sanitized title>_v<version>_<date>.zip`
pub fn archive_file_name(title: &str, version: &str, date: &str) -> String {
    format!("{}_v{}_{}.zip", sanitize_title(title), version, date)
}
