//! Content metadata as declared in a package's `h5p.json`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A versioned library reference (`machineName` + `major.minor`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryName {
    pub machine_name: String,
    #[serde(deserialize_with = "version_number")]
    pub major_version: u32,
    #[serde(deserialize_with = "version_number")]
    pub minor_version: u32,
}

impl LibraryName {
    pub fn new(machine_name: impl Into<String>, major_version: u32, minor_version: u32) -> Self {
        Self {
            machine_name: machine_name.into(),
            major_version,
            minor_version,
        }
    }

    /// Human-readable ubername, e.g. `H5P.Agamotto 1.5`.
    pub fn ubername(&self) -> String {
        format!(
            "{} {}.{}",
            self.machine_name, self.major_version, self.minor_version
        )
    }

    /// Directory name used by library storage, e.g. `H5P.Agamotto-1.5`.
    pub fn dir_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.machine_name, self.major_version, self.minor_version
        )
    }

    /// Parse a directory name of the form `machineName-major.minor`.
    pub fn parse_dir_name(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidLibraryName(s.to_string());
        let (machine_name, version) = s.rsplit_once('-').ok_or_else(invalid)?;
        let (major, minor) = version.split_once('.').ok_or_else(invalid)?;
        if machine_name.is_empty()
            || !machine_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
        {
            return Err(invalid());
        }
        Ok(Self {
            machine_name: machine_name.to_string(),
            major_version: major.parse().map_err(|_| invalid())?,
            minor_version: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Package manifests write versions either as numbers or numeric strings.
fn version_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(u32),
        Str(String),
    }

    match NumOrString::deserialize(deserializer)? {
        NumOrString::Num(n) => Ok(n),
        NumOrString::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// One author entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Structured metadata of a content unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_library: Option<String>,

    /// Content language (`und` when undetermined).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<Author>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default)]
    pub preloaded_dependencies: Vec<LibraryName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embed_types: Vec<String>,

    /// Fields this converter does not interpret, kept for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContentMetadata {
    /// Parse `h5p.json` content.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The first author's name, if any.
    pub fn first_author(&self) -> Option<&str> {
        self.authors
            .as_ref()
            .and_then(|authors| authors.first())
            .map(|a| a.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// The title when present and non-empty.
    pub fn non_empty_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// The main library's entry among the preloaded dependencies.
    pub fn main_library_name(&self) -> Option<&LibraryName> {
        let main = self.main_library.as_deref()?;
        self.preloaded_dependencies
            .iter()
            .find(|dep| dep.machine_name == main)
    }

    /// Ubername of the main library, or an empty string when unresolvable.
    pub fn ubername(&self) -> String {
        self.main_library_name()
            .map(LibraryName::ubername)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H5P_JSON: &str = r#"{
        "title": "Agamotto!",
        "language": "und",
        "mainLibrary": "H5P.Agamotto",
        "embedTypes": ["iframe"],
        "license": "U",
        "defaultLanguage": "de",
        "authors": [{"name": "Jane Roe", "role": "Author"}],
        "preloadedDependencies": [
            {"machineName": "H5P.Agamotto", "majorVersion": "1", "minorVersion": "5"},
            {"machineName": "FontAwesome", "majorVersion": 4, "minorVersion": 5}
        ],
        "extraField": 7
    }"#;

    #[test]
    fn test_parse_h5p_json() {
        let meta = ContentMetadata::from_json(H5P_JSON).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Agamotto!"));
        assert_eq!(meta.default_language.as_deref(), Some("de"));
        assert_eq!(meta.first_author(), Some("Jane Roe"));
        assert_eq!(meta.preloaded_dependencies.len(), 2);
        assert_eq!(meta.preloaded_dependencies[1].major_version, 4);
        assert_eq!(meta.extra.get("extraField"), Some(&serde_json::json!(7)));
    }

    #[test]
    fn test_ubername_from_main_library() {
        let meta = ContentMetadata::from_json(H5P_JSON).unwrap();
        assert_eq!(meta.ubername(), "H5P.Agamotto 1.5");
    }

    #[test]
    fn test_ubername_missing_main_library() {
        let meta = ContentMetadata {
            main_library: Some("H5P.Missing".to_string()),
            ..Default::default()
        };
        assert_eq!(meta.ubername(), "");
    }

    #[test]
    fn test_empty_author_and_title_are_absent() {
        let meta = ContentMetadata {
            title: Some(String::new()),
            authors: Some(vec![Author {
                name: String::new(),
                role: None,
            }]),
            ..Default::default()
        };
        assert_eq!(meta.first_author(), None);
        assert_eq!(meta.non_empty_title(), None);
    }

    #[test]
    fn test_library_dir_name() {
        let lib = LibraryName::new("H5P.Agamotto", 1, 5);
        assert_eq!(lib.dir_name(), "H5P.Agamotto-1.5");
        assert_eq!(LibraryName::parse_dir_name("H5P.Agamotto-1.5").unwrap(), lib);
        assert_eq!(
            LibraryName::parse_dir_name("H5P.Drag-N-Drop-2.10").unwrap(),
            LibraryName::new("H5P.Drag-N-Drop", 2, 10)
        );
        assert!(LibraryName::parse_dir_name("content").is_err());
        assert!(LibraryName::parse_dir_name("-1.2").is_err());
        assert!(LibraryName::parse_dir_name("Lib-1").is_err());
    }
}
