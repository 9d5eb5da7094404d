//! Package decoder.
//!
//! Opens a package buffer as a ZIP archive, parses `h5p.json` and
//! `content/content.json`, and classifies the remaining entries into
//! content files and library directories. Entry data is streamed out on
//! demand, so decoding never inflates the whole package into memory.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::ZipArchive;

use sf_common::{ContentMetadata, LibraryName};

use crate::error::{ContentError, Result};
use crate::library::{LibraryMetadata, LIBRARY_MANIFEST};
use crate::path::safe_relative_path;

/// Package manifest file name.
pub const PACKAGE_MANIFEST: &str = "h5p.json";

/// Parameters file within the package.
pub const PARAMETERS_FILE: &str = "content/content.json";

const CONTENT_PREFIX: &str = "content/";

/// A library directory found inside a package.
#[derive(Debug, Clone)]
pub struct PackageLibrary {
    pub metadata: LibraryMetadata,
    /// Directory name inside the package (e.g. `H5P.Agamotto-1.5`).
    pub dir: String,
    /// `(entry index, path relative to the library directory)`.
    pub entries: Vec<(usize, String)>,
}

/// Decoded view over a package buffer.
pub struct PackageDecoder<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    metadata: ContentMetadata,
    parameters: serde_json::Value,
    content_files: Vec<(usize, String)>,
    libraries: Vec<PackageLibrary>,
}

impl<'a> PackageDecoder<'a> {
    /// Decode a package buffer.
    pub fn open(buffer: &'a [u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(buffer))?;

        let metadata_json = read_entry_text(&mut archive, PACKAGE_MANIFEST)?;
        let metadata = ContentMetadata::from_json(&metadata_json)
            .map_err(|e| ContentError::InvalidPackage(format!("{PACKAGE_MANIFEST}: {e}")))?;

        let parameters_json = read_entry_text(&mut archive, PARAMETERS_FILE)?;
        let parameters: serde_json::Value = serde_json::from_str(&parameters_json)
            .map_err(|e| ContentError::InvalidPackage(format!("{PARAMETERS_FILE}: {e}")))?;

        let mut content_files = Vec::new();
        let mut library_entries: BTreeMap<String, Vec<(usize, String)>> = BTreeMap::new();

        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            drop(entry);

            if name.starts_with("__MACOSX/") {
                continue;
            }
            safe_relative_path(&name)?;

            if let Some(rel) = name.strip_prefix(CONTENT_PREFIX) {
                if name != PARAMETERS_FILE {
                    content_files.push((index, rel.to_string()));
                }
            } else if let Some((dir, rel)) = name.split_once('/') {
                library_entries
                    .entry(dir.to_string())
                    .or_default()
                    .push((index, rel.to_string()));
            }
        }

        let mut libraries = Vec::new();
        for (dir, entries) in library_entries {
            let manifest_path = format!("{dir}/{LIBRARY_MANIFEST}");
            if !entries.iter().any(|(_, rel)| rel == LIBRARY_MANIFEST) {
                debug!(dir = %dir, "Skipping package directory without library.json");
                continue;
            }
            let json = read_entry_text(&mut archive, &manifest_path)?;
            let metadata = LibraryMetadata::from_json(&json)
                .map_err(|e| ContentError::InvalidPackage(format!("{manifest_path}: {e}")))?;
            check_library_dir(&dir, &metadata.name)?;
            libraries.push(PackageLibrary {
                metadata,
                dir,
                entries,
            });
        }

        debug!(
            title = ?metadata.title,
            content_files = content_files.len(),
            libraries = libraries.len(),
            "Package decoded"
        );

        Ok(Self {
            archive,
            metadata,
            parameters,
            content_files,
            libraries,
        })
    }

    pub fn metadata(&self) -> &ContentMetadata {
        &self.metadata
    }

    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }

    /// Content files as `(entry index, path relative to content/)`.
    pub fn content_files(&self) -> &[(usize, String)] {
        &self.content_files
    }

    pub fn libraries(&self) -> &[PackageLibrary] {
        &self.libraries
    }

    /// Stream one entry's decompressed bytes into `out`.
    pub fn copy_entry(&mut self, index: usize, out: &mut dyn Write) -> Result<u64> {
        let mut entry = self.archive.by_index(index)?;
        Ok(std::io::copy(&mut entry, out)?)
    }

    /// Open a streaming reader over one entry.
    pub fn entry_reader(&mut self, index: usize) -> Result<zip::read::ZipFile<'_>> {
        Ok(self.archive.by_index(index)?)
    }

    /// Consume the decoder, keeping only the parsed documents.
    pub fn into_parts(self) -> (ContentMetadata, serde_json::Value) {
        (self.metadata, self.parameters)
    }
}

/// A library directory is named either `machineName` or
/// `machineName-major.minor`, matching its `library.json`.
fn check_library_dir(dir: &str, name: &LibraryName) -> Result<()> {
    if dir == name.machine_name {
        return Ok(());
    }
    match LibraryName::parse_dir_name(dir) {
        Ok(parsed) if &parsed == name => Ok(()),
        _ => Err(ContentError::InvalidPackage(format!(
            "library directory '{dir}' does not match {LIBRARY_MANIFEST} ({})",
            name.dir_name()
        ))),
    }
}

fn read_entry_text(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => ContentError::MissingFile(name.to_string()),
        other => ContentError::Zip(other),
    })?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|_| ContentError::InvalidPackage(format!("{name} is not valid UTF-8")))?;
    Ok(text)
}
