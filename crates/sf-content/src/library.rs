//! Library storage and dependency resolution.
//!
//! Libraries live in `<root>/<machineName>-<major>.<minor>/` with a
//! `library.json` describing the scripts and styles to preload and the
//! libraries they depend on. Storage is shared across conversions and
//! read-mostly: an installed library is never overwritten.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use sf_common::LibraryName;

use crate::error::{ContentError, Result};
use crate::path::safe_relative_path;

/// Library manifest file name.
pub const LIBRARY_MANIFEST: &str = "library.json";

/// A file listed under `preloadedJs` / `preloadedCss`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadedFile {
    pub path: String,
}

/// Parsed `library.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub name: LibraryName,
    #[serde(default)]
    pub patch_version: u32,
    #[serde(default)]
    pub runnable: u8,
    #[serde(default)]
    pub preloaded_js: Vec<PreloadedFile>,
    #[serde(default)]
    pub preloaded_css: Vec<PreloadedFile>,
    #[serde(default)]
    pub preloaded_dependencies: Vec<LibraryName>,
}

impl LibraryMetadata {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Filesystem-backed library storage.
#[derive(Debug, Clone)]
pub struct LibraryStorage {
    root: PathBuf,
}

impl LibraryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn library_dir(&self, library: &LibraryName) -> PathBuf {
        self.root.join(library.dir_name())
    }

    /// Whether `library` is installed.
    pub fn is_installed(&self, library: &LibraryName) -> bool {
        self.library_dir(library).join(LIBRARY_MANIFEST).is_file()
    }

    /// Read and parse the library's `library.json`.
    pub fn metadata(&self, library: &LibraryName) -> Result<LibraryMetadata> {
        let path = self.library_dir(library).join(LIBRARY_MANIFEST);
        let json = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ContentError::LibraryNotFound(library.dir_name()),
            _ => ContentError::Io(e),
        })?;
        LibraryMetadata::from_json(&json)
    }

    /// Open a file inside a library directory.
    pub fn open_file(&self, library: &LibraryName, path: &str) -> Result<File> {
        let rel = safe_relative_path(path)?;
        File::open(self.library_dir(library).join(rel)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ContentError::LibraryFileNotFound {
                library: library.dir_name(),
                path: path.to_string(),
            },
            _ => ContentError::Io(e),
        })
    }

    /// Read a library file fully.
    pub fn read_file(&self, library: &LibraryName, path: &str) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.open_file(library, path)?.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read a library file as UTF-8 text.
    pub fn read_text(&self, library: &LibraryName, path: &str) -> Result<String> {
        let data = self.read_file(library, path)?;
        String::from_utf8(data).map_err(|_| {
            ContentError::InvalidPackage(format!(
                "{}/{} is not valid UTF-8",
                library.dir_name(),
                path
            ))
        })
    }

    /// Install a library from a fully populated staging directory.
    ///
    /// The staging directory must live under the storage root so the final
    /// step is an atomic rename. Returns `false` (and discards the staging
    /// directory) when the library was already installed, including when a
    /// concurrent installer won the race.
    pub fn install_from_dir(&self, library: &LibraryName, staging: &Path) -> Result<bool> {
        let target = self.library_dir(library);
        if self.is_installed(library) {
            fs::remove_dir_all(staging)?;
            debug!(library = %library, "Library already installed");
            return Ok(false);
        }

        match fs::rename(staging, &target) {
            Ok(()) => {
                info!(library = %library, "Library installed");
                Ok(true)
            }
            Err(_) if self.is_installed(library) => {
                fs::remove_dir_all(staging)?;
                debug!(library = %library, "Library installed concurrently");
                Ok(false)
            }
            Err(e) => {
                let _ = fs::remove_dir_all(staging);
                Err(ContentError::Io(e))
            }
        }
    }

    /// Create a uniquely named staging directory under the storage root.
    pub fn create_staging_dir(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let dir = self
            .root
            .join(format!(".install-{}", uuid::Uuid::new_v4().simple()));
        fs::create_dir(&dir)?;
        Ok(dir)
    }

    /// Resolve `roots` and their transitive dependencies.
    ///
    /// The result lists every library once, dependencies before the
    /// libraries that need them. Cycles are tolerated.
    pub fn resolve_dependencies(&self, roots: &[LibraryName]) -> Result<Vec<LibraryMetadata>> {
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        for root in roots {
            self.visit(root, &mut visited, &mut ordered)?;
        }
        Ok(ordered)
    }

    fn visit(
        &self,
        library: &LibraryName,
        visited: &mut HashSet<LibraryName>,
        ordered: &mut Vec<LibraryMetadata>,
    ) -> Result<()> {
        if !visited.insert(library.clone()) {
            return Ok(());
        }
        let metadata = self.metadata(library)?;
        for dep in &metadata.preloaded_dependencies {
            self.visit(dep, visited, ordered)?;
        }
        ordered.push(metadata);
        Ok(())
    }
}
