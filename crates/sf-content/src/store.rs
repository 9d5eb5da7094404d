//! Content store.
//!
//! The store holds two kinds of entries:
//! - temporary entries, filled by ingestion, identified by a fresh id
//! - saved entries, created by promoting a temporary entry
//!
//! Every call takes the acting [`ActorId`] explicitly. Operations keyed by
//! distinct ids never touch each other's files.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use sf_common::{ActorId, ContentId, ContentMetadata};

use crate::error::{ContentError, Result};
use crate::path::safe_relative_path;

/// Storage for content entries.
pub trait ContentStore: Send + Sync {
    /// Allocate a new, empty temporary entry.
    fn create_temporary(&self, actor: &ActorId) -> Result<ContentId>;

    /// Stream `reader` into `path` of a temporary entry. Returns bytes written.
    fn add_temporary_file(
        &self,
        temporary: &ContentId,
        path: &str,
        reader: &mut dyn Read,
        actor: &ActorId,
    ) -> Result<u64>;

    /// Whether a temporary entry exists.
    fn temporary_exists(&self, temporary: &ContentId) -> bool;

    /// Remove a temporary entry and all its files.
    fn delete_temporary(&self, temporary: &ContentId, actor: &ActorId) -> Result<()>;

    /// Create (`content_id == None`) or update a saved entry.
    ///
    /// When `files_from` names a temporary entry, its files move into the
    /// saved entry and the temporary entry ceases to exist.
    fn save_or_update_content(
        &self,
        content_id: Option<&ContentId>,
        parameters: &serde_json::Value,
        metadata: &ContentMetadata,
        main_library: &str,
        files_from: Option<&ContentId>,
        actor: &ActorId,
    ) -> Result<ContentId>;

    /// Open a readable stream over one file of a saved entry.
    fn get_file_stream(
        &self,
        content_id: &ContentId,
        path: &str,
        actor: &ActorId,
    ) -> Result<Box<dyn Read + Send>>;

    fn get_content_metadata(&self, content_id: &ContentId, actor: &ActorId) -> Result<ContentMetadata>;

    fn get_parameters(&self, content_id: &ContentId, actor: &ActorId) -> Result<serde_json::Value>;

    /// All file paths of a saved entry, sorted.
    fn list_files(&self, content_id: &ContentId, actor: &ActorId) -> Result<Vec<String>>;

    fn content_exists(&self, content_id: &ContentId) -> bool;

    /// Delete a saved entry and all its files.
    fn delete_content(&self, content_id: &ContentId, actor: &ActorId) -> Result<()>;
}

const METADATA_FILE: &str = "h5p.json";
const PARAMETERS_FILE: &str = "content.json";
const INFO_FILE: &str = "info.json";
const FILES_DIR: &str = "files";
const TEMPORARY_DIR: &str = ".temporary";

/// Bookkeeping written next to a saved entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryInfo {
    main_library: String,
    saved_by: String,
}

/// Filesystem-backed content store.
///
/// Layout:
/// ```text
/// <root>/<id>/h5p.json
/// <root>/<id>/content.json
/// <root>/<id>/info.json
/// <root>/<id>/files/<path>
/// <root>/.temporary/<id>/files/<path>
/// ```
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn content_dir(&self, id: &ContentId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn temporary_dir(&self, id: &ContentId) -> PathBuf {
        self.root.join(TEMPORARY_DIR).join(id.as_str())
    }

    fn require_content(&self, id: &ContentId) -> Result<PathBuf> {
        let dir = self.content_dir(id);
        if dir.join(METADATA_FILE).is_file() {
            Ok(dir)
        } else {
            Err(ContentError::ContentNotFound(id.to_string()))
        }
    }

    fn write_entry(
        &self,
        dir: &Path,
        parameters: &serde_json::Value,
        metadata: &ContentMetadata,
        main_library: &str,
        files_from: Option<&ContentId>,
        actor: &ActorId,
    ) -> Result<()> {
        fs::create_dir_all(dir)?;

        let info = EntryInfo {
            main_library: main_library.to_string(),
            saved_by: actor.id.clone(),
        };
        fs::write(dir.join(PARAMETERS_FILE), serde_json::to_vec_pretty(parameters)?)?;
        fs::write(dir.join(INFO_FILE), serde_json::to_vec_pretty(&info)?)?;

        let files = dir.join(FILES_DIR);
        match files_from {
            Some(temporary) => {
                let source = self.temporary_dir(temporary).join(FILES_DIR);
                if !source.is_dir() {
                    return Err(ContentError::ContentNotFound(temporary.to_string()));
                }
                if files.exists() {
                    fs::remove_dir_all(&files)?;
                }
                fs::rename(&source, &files)?;
                fs::remove_dir_all(self.temporary_dir(temporary))?;
            }
            None => fs::create_dir_all(&files)?,
        }

        // Written last: its presence marks the entry as complete.
        fs::write(dir.join(METADATA_FILE), serde_json::to_vec_pretty(metadata)?)?;
        Ok(())
    }
}

impl ContentStore for FsContentStore {
    fn create_temporary(&self, actor: &ActorId) -> Result<ContentId> {
        let id = ContentId::generate();
        fs::create_dir_all(self.temporary_dir(&id).join(FILES_DIR))?;
        debug!(temporary_id = %id, actor = %actor, "Temporary entry created");
        Ok(id)
    }

    fn add_temporary_file(
        &self,
        temporary: &ContentId,
        path: &str,
        reader: &mut dyn Read,
        _actor: &ActorId,
    ) -> Result<u64> {
        let files = self.temporary_dir(temporary).join(FILES_DIR);
        if !files.is_dir() {
            return Err(ContentError::ContentNotFound(temporary.to_string()));
        }
        let target = files.join(safe_relative_path(path)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        let bytes = io::copy(reader, &mut out)?;
        Ok(bytes)
    }

    fn temporary_exists(&self, temporary: &ContentId) -> bool {
        self.temporary_dir(temporary).is_dir()
    }

    fn delete_temporary(&self, temporary: &ContentId, actor: &ActorId) -> Result<()> {
        let dir = self.temporary_dir(temporary);
        if !dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&dir)?;
        debug!(temporary_id = %temporary, actor = %actor, "Temporary entry deleted");
        Ok(())
    }

    fn save_or_update_content(
        &self,
        content_id: Option<&ContentId>,
        parameters: &serde_json::Value,
        metadata: &ContentMetadata,
        main_library: &str,
        files_from: Option<&ContentId>,
        actor: &ActorId,
    ) -> Result<ContentId> {
        let id = match content_id {
            Some(id) => {
                self.require_content(id)?;
                id.clone()
            }
            None => ContentId::generate(),
        };
        let dir = self.content_dir(&id);
        let written = self.write_entry(&dir, parameters, metadata, main_library, files_from, actor);
        if let Err(e) = written {
            if content_id.is_none() {
                let _ = fs::remove_dir_all(&dir);
            }
            return Err(e);
        }

        info!(
            content_id = %id,
            main_library = %main_library,
            actor = %actor,
            "Content saved"
        );
        Ok(id)
    }

    fn get_file_stream(
        &self,
        content_id: &ContentId,
        path: &str,
        _actor: &ActorId,
    ) -> Result<Box<dyn Read + Send>> {
        let dir = self.require_content(content_id)?;
        let target = dir.join(FILES_DIR).join(safe_relative_path(path)?);
        match File::open(&target) {
            Ok(file) if file.metadata()?.is_file() => Ok(Box::new(file)),
            Ok(_) => Err(ContentError::FileNotFound {
                content_id: content_id.to_string(),
                path: path.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ContentError::FileNotFound {
                content_id: content_id.to_string(),
                path: path.to_string(),
            }),
            Err(e) => Err(ContentError::Io(e)),
        }
    }

    fn get_content_metadata(&self, content_id: &ContentId, _actor: &ActorId) -> Result<ContentMetadata> {
        let dir = self.require_content(content_id)?;
        let json = fs::read_to_string(dir.join(METADATA_FILE))?;
        Ok(ContentMetadata::from_json(&json)?)
    }

    fn get_parameters(&self, content_id: &ContentId, _actor: &ActorId) -> Result<serde_json::Value> {
        let dir = self.require_content(content_id)?;
        let json = fs::read_to_string(dir.join(PARAMETERS_FILE))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn list_files(&self, content_id: &ContentId, _actor: &ActorId) -> Result<Vec<String>> {
        let files_root = self.require_content(content_id)?.join(FILES_DIR);
        let mut out = collect_files(&files_root)?;
        out.sort();
        Ok(out)
    }

    fn content_exists(&self, content_id: &ContentId) -> bool {
        self.require_content(content_id).is_ok()
    }

    fn delete_content(&self, content_id: &ContentId, actor: &ActorId) -> Result<()> {
        let dir = self.content_dir(content_id);
        if !dir.exists() {
            return Err(ContentError::ContentNotFound(content_id.to_string()));
        }
        // Drop the marker first so a half-deleted entry never reads as present.
        let _ = fs::remove_file(dir.join(METADATA_FILE));
        fs::remove_dir_all(&dir)?;
        info!(content_id = %content_id, actor = %actor, "Content deleted");
        Ok(())
    }
}

/// Every regular file under `root` as a `/`-separated relative path.
fn collect_files(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            let rel: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            out.push(rel.join("/"));
        }
    }
    Ok(out)
}
