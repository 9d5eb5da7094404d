//! Staging materializer.
//!
//! Lays out one conversion's package tree in a fresh temporary directory:
//!
//! ```text
//! <staging>/h5p-adaptor.js
//! <staging>/SCORM_API_wrapper.js
//! <staging>/index.html
//! <staging>/<resource path>      one per referenced content file
//! ```
//!
//! The directory is a [`TempDir`]: dropping it removes the tree on every
//! exit path.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use sf_archive::MANIFEST_FILE;
use sf_common::{ActorId, ContentId};
use sf_content::{safe_relative_path, ContentStore};
use sf_render::{RenderedBundle, ADAPTOR_SCRIPT, SCORM_WRAPPER_SCRIPT};

use crate::error::{ConvertError, Result};

/// Name of the rendered document inside the staging tree.
pub const INDEX_FILE: &str = "index.html";

/// Prefix of staging directory names.
const STAGING_PREFIX: &str = "scormify-";

/// Staging names owned by the converter. A content file may not use them.
const RESERVED_NAMES: [&str; 4] = [
    INDEX_FILE,
    ADAPTOR_SCRIPT,
    SCORM_WRAPPER_SCRIPT,
    MANIFEST_FILE,
];

const EMBEDDED_ADAPTOR: &str = include_str!("../assets/h5p-adaptor.js");
const EMBEDDED_WRAPPER: &str = include_str!("../assets/SCORM_API_wrapper.js");

/// Source of the two runtime support scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SupportScripts {
    /// Copies compiled into the binary.
    #[default]
    Embedded,
    /// A directory containing both scripts under their canonical names.
    Directory(PathBuf),
}

impl SupportScripts {
    /// Use `dir` when given, else the embedded copies.
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => SupportScripts::Directory(dir.to_path_buf()),
            None => SupportScripts::Embedded,
        }
    }

    /// Write both scripts into `dest`.
    pub fn install(&self, dest: &Path) -> Result<()> {
        for name in [ADAPTOR_SCRIPT, SCORM_WRAPPER_SCRIPT] {
            match self {
                SupportScripts::Embedded => {
                    let body = if name == ADAPTOR_SCRIPT {
                        EMBEDDED_ADAPTOR
                    } else {
                        EMBEDDED_WRAPPER
                    };
                    fs::write(dest.join(name), body)
                        .map_err(|e| ConvertError::resource_copy(name, e))?;
                }
                SupportScripts::Directory(dir) => {
                    fs::copy(dir.join(name), dest.join(name))
                        .map_err(|e| ConvertError::resource_copy(name, e))?;
                }
            }
        }
        Ok(())
    }
}

/// Builds staging trees from rendered bundles.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    scripts: SupportScripts,
}

impl Materializer {
    pub fn new(scripts: SupportScripts) -> Self {
        Self { scripts }
    }

    /// Create a staging directory under `parent` and populate it.
    ///
    /// Every resource path is copied from the store's saved entry
    /// `content_id`. The first failing copy aborts; the returned error names
    /// the path and the partially written directory is removed.
    pub fn materialize(
        &self,
        bundle: &RenderedBundle,
        content_id: &ContentId,
        store: &dyn ContentStore,
        actor: &ActorId,
        parent: &Path,
    ) -> Result<TempDir> {
        let parent_name = parent.display().to_string();
        fs::create_dir_all(parent).map_err(|e| ConvertError::resource_copy(&parent_name, e))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| ConvertError::resource_copy(parent_name, e))?;
        let root = staging.path();

        self.scripts.install(root)?;
        fs::write(root.join(INDEX_FILE), &bundle.html)
            .map_err(|e| ConvertError::resource_copy(INDEX_FILE, e))?;

        for path in &bundle.resource_files {
            copy_resource(store, content_id, path, actor, root)?;
        }

        debug!(
            content_id = %content_id,
            staging_dir = %root.display(),
            files = bundle.resource_files.len(),
            "staging directory materialized"
        );
        Ok(staging)
    }
}

fn copy_resource(
    store: &dyn ContentStore,
    content_id: &ContentId,
    path: &str,
    actor: &ActorId,
    root: &Path,
) -> Result<()> {
    if is_reserved(path) {
        return Err(ConvertError::resource_copy(
            path,
            format!("'{path}' is reserved for the package itself"),
        ));
    }
    let relative = safe_relative_path(path).map_err(|e| ConvertError::resource_copy(path, e))?;
    let dest = root.join(relative);
    if let Some(dir) = dest.parent() {
        fs::create_dir_all(dir).map_err(|e| ConvertError::resource_copy(path, e))?;
    }

    let mut reader = store
        .get_file_stream(content_id, path, actor)
        .map_err(|e| ConvertError::resource_copy(path, e))?;
    let file = File::create(&dest).map_err(|e| ConvertError::resource_copy(path, e))?;
    let mut writer = BufWriter::new(file);
    io::copy(&mut reader, &mut writer).map_err(|e| ConvertError::resource_copy(path, e))?;
    writer.flush().map_err(|e| ConvertError::resource_copy(path, e))?;
    Ok(())
}

/// Case-insensitive so the check also holds on case-folding filesystems.
fn is_reserved(path: &str) -> bool {
    RESERVED_NAMES
        .iter()
        .any(|name| path.eq_ignore_ascii_case(name))
}
