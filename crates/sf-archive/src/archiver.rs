//! The archiver capability and the SCORM zip writer.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::descriptor::PackageDescriptor;
use crate::error::{ArchiveError, Result};
use crate::manifest::{render_manifest, MANIFEST_FILE};

/// Packs a source directory into an archive.
///
/// Blocks until the archive is completely written; the returned path
/// names a finished file.
pub trait Archiver: Send + Sync {
    fn build(&self, source_dir: &Path, descriptor: &PackageDescriptor) -> Result<PathBuf>;
}

/// Writes SCORM 1.2 zip packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScormArchiver;

impl ScormArchiver {
    pub fn new() -> Self {
        Self
    }

    fn write_archive(
        &self,
        target: &Path,
        source_dir: &Path,
        descriptor: &PackageDescriptor,
        files: &[String],
    ) -> Result<()> {
        let mut zip = ZipWriter::new(BufWriter::new(File::create(target)?));
        let options: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(if descriptor.package.zip {
                CompressionMethod::Deflated
            } else {
                CompressionMethod::Stored
            })
            .unix_permissions(0o644);

        // Manifest first
        let manifest = render_manifest(descriptor, files)?;
        zip.start_file(MANIFEST_FILE, options)?;
        zip.write_all(manifest.as_bytes())?;

        for name in files {
            zip.start_file(name.as_str(), options)?;
            let mut source = File::open(source_dir.join(name))?;
            io::copy(&mut source, &mut zip)?;
        }

        let mut out = zip.finish()?;
        out.flush()?;
        Ok(())
    }
}

impl Archiver for ScormArchiver {
    fn build(&self, source_dir: &Path, descriptor: &PackageDescriptor) -> Result<PathBuf> {
        if !source_dir.is_dir() {
            return Err(ArchiveError::SourceNotFound(source_dir.to_path_buf()));
        }
        if !source_dir.join(&descriptor.starting_page).is_file() {
            return Err(ArchiveError::MissingStartingPage(
                descriptor.starting_page.clone(),
            ));
        }

        let files = collect_files(source_dir)?;
        let target = descriptor.archive_path();
        fs::create_dir_all(&descriptor.package.output_dir)?;

        // Written under a temporary name so a failed build leaves nothing
        // at the target path.
        let partial = PathBuf::from(format!("{}.part", target.display()));
        if let Err(e) = self.write_archive(&partial, source_dir, descriptor, &files) {
            if let Err(cleanup) = fs::remove_file(&partial) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial archive");
                }
            }
            return Err(e);
        }
        fs::rename(&partial, &target)?;

        info!(
            archive = %target.display(),
            files = files.len(),
            title = %descriptor.title,
            "Archive written"
        );

        Ok(target)
    }
}

/// Every regular file under `root` as a sorted list of `/`-separated paths.
///
/// A stale manifest in the source is skipped; the archive always gets a
/// fresh one.
fn collect_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| ArchiveError::InvalidFileName(entry.path().to_path_buf()))?;
        let mut parts = Vec::new();
        for component in rel.components() {
            let part = component
                .as_os_str()
                .to_str()
                .ok_or_else(|| ArchiveError::InvalidFileName(rel.to_path_buf()))?;
            parts.push(part);
        }
        let name = parts.join("/");
        if name == MANIFEST_FILE {
            debug!("Skipping manifest already present in source");
            continue;
        }
        files.push(name);
    }
    files.sort();
    Ok(files)
}
