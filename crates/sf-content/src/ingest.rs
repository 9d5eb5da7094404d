//! Content ingestion.
//!
//! Decodes a package buffer, installs its libraries into library storage
//! and copies its content files into a fresh temporary store entry.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use sf_common::{ActorId, ContentId, ContentMetadata};

use crate::decoder::{PackageDecoder, PackageLibrary};
use crate::error::{ContentError, IngestError};
use crate::library::LibraryStorage;
use crate::path::safe_relative_path;
use crate::store::ContentStore;

/// A package persisted under a transient identity.
#[derive(Debug, Clone)]
pub struct IngestedPackage {
    /// Temporary store entry holding the content files.
    pub temporary_id: ContentId,
    pub metadata: ContentMetadata,
    pub parameters: serde_json::Value,
    /// Number of content files copied.
    pub file_count: usize,
    /// Libraries newly installed by this ingestion.
    pub installed_libraries: Vec<String>,
}

/// Turns package buffers into temporary store entries.
pub struct Ingestor {
    store: Arc<dyn ContentStore>,
    libraries: Arc<LibraryStorage>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn ContentStore>, libraries: Arc<LibraryStorage>) -> Self {
        Self { store, libraries }
    }

    /// Decode `buffer` and persist it under a new temporary identity.
    ///
    /// On failure nothing created by this call is left in the store.
    pub fn ingest(&self, buffer: &[u8], actor: &ActorId) -> Result<IngestedPackage, IngestError> {
        let mut decoder = PackageDecoder::open(buffer).map_err(IngestError::Decode)?;

        let mut installed_libraries = Vec::new();
        let package_libraries = decoder.libraries().to_vec();
        for library in &package_libraries {
            if self
                .install_library(&mut decoder, library)
                .map_err(IngestError::Persist)?
            {
                installed_libraries.push(library.metadata.name.dir_name());
            }
        }

        let temporary_id = self
            .store
            .create_temporary(actor)
            .map_err(IngestError::Persist)?;

        let file_count = match self.copy_content_files(&mut decoder, &temporary_id, actor) {
            Ok(count) => count,
            Err(e) => {
                if let Err(cleanup) = self.store.delete_temporary(&temporary_id, actor) {
                    warn!(
                        temporary_id = %temporary_id,
                        error = %cleanup,
                        "Failed to remove temporary entry after ingestion error"
                    );
                }
                return Err(IngestError::Persist(e));
            }
        };

        let (metadata, parameters) = decoder.into_parts();

        info!(
            temporary_id = %temporary_id,
            title = ?metadata.title,
            files = file_count,
            libraries_installed = installed_libraries.len(),
            "Package ingested"
        );

        Ok(IngestedPackage {
            temporary_id,
            metadata,
            parameters,
            file_count,
            installed_libraries,
        })
    }

    fn copy_content_files(
        &self,
        decoder: &mut PackageDecoder<'_>,
        temporary_id: &ContentId,
        actor: &ActorId,
    ) -> Result<usize, ContentError> {
        let files = decoder.content_files().to_vec();
        for (index, path) in &files {
            let mut entry = decoder.entry_reader(*index)?;
            let bytes = self
                .store
                .add_temporary_file(temporary_id, path, &mut entry, actor)?;
            debug!(path = %path, bytes, "Content file stored");
        }
        Ok(files.len())
    }

    /// Install one package library unless it is already present.
    fn install_library(
        &self,
        decoder: &mut PackageDecoder<'_>,
        library: &PackageLibrary,
    ) -> Result<bool, ContentError> {
        let name = &library.metadata.name;
        if self.libraries.is_installed(name) {
            return Ok(false);
        }

        let staging = self.libraries.create_staging_dir()?;
        if let Err(e) = populate_library(decoder, library, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }
        self.libraries.install_from_dir(name, &staging)
    }
}

fn populate_library(
    decoder: &mut PackageDecoder<'_>,
    library: &PackageLibrary,
    staging: &Path,
) -> Result<(), ContentError> {
    for (index, rel) in &library.entries {
        let target = staging.join(safe_relative_path(rel)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        decoder.copy_entry(*index, &mut out)?;
    }
    Ok(())
}
