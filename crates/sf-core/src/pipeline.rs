//! Pipeline coordinator.
//!
//! Sequences one conversion:
//!
//! ```text
//! ingest -> save -> render -> materialize -> assemble -> read -> cleanup
//! ```
//!
//! Every stage failure aborts the remaining stages. Cleanup always runs:
//! the staging and output directories are [`TempDir`]s, and the content
//! entries (temporary and saved) are deleted whether or not the
//! conversion succeeded.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use sf_archive::{Archiver, PackageDescriptor, ScormArchiver};
use sf_common::{
    keys, ActorId, ContentId, ContentMetadata, ConversionOptions, StaticTranslator, Translator,
};
use sf_content::{ContentStore, FsContentStore, Ingestor, LibraryStorage};
use sf_render::{CoreAssets, HtmlRenderer, RenderOptions, Renderer};

use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::staging::{Materializer, SupportScripts};

/// Language used when a package declares none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Prefix of per-conversion archive output directories.
const OUTPUT_PREFIX: &str = "scormify-out-";

/// Source of the date stamped into archive names.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The current UTC date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Telemetry for one successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub content_id: String,
    /// Files in the staging tree, support scripts and index included.
    pub files_staged: usize,
    /// Content files the package carried but the rendered page never references.
    pub files_skipped: usize,
    pub archive_name: String,
    pub bytes: usize,
    pub elapsed_ms: u64,
}

/// Archive bytes plus the telemetry describing how they were produced.
#[derive(Debug, Clone)]
pub struct ConvertedArchive {
    pub bytes: Vec<u8>,
    pub outcome: ConversionOutcome,
}

struct Assembled {
    bytes: Vec<u8>,
    archive_name: String,
    files_staged: usize,
    files_skipped: usize,
}

/// Converts H5P packages into SCORM 1.2 archives.
///
/// Holds no per-conversion state, so one instance can serve concurrent
/// conversions from several threads.
pub struct Converter {
    ingestor: Ingestor,
    store: Arc<dyn ContentStore>,
    renderer: Box<dyn Renderer>,
    archiver: Box<dyn Archiver>,
    materializer: Materializer,
    translator: Box<dyn Translator>,
    clock: Box<dyn Clock>,
    staging_dir: PathBuf,
    output_dir: PathBuf,
    minify: bool,
    actor: ActorId,
}

impl Converter {
    /// Converter over `store` and `libraries` with the HTML renderer, the
    /// SCORM archiver, embedded support scripts and English defaults.
    pub fn new(store: Arc<dyn ContentStore>, libraries: Arc<LibraryStorage>) -> Self {
        let renderer = HtmlRenderer::new(Arc::clone(&store), Arc::clone(&libraries));
        Self {
            ingestor: Ingestor::new(Arc::clone(&store), libraries),
            store,
            renderer: Box::new(renderer),
            archiver: Box::new(ScormArchiver::new()),
            materializer: Materializer::default(),
            translator: Box::new(StaticTranslator::english()),
            clock: Box::new(SystemClock),
            staging_dir: std::env::temp_dir(),
            output_dir: std::env::temp_dir(),
            minify: false,
            actor: ActorId::converter(),
        }
    }

    /// Build a converter from resolved configuration.
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        let store: Arc<dyn ContentStore> =
            Arc::new(FsContentStore::new(&config.storage.content_dir));
        let libraries = Arc::new(LibraryStorage::new(&config.storage.library_dir));

        let core = match &config.render.core_dir {
            Some(dir) if !dir.is_dir() => {
                return Err(ConvertError::Config(format!(
                    "core runtime directory {} does not exist",
                    dir.display()
                )));
            }
            Some(dir) => CoreAssets::from_dir(dir),
            None => CoreAssets::none(),
        };
        let renderer =
            HtmlRenderer::new(Arc::clone(&store), Arc::clone(&libraries)).with_core(core);

        let mut converter = Self::new(store, libraries)
            .with_renderer(renderer)
            .with_staging_dir(&config.storage.temp_dir)
            .with_output_dir(&config.storage.output_dir)
            .with_support_scripts(SupportScripts::from_dir(
                config.scripts.support_dir.as_deref(),
            ))
            .with_minify(config.render.minify);

        if let Some(path) = &config.i18n.locale_file {
            let translator = StaticTranslator::from_json_file(path).map_err(|e| {
                ConvertError::Config(format!("failed to load locale file {}: {}", path.display(), e))
            })?;
            converter = converter.with_translator(translator);
        }
        Ok(converter)
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_archiver(mut self, archiver: impl Archiver + 'static) -> Self {
        self.archiver = Box::new(archiver);
        self
    }

    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Parent directory of staging trees.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Parent directory of transient archive output.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_support_scripts(mut self, scripts: SupportScripts) -> Self {
        self.materializer = Materializer::new(scripts);
        self
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Convert a package buffer into SCORM 1.2 archive bytes.
    pub fn convert(&self, buffer: &[u8], options: &ConversionOptions) -> Result<Vec<u8>> {
        self.convert_detailed(buffer, options)
            .map(|converted| converted.bytes)
    }

    /// Like [`Converter::convert`], also returning conversion telemetry.
    pub fn convert_detailed(
        &self,
        buffer: &[u8],
        options: &ConversionOptions,
    ) -> Result<ConvertedArchive> {
        let started = Instant::now();
        debug!(bytes = buffer.len(), mastery_score = options.mastery_score, "conversion started");

        match self.run(buffer, options) {
            Ok((content_id, assembled)) => {
                let outcome = ConversionOutcome {
                    content_id: content_id.to_string(),
                    files_staged: assembled.files_staged,
                    files_skipped: assembled.files_skipped,
                    archive_name: assembled.archive_name,
                    bytes: assembled.bytes.len(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                };
                info!(
                    content_id = %outcome.content_id,
                    files = outcome.files_staged,
                    skipped = outcome.files_skipped,
                    archive = %outcome.archive_name,
                    bytes = outcome.bytes,
                    elapsed_ms = outcome.elapsed_ms,
                    "conversion complete"
                );
                Ok(ConvertedArchive {
                    bytes: assembled.bytes,
                    outcome,
                })
            }
            Err(e) => {
                error!(
                    code = e.code(),
                    category = %e.category(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "conversion failed"
                );
                Err(e)
            }
        }
    }

    fn run(&self, buffer: &[u8], options: &ConversionOptions) -> Result<(ContentId, Assembled)> {
        let package = self.ingestor.ingest(buffer, &self.actor)?;
        debug!(
            temporary_id = %package.temporary_id,
            files = package.file_count,
            libraries = package.installed_libraries.len(),
            "package ingested"
        );

        let saved = self.store.save_or_update_content(
            None,
            &package.parameters,
            &package.metadata,
            &package.metadata.ubername(),
            Some(&package.temporary_id),
            &self.actor,
        );
        let content_id = match saved {
            Ok(id) => id,
            Err(e) => {
                self.discard_temporary(&package.temporary_id);
                return Err(ConvertError::ContentPersist(e));
            }
        };
        debug!(content_id = %content_id, "content saved");

        let result = self.package_content(&content_id, options);

        self.discard_content(&content_id);
        self.discard_temporary(&package.temporary_id);

        result.map(|assembled| (content_id, assembled))
    }

    fn package_content(
        &self,
        content_id: &ContentId,
        options: &ConversionOptions,
    ) -> Result<Assembled> {
        let render_options = RenderOptions::from(options).with_minify(self.minify);
        let bundle = self.renderer.render(content_id, &render_options, &self.actor)?;

        let staging = self.materializer.materialize(
            &bundle,
            content_id,
            self.store.as_ref(),
            &self.actor,
            &self.staging_dir,
        )?;
        // index.html plus the two support scripts
        let files_staged = bundle.resource_files.len() + 3;

        let result = self
            .saved_entry(content_id, &bundle.resource_files)
            .and_then(|(metadata, files_skipped)| {
                self.assemble(staging.path(), &metadata, options, files_staged)
                    .map(|assembled| Assembled {
                        files_skipped,
                        ..assembled
                    })
            });
        release_dir(staging, "staging");
        result
    }

    /// Metadata as persisted for `content_id`, plus the number of stored
    /// files left out of the package.
    fn saved_entry(
        &self,
        content_id: &ContentId,
        referenced: &BTreeSet<String>,
    ) -> Result<(ContentMetadata, usize)> {
        let metadata = self
            .store
            .get_content_metadata(content_id, &self.actor)
            .map_err(ConvertError::ContentPersist)?;
        let stored = self
            .store
            .list_files(content_id, &self.actor)
            .map_err(ConvertError::ContentPersist)?;
        let skipped: Vec<_> = stored
            .iter()
            .filter(|path| !referenced.contains(*path))
            .collect();
        if !skipped.is_empty() {
            debug!(content_id = %content_id, files = ?skipped, "unreferenced content files left out");
        }
        Ok((metadata, skipped.len()))
    }

    fn assemble(
        &self,
        staging: &Path,
        metadata: &ContentMetadata,
        options: &ConversionOptions,
        files_staged: usize,
    ) -> Result<Assembled> {
        fs::create_dir_all(&self.output_dir)?;
        let output = tempfile::Builder::new()
            .prefix(OUTPUT_PREFIX)
            .tempdir_in(&self.output_dir)?;

        let descriptor = self.descriptor(metadata, options, output.path());
        let result = self
            .archiver
            .build(staging, &descriptor)
            .map_err(ConvertError::from)
            .and_then(|archive| {
                let bytes = fs::read(&archive).map_err(ConvertError::from);
                remove_archive(&archive);
                bytes
            });

        release_dir(output, "output");
        Ok(Assembled {
            bytes: result?,
            archive_name: descriptor.file_name(),
            files_staged,
            files_skipped: 0,
        })
    }

    /// Descriptor with localized fallbacks for missing metadata.
    pub fn descriptor(
        &self,
        metadata: &ContentMetadata,
        options: &ConversionOptions,
        output_dir: &Path,
    ) -> PackageDescriptor {
        let title = metadata
            .non_empty_title()
            .map(str::to_string)
            .unwrap_or_else(|| self.translator.translate(keys::DEFAULT_TITLE));
        let organization = metadata
            .first_author()
            .map(str::to_string)
            .unwrap_or_else(|| self.translator.translate(keys::DEFAULT_AUTHOR));
        let language = metadata
            .default_language
            .as_deref()
            .filter(|lang| !lang.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);

        PackageDescriptor::new(
            title,
            organization,
            language,
            options.mastery_score,
            output_dir,
            self.clock.today(),
        )
    }

    fn discard_content(&self, content_id: &ContentId) {
        if !self.store.content_exists(content_id) {
            return;
        }
        if let Err(e) = self.store.delete_content(content_id, &self.actor) {
            warn!(content_id = %content_id, error = %e, "failed to delete content");
        }
    }

    fn discard_temporary(&self, temporary_id: &ContentId) {
        if !self.store.temporary_exists(temporary_id) {
            return;
        }
        if let Err(e) = self.store.delete_temporary(temporary_id, &self.actor) {
            warn!(temporary_id = %temporary_id, error = %e, "failed to delete temporary content");
        }
    }
}

fn remove_archive(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(archive = %path.display(), error = %e, "failed to remove archive"),
    }
}

fn release_dir(dir: TempDir, kind: &str) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        warn!(dir = %path.display(), kind, error = %e, "failed to remove directory");
    }
}
