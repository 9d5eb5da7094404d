//! End-to-end conversion tests over real storage, rendering and archiving.
//!
//! Nothing is mocked except where a stage is replaced by a fake that fails
//! deterministically, to check that cleanup runs on every exit path.

use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::NaiveDate;
use sf_archive::{ArchiveError, Archiver, PackageDescriptor};
use sf_common::{ActorId, ContentId, ContentMetadata, ConversionOptions};
use sf_content::{ContentStore, FsContentStore, LibraryStorage};
use sf_core::{ConvertError, ConvertRequest, Converter, FixedClock};
use sf_render::{RenderError, RenderOptions, RenderedBundle, Renderer};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::{FileOptions, ZipWriter};
use zip::ZipArchive;

// ============================================================================
// Fixtures
// ============================================================================

fn package(title: &str) -> Vec<u8> {
    let h5p_json = format!(
        r#"{{"title":"{title}","mainLibrary":"H5P.Gallery","language":"en","defaultLanguage":"en",
            "authors":[{{"name":"Jane Roe","role":"Author"}}],
            "preloadedDependencies":[{{"machineName":"H5P.Gallery","majorVersion":1,"minorVersion":4}}]}}"#
    );
    let entries: Vec<(&str, &[u8])> = vec![
        ("h5p.json", h5p_json.as_bytes()),
        (
            "content/content.json",
            br#"{"cover":{"path":"img/a.png"},
                "slides":[{"image":{"path":"img/b.png"}},{"theme":{"path":"style.css"}},{"again":{"path":"img/a.png"}}],
                "intro":{"path":"https://example.com/intro.mp4"}}"#,
        ),
        ("content/img/a.png", b"PNG-A"),
        ("content/img/b.png", b"PNG-B"),
        ("content/style.css", b"body{margin:0}"),
        ("content/unused.txt", b"not referenced"),
        (
            "H5P.Gallery-1.4/library.json",
            br#"{"machineName":"H5P.Gallery","majorVersion":1,"minorVersion":4,
                "preloadedJs":[{"path":"gallery.js"}],"preloadedCss":[{"path":"gallery.css"}]}"#,
        ),
        ("H5P.Gallery-1.4/gallery.js", b"window.gallery = true;"),
        ("H5P.Gallery-1.4/gallery.css", b".gallery{display:flex}"),
    ];
    zip_bytes(&entries)
}

/// A package whose content carries a file under `name` and references it.
fn package_shadowing(name: &str) -> Vec<u8> {
    let h5p_json = br#"{"title":"Shadow","mainLibrary":"H5P.Gallery",
        "preloadedDependencies":[{"machineName":"H5P.Gallery","majorVersion":1,"minorVersion":4}]}"#;
    let parameters = format!(r#"{{"cover":{{"path":"{name}"}}}}"#);
    let content_path = format!("content/{name}");
    let entries: Vec<(&str, &[u8])> = vec![
        ("h5p.json", h5p_json),
        ("content/content.json", parameters.as_bytes()),
        (content_path.as_str(), b"<script>location='https://example.com'</script>"),
        (
            "H5P.Gallery-1.4/library.json",
            br#"{"machineName":"H5P.Gallery","majorVersion":1,"minorVersion":4,
                "preloadedJs":[{"path":"gallery.js"}]}"#,
        ),
        ("H5P.Gallery-1.4/gallery.js", b"window.gallery = true;"),
    ];
    zip_bytes(&entries)
}

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        let options: FileOptions<'_, ()> = FileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn converter(&self) -> Converter {
        Converter::new(
            Arc::new(FsContentStore::new(self.path("content"))),
            Arc::new(LibraryStorage::new(self.path("libraries"))),
        )
        .with_staging_dir(self.path("staging"))
        .with_output_dir(self.path("output"))
        .with_clock(FixedClock(NaiveDate::from_ymd_opt(2022, 5, 10).unwrap()))
    }

    /// Every file left under `name`, relative and sorted.
    fn leftovers(&self, name: &str) -> Vec<String> {
        let root = self.path(name);
        if !root.exists() {
            return Vec::new();
        }
        let mut files: Vec<String> = WalkDir::new(&root)
            .into_iter()
            .map(Result::unwrap)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path().strip_prefix(&root).unwrap().display().to_string())
            .collect();
        files.sort();
        files
    }

    fn assert_clean(&self) {
        assert_eq!(self.leftovers("content"), Vec::<String>::new(), "content entries left");
        assert_eq!(self.leftovers("staging"), Vec::<String>::new(), "staging files left");
        assert_eq!(self.leftovers("output"), Vec::<String>::new(), "archives left");
        for name in ["staging", "output"] {
            if let Ok(entries) = fs::read_dir(self.path(name)) {
                assert_eq!(entries.count(), 0, "directories left under {name}");
            }
        }
    }
}

fn archive_names(bytes: &[u8]) -> BTreeSet<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(String::from).collect()
}

fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

// ============================================================================
// Fakes
// ============================================================================

struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(
        &self,
        _: &ContentId,
        _: &RenderOptions,
        _: &ActorId,
    ) -> sf_render::Result<RenderedBundle> {
        Err(RenderError::MissingMainLibrary("H5P.Gallery".into()))
    }
}

/// Lists a file the content entry does not have.
struct DanglingRenderer;

impl Renderer for DanglingRenderer {
    fn render(
        &self,
        _: &ContentId,
        _: &RenderOptions,
        _: &ActorId,
    ) -> sf_render::Result<RenderedBundle> {
        Ok(RenderedBundle::new(
            "<!DOCTYPE html>",
            ["img/a.png".to_string(), "img/zz-missing.png".to_string()],
        ))
    }
}

/// Records the staging tree it was handed, then fails.
#[derive(Clone, Default)]
struct FailingArchiver {
    seen: Arc<Mutex<Option<(PathBuf, bool)>>>,
}

impl Archiver for FailingArchiver {
    fn build(&self, source_dir: &Path, _: &PackageDescriptor) -> sf_archive::Result<PathBuf> {
        let had_index = source_dir.join("index.html").exists();
        *self.seen.lock().unwrap() = Some((source_dir.to_path_buf(), had_index));
        Err(ArchiveError::MissingStartingPage("simulated".into()))
    }
}

/// Persists every entry under a normalized title.
struct RetitlingStore {
    inner: FsContentStore,
}

impl ContentStore for RetitlingStore {
    fn create_temporary(&self, actor: &ActorId) -> sf_content::Result<ContentId> {
        self.inner.create_temporary(actor)
    }

    fn add_temporary_file(
        &self,
        temporary: &ContentId,
        path: &str,
        reader: &mut dyn Read,
        actor: &ActorId,
    ) -> sf_content::Result<u64> {
        self.inner.add_temporary_file(temporary, path, reader, actor)
    }

    fn temporary_exists(&self, temporary: &ContentId) -> bool {
        self.inner.temporary_exists(temporary)
    }

    fn delete_temporary(&self, temporary: &ContentId, actor: &ActorId) -> sf_content::Result<()> {
        self.inner.delete_temporary(temporary, actor)
    }

    fn save_or_update_content(
        &self,
        content_id: Option<&ContentId>,
        parameters: &serde_json::Value,
        metadata: &ContentMetadata,
        main_library: &str,
        files_from: Option<&ContentId>,
        actor: &ActorId,
    ) -> sf_content::Result<ContentId> {
        let mut stored = metadata.clone();
        stored.title = Some("Stored Title".to_string());
        self.inner
            .save_or_update_content(content_id, parameters, &stored, main_library, files_from, actor)
    }

    fn get_file_stream(
        &self,
        content_id: &ContentId,
        path: &str,
        actor: &ActorId,
    ) -> sf_content::Result<Box<dyn Read + Send>> {
        self.inner.get_file_stream(content_id, path, actor)
    }

    fn get_content_metadata(
        &self,
        content_id: &ContentId,
        actor: &ActorId,
    ) -> sf_content::Result<ContentMetadata> {
        self.inner.get_content_metadata(content_id, actor)
    }

    fn get_parameters(
        &self,
        content_id: &ContentId,
        actor: &ActorId,
    ) -> sf_content::Result<serde_json::Value> {
        self.inner.get_parameters(content_id, actor)
    }

    fn list_files(&self, content_id: &ContentId, actor: &ActorId) -> sf_content::Result<Vec<String>> {
        self.inner.list_files(content_id, actor)
    }

    fn content_exists(&self, content_id: &ContentId) -> bool {
        self.inner.content_exists(content_id)
    }

    fn delete_content(&self, content_id: &ContentId, actor: &ActorId) -> sf_content::Result<()> {
        self.inner.delete_content(content_id, actor)
    }
}

// ============================================================================
// Success path
// ============================================================================

#[test]
fn archive_contains_exactly_the_staged_files() {
    let ws = Workspace::new();
    let converted = ws
        .converter()
        .convert_detailed(&package("Agamotto!"), &ConversionOptions::new(80.0))
        .unwrap();

    let expected: BTreeSet<String> = [
        "imsmanifest.xml",
        "index.html",
        "h5p-adaptor.js",
        "SCORM_API_wrapper.js",
        "img/a.png",
        "img/b.png",
        "style.css",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(archive_names(&converted.bytes), expected);

    assert_eq!(converted.outcome.archive_name, "Agamotto_v1.0.0_2022-05-10.zip");
    assert_eq!(converted.outcome.files_staged, 6);
    // content/unused.txt is never referenced
    assert_eq!(converted.outcome.files_skipped, 1);
    assert!(!archive_names(&converted.bytes).contains("unused.txt"));
    assert_eq!(converted.outcome.bytes, converted.bytes.len());

    assert_eq!(read_entry(&converted.bytes, "img/b.png"), "PNG-B");
    let index = read_entry(&converted.bytes, "index.html");
    assert!(index.contains("window.gallery = true;"));
    assert!(index.contains("<title>Agamotto!</title>"));

    let manifest = read_entry(&converted.bytes, "imsmanifest.xml");
    assert!(manifest.contains("<adlcp:masteryscore>80</adlcp:masteryscore>"));
    assert!(manifest.contains("Jane Roe"));
    assert!(manifest.contains(r#"href="img/a.png""#));

    ws.assert_clean();
}

#[test]
fn layout_options_reach_the_document() {
    let ws = Workspace::new();
    let options = ConversionOptions::new(50.0)
        .with_margins(12, 24)
        .with_max_width(720);
    let bytes = ws.converter().convert(&package("Layout"), &options).unwrap();

    let index = read_entry(&bytes, "index.html");
    assert!(index.contains("padding:24px 12px"));
    assert!(index.contains("max-width:720px"));
    ws.assert_clean();
}

#[test]
fn libraries_persist_across_conversions() {
    let ws = Workspace::new();
    let converter = ws.converter();
    converter.convert(&package("One"), &ConversionOptions::new(80.0)).unwrap();
    converter.convert(&package("Two"), &ConversionOptions::new(80.0)).unwrap();

    assert!(ws.path("libraries").join("H5P.Gallery-1.4").join("library.json").exists());
    ws.assert_clean();
}

#[test]
fn descriptor_follows_the_persisted_metadata() {
    let ws = Workspace::new();
    let store = Arc::new(RetitlingStore {
        inner: FsContentStore::new(ws.path("content")),
    });
    let converted = Converter::new(store, Arc::new(LibraryStorage::new(ws.path("libraries"))))
        .with_staging_dir(ws.path("staging"))
        .with_output_dir(ws.path("output"))
        .with_clock(FixedClock(NaiveDate::from_ymd_opt(2022, 5, 10).unwrap()))
        .convert_detailed(&package("Ingested Title"), &ConversionOptions::new(80.0))
        .unwrap();

    assert_eq!(converted.outcome.archive_name, "StoredTitle_v1.0.0_2022-05-10.zip");
    let manifest = read_entry(&converted.bytes, "imsmanifest.xml");
    assert!(manifest.contains("Stored Title"));
    assert!(!manifest.contains("Ingested Title"));
    ws.assert_clean();
}

#[test]
fn concurrent_conversions_with_the_same_title_do_not_collide() {
    let ws = Workspace::new();
    let converter = Arc::new(ws.converter());
    // Install libraries once so the threads only race on per-conversion state.
    converter.convert(&package("Warmup"), &ConversionOptions::new(80.0)).unwrap();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let converter = Arc::clone(&converter);
            thread::spawn(move || {
                let score = 50.0 + i as f64;
                let bytes = converter
                    .convert(&package("Same Title"), &ConversionOptions::new(score))
                    .unwrap();
                (score, read_entry(&bytes, "imsmanifest.xml"))
            })
        })
        .collect();

    for handle in handles {
        let (score, manifest) = handle.join().unwrap();
        assert!(
            manifest.contains(&format!("<adlcp:masteryscore>{score}</adlcp:masteryscore>")),
            "manifest for {score} was swapped"
        );
    }
    ws.assert_clean();
}

// ============================================================================
// Failure paths clean up
// ============================================================================

#[test]
fn decode_failure_leaves_nothing() {
    let ws = Workspace::new();
    let err = ws
        .converter()
        .convert(b"PK but not really", &ConversionOptions::new(80.0))
        .unwrap_err();
    assert!(matches!(err, ConvertError::PackageDecode(_)));
    assert_eq!(err.http_status(), 400);
    ws.assert_clean();
}

#[test]
fn render_failure_deletes_content() {
    let ws = Workspace::new();
    let err = ws
        .converter()
        .with_renderer(FailingRenderer)
        .convert(&package("Broken"), &ConversionOptions::new(80.0))
        .unwrap_err();
    assert!(matches!(err, ConvertError::Render(_)));
    ws.assert_clean();
}

#[test]
fn resource_copy_failure_names_path_and_cleans_up() {
    let ws = Workspace::new();
    let err = ws
        .converter()
        .with_renderer(DanglingRenderer)
        .convert(&package("Dangling"), &ConversionOptions::new(80.0))
        .unwrap_err();
    match &err {
        ConvertError::ResourceCopy { path, .. } => assert_eq!(path, "img/zz-missing.png"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_retryable());
    ws.assert_clean();
}

#[test]
fn content_files_cannot_replace_package_files() {
    for name in [
        "index.html",
        "h5p-adaptor.js",
        "SCORM_API_wrapper.js",
        "imsmanifest.xml",
    ] {
        let ws = Workspace::new();
        let err = ws
            .converter()
            .convert(&package_shadowing(name), &ConversionOptions::new(80.0))
            .unwrap_err();
        match &err {
            ConvertError::ResourceCopy { path, .. } => assert_eq!(path, name),
            other => panic!("{name}: unexpected error: {other}"),
        }
        ws.assert_clean();
    }
}

#[test]
fn packaging_failure_removes_staging() {
    let ws = Workspace::new();
    let archiver = FailingArchiver::default();
    let err = ws
        .converter()
        .with_archiver(archiver.clone())
        .convert(&package("Unpackable"), &ConversionOptions::new(80.0))
        .unwrap_err();
    assert!(matches!(err, ConvertError::Packaging(_)));

    let (staging, had_index) = archiver.seen.lock().unwrap().clone().unwrap();
    assert!(had_index, "archiver saw an unpopulated staging tree");
    assert!(!staging.exists(), "staging tree survived a packaging failure");
    ws.assert_clean();
}

// ============================================================================
// Request boundary
// ============================================================================

#[test]
fn missing_mastery_score_fails_before_any_io() {
    let ws = Workspace::new();
    let source = ws.path("course.h5p");
    fs::write(&source, package("Course")).unwrap();

    let request: ConvertRequest =
        serde_json::from_value(serde_json::json!({ "filePath": source })).unwrap();
    let err = sf_core::process(&ws.converter(), &request).unwrap_err();

    assert_eq!(err.to_response().status, 400);
    assert_eq!(err.to_string(), "masteryScore is required");
    assert!(!ws.path("content").exists());
    assert!(!ws.path("staging").exists());
}

#[test]
fn process_suggests_stem_based_name() {
    let ws = Workspace::new();
    let source = ws.path("My Course.h5p");
    fs::write(&source, package("Course")).unwrap();

    let request: ConvertRequest = serde_json::from_value(serde_json::json!({
        "filePath": source,
        "masteryScore": "70",
        "showRights": "true"
    }))
    .unwrap();
    let response = sf_core::process(&ws.converter(), &request).unwrap();

    assert_eq!(response.file_name, "My Course.zip");
    assert!(archive_names(&response.bytes).contains("imsmanifest.xml"));
    ws.assert_clean();
}
