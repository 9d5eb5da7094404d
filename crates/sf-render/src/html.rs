//! Standalone HTML renderer over content and library storage.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use sf_common::{ActorId, ContentId, ContentMetadata};
use sf_content::{ContentError, ContentStore, LibraryMetadata, LibraryStorage};

use crate::assets::embed_css_assets;
use crate::config::RenderOptions;
use crate::error::{RenderError, Result};
use crate::references::collect_content_files;
use crate::renderer::{RenderedBundle, Renderer};
use crate::runtime::CoreAssets;
use crate::template::{PageParts, ScormTemplate};

/// Renders saved content into one self-contained HTML document.
pub struct HtmlRenderer {
    store: Arc<dyn ContentStore>,
    libraries: Arc<LibraryStorage>,
    core: CoreAssets,
}

impl HtmlRenderer {
    pub fn new(store: Arc<dyn ContentStore>, libraries: Arc<LibraryStorage>) -> Self {
        Self {
            store,
            libraries,
            core: CoreAssets::none(),
        }
    }

    /// Inline the H5P core runtime from `core` ahead of the libraries.
    pub fn with_core(mut self, core: CoreAssets) -> Self {
        self.core = core;
        self
    }

    fn inline_library(
        &self,
        library: &LibraryMetadata,
        styles: &mut Vec<String>,
        scripts: &mut Vec<String>,
    ) -> Result<()> {
        let name = &library.name;
        for css in &library.preloaded_css {
            let text = self
                .libraries
                .read_text(name, &css.path)
                .map_err(unresolved)?;
            styles.push(embed_css_assets(&text, &css.path, |path| {
                self.libraries.read_file(name, path).ok()
            }));
        }
        for js in &library.preloaded_js {
            scripts.push(self.libraries.read_text(name, &js.path).map_err(unresolved)?);
        }
        debug!(
            library = %name.ubername(),
            css = library.preloaded_css.len(),
            js = library.preloaded_js.len(),
            "Library inlined"
        );
        Ok(())
    }
}

impl Renderer for HtmlRenderer {
    fn render(
        &self,
        content_id: &ContentId,
        options: &RenderOptions,
        actor: &ActorId,
    ) -> Result<RenderedBundle> {
        let metadata = self.store.get_content_metadata(content_id, actor)?;
        let parameters = self.store.get_parameters(content_id, actor)?;

        let main = metadata.main_library_name().ok_or_else(|| {
            RenderError::MissingMainLibrary(metadata.main_library.clone().unwrap_or_default())
        })?;

        let libraries = self
            .libraries
            .resolve_dependencies(&metadata.preloaded_dependencies)
            .map_err(unresolved)?;

        let core = self.core.load()?;
        if core.is_empty() {
            warn!(
                content_id = %content_id,
                "No H5P core runtime configured; the page needs the host to provide it"
            );
        }
        let bootstrap = !core.is_empty();
        let mut styles = core.styles;
        let mut scripts = core.scripts;
        for library in &libraries {
            self.inline_library(library, &mut styles, &mut scripts)?;
        }

        let resource_files = collect_content_files(&parameters)?;

        let integration = json!({
            "url": ".",
            "postUserStatistics": false,
            "saveFreq": false,
            "l10n": {},
            "contents": {
                format!("cid-{content_id}"): {
                    "library": main.ubername(),
                    "jsonContent": serde_json::to_string(&parameters)?,
                    "fullScreen": false,
                    "contentUrl": ".",
                    "displayOptions": {
                        "frame": options.show_frame,
                        "copyright": options.show_license_button,
                        "export": false,
                        "embed": false,
                        "icon": false
                    },
                    "metadata": {
                        "title": metadata.title,
                        "license": metadata.license
                    }
                }
            }
        });

        let parts = PageParts {
            title: metadata
                .non_empty_title()
                .unwrap_or(main.machine_name.as_str())
                .to_string(),
            language: page_language(&metadata),
            styles,
            scripts,
            integration_json: serde_json::to_string(&integration)?,
            content_id: content_id.to_string(),
            bootstrap,
        };

        let html = ScormTemplate::from(options).render(&parts);
        let html = if options.minify { minify(html) } else { html };

        info!(
            content_id = %content_id,
            library = %main.ubername(),
            libraries = libraries.len(),
            resources = resource_files.len(),
            bytes = html.len(),
            "Bundle rendered"
        );

        Ok(RenderedBundle {
            html,
            resource_files,
        })
    }
}

/// Missing libraries and library files mean a dependency cannot be resolved.
fn unresolved(err: ContentError) -> RenderError {
    match err {
        ContentError::LibraryNotFound(library) => RenderError::UnresolvedDependency(library),
        ContentError::LibraryFileNotFound { library, path } => {
            RenderError::UnresolvedDependency(format!("{library}/{path}"))
        }
        other => RenderError::Content(other),
    }
}

fn page_language(metadata: &ContentMetadata) -> String {
    metadata
        .language
        .as_deref()
        .filter(|lang| !lang.is_empty() && *lang != "und")
        .or(metadata.default_language.as_deref())
        .filter(|lang| !lang.is_empty())
        .unwrap_or("en")
        .to_string()
}

fn minify(html: String) -> String {
    let cfg = minify_html::Cfg {
        minify_js: true,
        minify_css: true,
        ..Default::default()
    };
    String::from_utf8(minify_html::minify(html.as_bytes(), &cfg)).unwrap_or(html)
}
