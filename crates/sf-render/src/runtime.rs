//! H5P core runtime.
//!
//! Content type libraries build on the player core (`h5p.js`, the event
//! dispatcher, the xAPI bridge and the bundled jQuery). The core ships as a
//! separate directory laid out like the upstream `h5p/core` tree:
//!
//! ```text
//! <core>/js/jquery.js
//! <core>/js/h5p.js
//! <core>/styles/h5p.css
//! <core>/fonts/...
//! ```
//!
//! Its scripts and styles are inlined ahead of every library.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::assets::embed_css_assets;
use crate::error::{RenderError, Result};

/// Core scripts in load order.
pub const CORE_SCRIPTS: &[&str] = &[
    "js/jquery.js",
    "js/h5p.js",
    "js/h5p-event-dispatcher.js",
    "js/h5p-x-api-event.js",
    "js/h5p-x-api.js",
    "js/h5p-content-type.js",
    "js/h5p-confirmation-dialog.js",
    "js/h5p-action-bar.js",
    "js/request-queue.js",
];

/// Core stylesheets in load order.
pub const CORE_STYLES: &[&str] = &[
    "styles/h5p.css",
    "styles/h5p-confirmation-dialog.css",
    "styles/h5p-core-button.css",
];

/// Inlined core runtime, ready for the page template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreBundle {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

impl CoreBundle {
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Location of the core runtime files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreAssets {
    dir: Option<PathBuf>,
}

impl CoreAssets {
    /// No core: pages rely on the host to provide the H5P runtime.
    pub fn none() -> Self {
        Self { dir: None }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Read every core script and stylesheet.
    ///
    /// A missing file fails the render: a page with half a runtime never
    /// starts.
    pub fn load(&self) -> Result<CoreBundle> {
        let Some(dir) = &self.dir else {
            return Ok(CoreBundle::default());
        };

        let read = |path: &str| {
            fs::read_to_string(dir.join(path)).map_err(|source| RenderError::MissingCoreAsset {
                path: path.to_string(),
                source,
            })
        };

        let mut bundle = CoreBundle::default();
        for path in CORE_STYLES {
            let css = read(path)?;
            bundle
                .styles
                .push(embed_css_assets(&css, path, |asset| fs::read(dir.join(asset)).ok()));
        }
        for path in CORE_SCRIPTS {
            bundle.scripts.push(read(path)?);
        }

        debug!(
            core_dir = %dir.display(),
            scripts = bundle.scripts.len(),
            styles = bundle.styles.len(),
            "Core runtime loaded"
        );
        Ok(bundle)
    }
}
