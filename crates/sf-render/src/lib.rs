//! Standalone HTML bundle renderer.
//!
//! Turns a saved content entry into one self-contained HTML document plus
//! the list of content files that document references.
//!
//! # Features
//!
//! - **Core runtime**: the H5P player core is inlined ahead of the libraries
//!   and started once the page has loaded
//! - **Inlined libraries**: every preloaded script and stylesheet of the main
//!   library and its transitive dependencies is inlined, dependencies first
//! - **Embedded assets**: fonts and images referenced from library CSS become
//!   `data:` URIs
//! - **External content files**: media referenced by the content parameters
//!   stay separate files, listed in [`RenderedBundle::resource_files`]
//! - **SCORM template**: margins, optional centered max width, and the two
//!   runtime support scripts
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sf_common::{ActorId, ContentId, ConversionOptions};
//! use sf_content::{FsContentStore, LibraryStorage};
//! use sf_render::{HtmlRenderer, RenderOptions, Renderer};
//!
//! let renderer = HtmlRenderer::new(
//!     Arc::new(FsContentStore::new("content")),
//!     Arc::new(LibraryStorage::new("libraries")),
//! );
//! let options = RenderOptions::from(&ConversionOptions::new(80.0));
//! let id = ContentId::parse("abc123").unwrap();
//! let bundle = renderer.render(&id, &options, &ActorId::converter()).unwrap();
//! println!("{} files", bundle.resource_files.len());
//! ```

pub mod assets;
pub mod config;
pub mod error;
pub mod html;
pub mod references;
pub mod renderer;
pub mod runtime;
pub mod template;

pub use config::RenderOptions;
pub use error::{RenderError, Result};
pub use html::HtmlRenderer;
pub use references::collect_content_files;
pub use renderer::{RenderedBundle, Renderer};
pub use runtime::{CoreAssets, CoreBundle};
pub use template::{ScormTemplate, ADAPTOR_SCRIPT, SCORM_WRAPPER_SCRIPT};
