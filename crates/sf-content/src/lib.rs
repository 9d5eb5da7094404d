//! Content ingestion and storage for scormify.
//!
//! A source package is a ZIP archive containing:
//! - `h5p.json`: title, authors, language, main library, dependencies
//! - `content/content.json`: the content parameters
//! - `content/<files>`: media and other files the parameters reference
//! - `<Library-x.y>/library.json` plus library files, one directory per library
//!
//! Ingestion decodes the package, installs any libraries not yet present in
//! [`LibraryStorage`], and copies the content files into a temporary entry of
//! a [`ContentStore`]. Saving promotes that temporary entry to a content
//! entry the renderer can read.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sf_common::ActorId;
//! use sf_content::{FsContentStore, Ingestor, LibraryStorage};
//!
//! let store = Arc::new(FsContentStore::new("/var/lib/scormify/content"));
//! let libraries = Arc::new(LibraryStorage::new("/var/lib/scormify/libraries"));
//! let ingestor = Ingestor::new(store, libraries);
//!
//! let buffer = std::fs::read("course.h5p").unwrap();
//! let package = ingestor.ingest(&buffer, &ActorId::converter()).unwrap();
//! println!("{:?}", package.metadata.title);
//! ```

pub mod decoder;
pub mod error;
pub mod ingest;
pub mod library;
pub mod path;
pub mod store;

pub use decoder::{PackageDecoder, PackageLibrary};
pub use error::{ContentError, IngestError, Result};
pub use ingest::{IngestedPackage, Ingestor};
pub use library::{LibraryMetadata, LibraryStorage, PreloadedFile};
pub use path::safe_relative_path;
pub use store::{ContentStore, FsContentStore};
