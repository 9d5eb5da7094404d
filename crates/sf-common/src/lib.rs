//! Shared types for the scormify conversion pipeline.
//!
//! This crate provides the vocabulary every pipeline stage speaks:
//! - Content and actor identities
//! - Caller-supplied conversion options
//! - Content metadata as found in a package's `h5p.json`
//! - Localized default strings for missing metadata

pub mod error;
pub mod i18n;
pub mod id;
pub mod metadata;
pub mod options;

pub use error::{Error, Result};
pub use i18n::{keys, StaticTranslator, Translator};
pub use id::{ActorId, ContentId};
pub use metadata::{Author, ContentMetadata, LibraryName};
pub use options::ConversionOptions;
