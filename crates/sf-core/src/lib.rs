//! Scormify core library.
//!
//! Converts H5P packages into SCORM 1.2 archives:
//! - Staging directory materialization
//! - Pipeline coordination with unconditional cleanup
//! - Request validation and the optional HTTP endpoint
//! - Configuration resolution, logging and exit codes
//!
//! The binary entry point is in `main.rs`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sf_common::ConversionOptions;
//! use sf_content::{FsContentStore, LibraryStorage};
//! use sf_core::Converter;
//!
//! let converter = Converter::new(
//!     Arc::new(FsContentStore::new("/var/lib/scormify/content")),
//!     Arc::new(LibraryStorage::new("/var/lib/scormify/libraries")),
//! );
//! let buffer = std::fs::read("course.h5p").unwrap();
//! let archive = converter.convert(&buffer, &ConversionOptions::new(80.0)).unwrap();
//! std::fs::write("course.zip", archive).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod pipeline;
pub mod request;
pub mod staging;

// HTTP endpoint (optional, behind "server" feature)
#[cfg(feature = "server")]
pub mod server;

pub use config::{ConfigResolution, ConverterConfig};
pub use error::{ConvertError, ErrorCategory, ErrorResponse, Result};
pub use exit_codes::ExitCode;
pub use pipeline::{Clock, ConversionOutcome, ConvertedArchive, Converter, FixedClock, SystemClock};
pub use request::{process, suggested_file_name, ConvertRequest, ConvertResponse};
pub use staging::{Materializer, SupportScripts};

#[cfg(feature = "server")]
pub use server::ConvertServer;
