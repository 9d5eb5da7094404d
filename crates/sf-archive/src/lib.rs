//! SCORM 1.2 archive assembly.
//!
//! Packs a staging directory into a zip with an `imsmanifest.xml`,
//! named `<title>_v<version>_<date>.zip` after the sanitized title.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use sf_archive::{Archiver, PackageDescriptor, ScormArchiver};
//!
//! let date = NaiveDate::from_ymd_opt(2022, 5, 10).unwrap();
//! let descriptor = PackageDescriptor::new("Agamotto!", "Jane Roe", "en", 80.0, "/tmp/out", date);
//! let archive = ScormArchiver::new().build("/tmp/staging".as_ref(), &descriptor).unwrap();
//! assert!(archive.ends_with("Agamotto_v1.0.0_2022-05-10.zip"));
//! ```

pub mod archiver;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod naming;

pub use archiver::{Archiver, ScormArchiver};
pub use descriptor::{PackageDescriptor, PackageInfo};
pub use error::{ArchiveError, Result};
pub use manifest::{render_manifest, MANIFEST_FILE};
pub use naming::{archive_file_name, sanitize_title};
