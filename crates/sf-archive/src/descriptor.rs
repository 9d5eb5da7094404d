//! Packaging metadata handed to the archiver.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::naming::archive_file_name;

/// SCORM version written into the manifest.
pub const SCORM_VERSION: &str = "1.2";

/// Manifest identifier.
pub const PACKAGE_IDENTIFIER: &str = "00";

/// Entry page of every package.
pub const STARTING_PAGE: &str = "index.html";

/// Version tag used in archive names.
pub const PACKAGE_VERSION: &str = "1.0.0";

/// Archive-level packaging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub version: String,
    pub zip: bool,
    /// Directory the archive is written to.
    pub output_dir: PathBuf,
    pub date: NaiveDate,
}

impl PackageInfo {
    /// Date stamp as `YYYY-MM-DD`.
    pub fn date_stamp(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Everything the archiver needs to know about one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// SCORM version.
    pub version: String,
    pub organization: String,
    pub title: String,
    pub language: String,
    pub identifier: String,
    pub mastery_score: f64,
    pub starting_page: String,
    pub package: PackageInfo,
}

impl PackageDescriptor {
    pub fn new(
        title: impl Into<String>,
        organization: impl Into<String>,
        language: impl Into<String>,
        mastery_score: f64,
        output_dir: impl Into<PathBuf>,
        date: NaiveDate,
    ) -> Self {
        Self {
            version: SCORM_VERSION.to_string(),
            organization: organization.into(),
            title: title.into(),
            language: language.into(),
            identifier: PACKAGE_IDENTIFIER.to_string(),
            mastery_score,
            starting_page: STARTING_PAGE.to_string(),
            package: PackageInfo {
                version: PACKAGE_VERSION.to_string(),
                zip: true,
                output_dir: output_dir.into(),
                date,
            },
        }
    }

    /// Name of the archive this descriptor produces.
    pub fn file_name(&self) -> String {
        archive_file_name(
            &self.title,
            &self.package.version,
            &self.package.date_stamp(),
        )
    }

    /// Full path of the archive this descriptor produces.
    pub fn archive_path(&self) -> PathBuf {
        self.package.output_dir.join(self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> PackageDescriptor {
        let date = NaiveDate::from_ymd_opt(2022, 5, 10).unwrap();
        PackageDescriptor::new("Agamotto!", "Jane Roe", "en", 80.0, "/tmp/out", date)
    }

    #[test]
    fn test_fixed_fields() {
        let d = descriptor();
        assert_eq!(d.version, "1.2");
        assert_eq!(d.identifier, "00");
        assert_eq!(d.starting_page, "index.html");
        assert_eq!(d.package.version, "1.0.0");
        assert!(d.package.zip);
    }

    #[test]
    fn test_file_name_and_path() {
        let d = descriptor();
        assert_eq!(d.package.date_stamp(), "2022-05-10");
        assert_eq!(d.file_name(), "Agamotto_v1.0.0_2022-05-10.zip");
        assert_eq!(
            d.archive_path(),
            PathBuf::from("/tmp/out/Agamotto_v1.0.0_2022-05-10.zip")
        );
    }
}
