//! Exit codes for the scormify CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/input errors (recoverable by fixing the input)
//! - 20-29: Internal and environment errors

use crate::error::ConvertError;

/// Exit codes for scormify operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Input Errors (10-19)
    // ========================================================================
    /// Invalid arguments, options or configuration
    ArgsError = 10,

    /// Source package cannot be decoded
    PackageError = 11,

    /// Content cannot be rendered
    RenderError = 12,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// Storage, staging, packaging or other I/O failure
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is a user/input error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::PackageError => "ERR_PACKAGE",
            ExitCode::RenderError => "ERR_RENDER",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&ConvertError> for ExitCode {
    fn from(err: &ConvertError) -> Self {
        match err {
            ConvertError::Validation(_) | ConvertError::Config(_) => ExitCode::ArgsError,
            ConvertError::PackageDecode(_) => ExitCode::PackageError,
            ConvertError::Render(_) => ExitCode::RenderError,
            ConvertError::ContentPersist(_)
            | ConvertError::ResourceCopy { .. }
            | ConvertError::Packaging(_)
            | ConvertError::Io(_) => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_content::ContentError;

    #[test]
    fn test_error_mapping() {
        let validation = ConvertError::Validation("masteryScore is required".into());
        assert_eq!(ExitCode::from(&validation), ExitCode::ArgsError);

        let decode = ConvertError::PackageDecode(ContentError::MissingFile("h5p.json".into()));
        assert_eq!(ExitCode::from(&decode), ExitCode::PackageError);

        let io = ConvertError::Io(std::io::Error::other("disk full"));
        assert_eq!(ExitCode::from(&io), ExitCode::IoError);
    }

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::ArgsError.is_user_error());
        assert!(ExitCode::RenderError.is_user_error());
        assert!(!ExitCode::IoError.is_user_error());
        assert_eq!(ExitCode::IoError.to_string(), "ERR_IO (21)");
    }
}
