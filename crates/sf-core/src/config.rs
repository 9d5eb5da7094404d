//! Converter configuration.
//!
//! Resolution order for the config file:
//! 1. Explicit `--config` flag
//! 2. `SCORMIFY_CONFIG` environment variable
//! 3. `$XDG_CONFIG_HOME/scormify/scormify.toml` (or the platform config dir)
//! 4. Built-in defaults
//!
//! `SCORMIFY_CONTENT_DIR` and `SCORMIFY_LIBRARY_DIR` override the storage
//! roots after the file is loaded; `SCORMIFY_CORE_DIR` overrides
//! `render.core_dir`.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConvertError, Result};

/// Config file name inside the config directory.
pub const CONFIG_FILE: &str = "scormify.toml";

/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8088";

/// Where the resolved configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigResolution {
    CliFlag,
    EnvVar,
    XdgConfig,
    Default,
}

/// Storage roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Content store root.
    pub content_dir: PathBuf,
    /// Library storage root, shared across conversions.
    pub library_dir: PathBuf,
    /// Parent of per-conversion staging directories.
    pub temp_dir: PathBuf,
    /// Parent of per-conversion archive output directories.
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(env::temp_dir)
            .join("scormify");
        StorageConfig {
            content_dir: data_dir.join("content"),
            library_dir: data_dir.join("libraries"),
            temp_dir: env::temp_dir(),
            output_dir: env::temp_dir(),
        }
    }
}

/// Runtime support scripts copied into every package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Directory holding `h5p-adaptor.js` and `SCORM_API_wrapper.js`.
    /// The embedded copies are used when unset.
    pub support_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Flat JSON map of translation keys layered over English.
    pub locale_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub minify: bool,
    /// H5P core runtime (`js/h5p.js`, `styles/h5p.css`, ...), inlined into
    /// every page. Without it the page relies on the host for the runtime.
    pub core_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Complete converter configuration (`scormify.toml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub storage: StorageConfig,
    pub scripts: ScriptsConfig,
    pub i18n: I18nConfig,
    pub render: RenderConfig,
    pub server: ServerConfig,
}

impl ConverterConfig {
    /// Parse a TOML document. Missing sections take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConvertError::Config(format!("invalid config: {e}")))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!("failed to read config from {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConvertError::Config(msg) => ConvertError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Resolve and load the configuration, then apply env overrides.
    pub fn resolve(cli_path: Option<&Path>) -> Result<(Self, ConfigResolution)> {
        let (path, resolution) = resolve_config_path(cli_path);
        let mut config = match &path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides(EnvOverrides {
            content_dir: env::var_os("SCORMIFY_CONTENT_DIR").map(PathBuf::from),
            library_dir: env::var_os("SCORMIFY_LIBRARY_DIR").map(PathBuf::from),
            core_dir: env::var_os("SCORMIFY_CORE_DIR").map(PathBuf::from),
        });
        debug!(
            config = ?path,
            resolution = ?resolution,
            content_dir = %config.storage.content_dir.display(),
            library_dir = %config.storage.library_dir.display(),
            core_dir = ?config.render.core_dir,
            "configuration resolved"
        );
        Ok((config, resolution))
    }

    fn apply_env_overrides(&mut self, overrides: EnvOverrides) {
        if let Some(dir) = overrides.content_dir {
            self.storage.content_dir = dir;
        }
        if let Some(dir) = overrides.library_dir {
            self.storage.library_dir = dir;
        }
        if let Some(dir) = overrides.core_dir {
            self.render.core_dir = Some(dir);
        }
    }
}

#[derive(Debug, Default)]
struct EnvOverrides {
    content_dir: Option<PathBuf>,
    library_dir: Option<PathBuf>,
    core_dir: Option<PathBuf>,
}

/// Resolve the config file path.
///
/// An explicit flag or env var is returned even when the file is missing,
/// so loading reports the error. The XDG location is used only if present.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigResolution) {
    // 1. CLI flag
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigResolution::CliFlag);
    }

    // 2. SCORMIFY_CONFIG env var
    if let Some(path) = env::var_os("SCORMIFY_CONFIG") {
        return (Some(PathBuf::from(path)), ConfigResolution::EnvVar);
    }

    // 3. XDG config dir
    if let Some(dir) = config_dir() {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            return (Some(path), ConfigResolution::XdgConfig);
        }
    }

    // 4. Defaults
    (None, ConfigResolution::Default)
}

fn config_dir() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("scormify"));
    }
    dirs::config_dir().map(|d| d.join("scormify"))
}
