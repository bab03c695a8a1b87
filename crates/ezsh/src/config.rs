//! Shell configuration.
//!
//! Configuration is read from TOML or JSON; the format is chosen by file
//! extension. Every field has a default, so an empty file is valid.
//!
//! ```toml
//! title = "ezsh"
//! log_filter = "info,ezsh_core::router=debug"
//! auto_app_menu = true
//!
//! [telemetry]
//! enabled = true
//! sink = "log"
//!
//! [keys]
//! "<Control-p>" = "palette.open"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use ezsh_core::{KeyMap, TelemetryConfig};
use serde::{Deserialize, Serialize};

/// Default window/application title.
pub const DEFAULT_TITLE: &str = "ezsh";

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse error.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Shell configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Application title, shown in the status bar and the macOS app menu.
    pub title: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Move About/Preferences/Quit into the application menu on macOS.
    pub auto_app_menu: bool,
    /// Telemetry settings.
    pub telemetry: TelemetryConfig,
    /// Extra global key bindings, applied over the platform defaults.
    pub keys: KeyMap,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            auto_app_menu: true,
            telemetry: TelemetryConfig::default(),
            keys: KeyMap::new(),
        }
    }
}

impl ShellConfig {
    /// Parse TOML configuration.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse JSON configuration.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load configuration from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        match format.as_deref() {
            Some("toml") => Self::from_toml_str(&read()?),
            Some("json") => Self::from_json_str(&read()?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Load `path` if given; otherwise the per-user default file if it
    /// exists; otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// The per-user configuration file, e.g. `~/.config/ezsh/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", DEFAULT_TITLE).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Serialize as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
