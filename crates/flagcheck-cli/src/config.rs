//! CLI configuration.
//!
//! | Source | Used when |
//! |--------|-----------|
//! | `--config <path>` | given |
//! | `$FLAGCHECK_CONFIG` | set and non-empty |
//! | `$XDG_CONFIG_HOME/flagcheck/config.toml` | the file exists |
//! | built-in defaults | otherwise |
//!
//! An explicitly named file must exist and parse. The XDG file is optional.
//!
//! ```toml
//! log_filter = "flagcheck=debug"
//!
//! [defaults]
//! region = "us-east-1"
//! bucket = "release-artifacts"
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use flagcheck_kernel::{FlagValue, StaticDefaults};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "FLAGCHECK_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// Flag values applied when neither the command line nor the
    /// environment provides one.
    pub defaults: BTreeMap<String, FlagValue>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl CliConfig {
    /// Load using the lookup order in the module docs.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::load_from(explicit.map(Path::to_path_buf).or(from_env), &config_file())
    }

    /// Load `explicit` if given, else `fallback` if it exists, else defaults.
    pub fn load_from(explicit: Option<PathBuf>, fallback: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::read(&path),
            None if fallback.is_file() => Self::read(fallback),
            None => {
                tracing::debug!(path = %fallback.display(), "no config file; using defaults");
                Ok(Self::default())
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// The `[defaults]` table as a preprocessor.
    pub fn defaults_preprocessor(&self) -> StaticDefaults {
        StaticDefaults::from_config(self.defaults.clone())
    }
}

/// `$XDG_CONFIG_HOME/flagcheck`, or `~/.config/flagcheck` when the platform
/// directories cannot be determined.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("flagcheck")
}

pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
