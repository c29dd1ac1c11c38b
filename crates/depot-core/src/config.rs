//! Runtime configuration.
//!
//! Everything lives under the depot home (`DEPOT_HOME`, default
//! `~/.depot`). An optional `config.toml` there can move the database or
//! the upload root elsewhere:
//!
//! ```toml
//! database = "/srv/depot/catalog.db"
//! upload_root = "uploads"   # relative paths resolve against the home
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::paths::{config_path, db_path, try_depot_home, uploads_path};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine home directory. Set DEPOT_HOME to override.")]
    NoHome,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    database: Option<PathBuf>,
    upload_root: Option<PathBuf>,
}

/// Resolved locations used by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub home: PathBuf,
    pub database: PathBuf,
    pub upload_root: PathBuf,
}

impl Config {
    /// Load configuration from the depot home.
    pub fn load() -> Result<Self, ConfigError> {
        let home = try_depot_home().ok_or(ConfigError::NoHome)?;
        Self::load_from(&home)
    }

    /// Load configuration rooted at `home`. A missing `config.toml` means defaults.
    pub fn load_from(home: &Path) -> Result<Self, ConfigError> {
        let path = config_path(home);
        let file = match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str::<ConfigFile>(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigFile::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let resolve = |p: PathBuf| if p.is_absolute() { p } else { home.join(p) };
        Ok(Self {
            home: home.to_path_buf(),
            database: file.database.map_or_else(|| db_path(home), resolve),
            upload_root: file.upload_root.map_or_else(|| uploads_path(home), resolve),
        })
    }
}
