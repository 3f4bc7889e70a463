//! Runtime configuration for the officials admin core.
//!
//! Sources merge in order: built-in defaults, an optional TOML file, then
//! `OFFICIALS_`-prefixed environment variables (`OFFICIALS_UPLOAD_DIR`, ...).

use crate::storage::ImageStore;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "OFFICIALS_";
pub const DEFAULT_DATABASE_PATH: &str = "officials.sqlite3";
pub const DEFAULT_UPLOAD_DIR: &str = "public/provincial_officials";

/// Application configuration managed by Figment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Flat directory holding official profile images.
    pub upload_dir: PathBuf,
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Builds the Figment for defaults, `config_file` (if it exists) and env.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_file.filter(|path| path.is_file()) {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Loads configuration from all sources.
    ///
    /// A named file that does not exist is an error; pass `None` to run on
    /// defaults and environment only.
    pub fn load(config_file: Option<&Path>) -> Result<Self, figment::Error> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }
        Self::figment(config_file).extract()
    }

    /// Image store rooted at the configured upload directory.
    pub fn image_store(&self) -> ImageStore {
        ImageStore::new(self.upload_dir.clone())
    }
}
