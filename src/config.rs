// Operator configuration
//
// Resolution order:
// 1) Explicit --config path (must exist)
// 2) config.json in the platform config directory
// 3) Built-in defaults

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_FILENAME, DB_FILENAME, DEFAULT_PLAYER, DEFAULT_TRANSLITERATIONS, LEDGER_FILENAME};
use crate::error::{DvrError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub database_path: PathBuf,
    pub ledger_path: PathBuf,
    /// Ordered (from, to) pairs applied to lower-cased titles before groupkey stripping
    pub transliterations: Vec<(String, String)>,
    pub player: String,
    /// When false the drop pipeline only ledgers and evicts
    pub delete_files: bool,
    /// When false technical fields keep the unknown sentinel
    pub probe_video: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DB_FILENAME),
            ledger_path: PathBuf::from(LEDGER_FILENAME),
            transliterations: DEFAULT_TRANSLITERATIONS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            player: DEFAULT_PLAYER.to_string(),
            delete_files: true,
            probe_video: true,
        }
    }
}

impl Config {
    /// Load configuration, falling back to the platform config dir and then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(DvrError::Config(format!("Config file not found: {}", path.display())));
            }
            return Self::from_file(path);
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                log::debug!("Loading config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| DvrError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.transliterations.iter().any(|(from, _)| from.is_empty()) {
            return Err(DvrError::Config("Transliteration source must not be empty".to_string()));
        }
        if self.player.trim().is_empty() {
            return Err(DvrError::Config("Player must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Platform config location, e.g. ~/.config/dvrman/config.json
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dvrman")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}
