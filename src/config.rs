//! Configuration for the leitner command-line driver.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub practice: PracticeConfig,
}

impl Config {
    /// Reads a TOML file. A missing file gives the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "leitner")
            .map(|d| d.config_dir().join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "leitner")
        .map(|d| d.data_dir().join("leitner.sqlite3"))
        .unwrap_or_else(|| PathBuf::from("leitner.sqlite3"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeConfig {
    /// Letters revealed by `hint` when no count is given.
    #[serde(default = "default_hint_letters")]
    pub default_hint_letters: i64,
    /// Name recorded in the practice log.
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_hint_letters() -> i64 {
    2
}

fn default_user() -> String {
    "default".to_string()
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            default_hint_letters: default_hint_letters(),
            user: default_user(),
        }
    }
}
