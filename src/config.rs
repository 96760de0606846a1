//! User configuration
//!
//! Read from `config.toml` in the platform config directory, e.g.
//! `~/.config/cardbox/config.toml`:
//!
//! ```toml
//! save_file = "/home/me/cards/collection.json"
//! num_options = 4
//!
//! [review]
//! days_per_status = 1
//! new_cards_per_session = 5
//! max_cards_per_session = 20
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::ReviewSettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Could not write config: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the default save file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_file: Option<PathBuf>,
    /// Options shown per multiple choice question
    pub num_options: usize,
    /// Settings for new Leitner and streak reviews
    pub review: ReviewSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_file: None,
            num_options: 4,
            review: ReviewSettings::default(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("cardbox").join("config.toml"))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Load from the default location; no file means defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
