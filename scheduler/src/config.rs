//! Scheduler configuration.
//!
//! Loaded from a small TOML file; a missing file falls back to defaults so
//! the binary runs out of the box against a local database.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the SQLite database holding services and their logs.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Run every enabled service regardless of its interval.
    #[serde(default)]
    pub force: bool,
}

fn default_database_path() -> String {
    "data/services.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            force: false,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!("No config file at '{}', using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path))?;

        Ok(config)
    }
}
