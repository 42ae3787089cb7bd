//! User configuration stored in `~/.taskboard/config.toml`.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BoardError, Result};

pub const DEFAULT_LOG_FILTER: &str = "taskboard=info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data file; `~/` is expanded. Defaults to `~/.taskboard/projects.json`.
    pub data_file: Option<String>,
    /// `tracing` filter directive used when `TASKBOARD_LOG` is unset.
    pub log_filter: String,
    /// Show a hint in empty board columns.
    pub show_empty_hint: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            show_empty_hint: true,
        }
    }
}

impl Config {
    pub fn taskboard_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(BoardError::NoHomeDir)?.join(".taskboard"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::taskboard_dir()?.join("config.toml"))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::taskboard_dir()?.join("taskboard.log"))
    }

    /// Where the data file lives: an explicit override, then the config,
    /// then the default under the taskboard directory.
    pub fn data_path(&self, cli_override: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path);
        }
        match &self.data_file {
            Some(file) => Ok(expand_tilde(file)),
            None => Ok(Self::taskboard_dir()?.join("projects.json")),
        }
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::parse(&fs::read_to_string(&path)?)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        debug!(data_file = ?config.data_file, log_filter = %config.log_filter, "config loaded");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::taskboard_dir()?;
        fs::create_dir_all(&dir)?;
        fs::write(Self::config_path()?, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
