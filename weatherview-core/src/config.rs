use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    model::{CityName, LocationQuery},
    view_model::ResponseOrdering,
};

pub const DEFAULT_LOCATION: &str = "Jakarta";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_location = "Jakarta"
/// ordering = "last-issued"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Place shown on startup when no coordinates are known.
    #[serde(default = "default_location")]
    pub default_location: String,

    /// Alternative API host, e.g. a caching proxy.
    pub base_url: Option<String>,

    /// Which of two overlapping responses wins.
    #[serde(default)]
    pub ordering: ResponseOrdering,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_location: default_location(),
            base_url: None,
            ordering: ResponseOrdering::default(),
        }
    }
}

impl Config {
    /// Returns the API key, ignoring a blank one.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Validated default location as a name query.
    pub fn default_location_query(&self) -> Result<LocationQuery> {
        let name = CityName::parse(&self.default_location).with_context(|| {
            format!(
                "Invalid default_location {:?} in config",
                self.default_location
            )
        })?;
        Ok(LocationQuery::Name(name))
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weatherview", "weatherview")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
