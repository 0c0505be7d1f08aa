//! Configuration management for party-dl.
//!
//! Configuration is read from `~/.config/party-dl/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! Command-line flags take precedence over anything set here.

use crate::downloader::DEFAULT_WORKERS;
use crate::fetcher::http_fetcher::DEFAULT_USER_AGENT;
use crate::parser::ParserConfig;
use crate::site::DEFAULT_SUPPORTED_URLS;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub download: DownloadConfig,
    pub site: SiteConfig,
    pub parser: ParserConfig,
    pub stash: StashConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory creator folders are created in
    pub base_location: PathBuf,
    /// Number of posts processed concurrently
    pub workers: usize,
    /// Per-request deadline; unset means requests may block indefinitely
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_location: PathBuf::from("./"),
            workers: DEFAULT_WORKERS,
            timeout_secs: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// URL prefixes accepted by `download`
    pub supported_urls: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            supported_urls: DEFAULT_SUPPORTED_URLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// Base URL of the Stash instance, e.g. `http://localhost:9999`
    pub host: Option<String>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/party-dl/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("party-dl").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# party-dl configuration

[download]
# Directory creator folders are created in
base_location = "./"

# Number of posts downloaded concurrently
workers = 3

# Request timeout in seconds. Leave unset to wait indefinitely.
# timeout_secs = 300

[site]
# Profile URLs must start with one of these
supported_urls = ["https://coomer.su"]

[parser]
# CSS selectors for the site's page layout
creator_link = "#user-header__info-top > a"
creator_name = "#user-header__info-top > a > span:nth-child(2)"
paginator = "#paginator-top > small"
post_list = "#main > section > div.card-list.card-list--legacy > div.card-list__items"
description = "#page > div > div.post__content > pre"
published = "#page > header > div.post__info > div.post__published"
file_groups = [
    "#page > div > div.post__files",
    "#page > div > ul.post__attachments",
]

[stash]
# host = "http://localhost:9999"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
