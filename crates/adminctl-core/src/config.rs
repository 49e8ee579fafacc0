//! Configuration management for adminctl.
//!
//! Loads configuration from ${ADMINCTL_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fs_util::write_private;

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// This ensures new comments/sections from the template are always present,
/// while preserving user's customized values.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Copies user values over the template. Tables merge key by key so template
/// comments on keys the user never set survive.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    for (key, item) in source.iter() {
        if let toml_edit::Item::Table(from) = item
            && let Some(toml_edit::Item::Table(into)) = target.get_mut(key)
        {
            merge_items(into, from);
            continue;
        }
        if !item.is_none() {
            target[key] = item.clone();
        }
    }
}

pub mod paths {
    //! Path resolution for adminctl configuration and data files.
    //!
    //! ADMINCTL_HOME resolution order:
    //! 1. ADMINCTL_HOME environment variable (if set)
    //! 2. ~/.config/adminctl (default)

    use std::path::PathBuf;

    /// Returns the adminctl home directory.
    pub fn adminctl_home() -> PathBuf {
        if let Ok(home) = std::env::var("ADMINCTL_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".adminctl"),
            |h| h.join(".config").join("adminctl"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        adminctl_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        adminctl_home().join("session.json")
    }

    /// Returns the directory for rotated log files.
    pub fn logs_dir() -> PathBuf {
        adminctl_home().join("logs")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when ADMINCTL_LOG is unset.
    pub level: String,
    /// Whether to also write logs to files under `logs_dir()`.
    pub file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend origin, e.g. `https://admin-api.example.com`
    pub base_url: String,

    /// Path prefix prepended to every API route
    pub api_prefix: String,

    /// Per-request timeout in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
    pub const DEFAULT_API_PREFIX: &str = "/api/v1";
    /// Default is disabled
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 0;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Saves only the base_url field to the config file.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_base_url(url: &str) -> Result<()> {
        Self::save_base_url_to(&paths::config_path(), url)
    }

    /// Saves only the base_url field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_base_url_to(path: &Path, url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let url = validate_base_url(url)?;

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["base_url"] = value(url);

        Self::write_config(path, &doc.to_string())
    }

    /// Resolves the backend origin with precedence: explicit override > config > default.
    ///
    /// The CLI feeds `--base-url` / `ADMINCTL_BASE_URL` in as the override.
    ///
    /// # Errors
    /// Returns an error if the winning value is not a valid URL.
    pub fn resolve_base_url(&self, override_url: Option<&str>) -> Result<String> {
        if let Some(url) = override_url.map(str::trim).filter(|s| !s.is_empty()) {
            return validate_base_url(url);
        }

        let configured = self.base_url.trim();
        if configured.is_empty() {
            return Ok(Self::DEFAULT_BASE_URL.to_string());
        }
        validate_base_url(configured)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        write_private(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_prefix: Self::DEFAULT_API_PREFIX.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            log: LogConfig::default(),
        }
    }
}

/// Validates that a URL is well-formed and strips any trailing slash.
fn validate_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    url::Url::parse(trimmed).with_context(|| format!("Invalid base URL: {trimmed}"))?;
    Ok(trimmed.trim_end_matches('/').to_string())
}
