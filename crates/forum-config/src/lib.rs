//! Configuration management for the forum post renderer.
//!
//! Parses `forum.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [enrichment]
//! fetch_timeout_ms = 3000
//! max_redirects = 3
//! max_matches = 10
//!
//! [preview]
//! short_length = 100
//! long_length = 500
//! empty_text = "No text"
//!
//! [[smileys]]
//! code = ":)"
//! path = "/images/smileys/smile.png"
//!
//! [[users]]
//! id = "1"
//! display_name = "Alice"
//! login = "alice"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override remote fetch timeout.
    pub fetch_timeout_ms: Option<u64>,
    /// Override per-message URL and mention cap.
    pub max_matches: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "forum.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Link enrichment settings.
    pub enrichment: EnrichmentConfig,
    /// Preview settings.
    pub preview: PreviewConfig,
    /// Smiley codes in match order.
    pub smileys: Vec<SmileyConfig>,
    /// Users that can be mentioned.
    pub users: Vec<UserConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Link enrichment configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Ceiling for one remote page fetch, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Redirects followed per fetch.
    pub max_redirects: u32,
    /// User agent sent with fetches.
    pub user_agent: Option<String>,
    /// URLs and mentions handled per message.
    pub max_matches: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 3000,
            max_redirects: 3,
            user_agent: None,
            max_matches: 10,
        }
    }
}

impl EnrichmentConfig {
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Preview configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Character limit of the single-line preview.
    pub short_length: usize,
    /// Character limit of the multi-line preview.
    pub long_length: usize,
    /// Text used when a preview would be empty.
    pub empty_text: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            short_length: 100,
            long_length: 500,
            empty_text: "No text".to_owned(),
        }
    }
}

/// One `[[smileys]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SmileyConfig {
    pub code: String,
    /// Image URL.
    pub path: String,
}

/// One `[[users]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserConfig {
    pub id: String,
    pub display_name: String,
    pub login: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a numeric field to be positive.
fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `forum.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the result does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(timeout) = settings.fetch_timeout_ms {
            self.enrichment.fetch_timeout_ms = timeout;
        }
        if let Some(max_matches) = settings.max_matches {
            self.enrichment.max_matches = max_matches;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(current)
    }

    fn discover_from(mut current: PathBuf) -> Option<PathBuf> {
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_enrichment()?;
        self.validate_preview()?;
        self.validate_smileys()?;
        self.validate_users()?;
        Ok(())
    }

    fn validate_enrichment(&self) -> Result<(), ConfigError> {
        let enrichment = &self.enrichment;
        require_positive(enrichment.fetch_timeout_ms, "enrichment.fetch_timeout_ms")?;
        require_positive(enrichment.max_matches as u64, "enrichment.max_matches")?;
        if let Some(user_agent) = &enrichment.user_agent {
            require_non_empty(user_agent, "enrichment.user_agent")?;
        }
        Ok(())
    }

    fn validate_preview(&self) -> Result<(), ConfigError> {
        require_positive(self.preview.short_length as u64, "preview.short_length")?;
        require_positive(self.preview.long_length as u64, "preview.long_length")?;
        Ok(())
    }

    fn validate_smileys(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for smiley in &self.smileys {
            require_non_empty(&smiley.code, "smileys.code")?;
            if smiley.code.contains(char::is_whitespace) {
                return Err(ConfigError::Validation(format!(
                    "smiley code {:?} cannot contain whitespace",
                    smiley.code
                )));
            }
            if !seen.insert(smiley.code.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate smiley code {:?}",
                    smiley.code
                )));
            }
        }
        Ok(())
    }

    fn validate_users(&self) -> Result<(), ConfigError> {
        for user in &self.users {
            require_non_empty(&user.id, "users.id")?;
        }
        Ok(())
    }
}
