//! Configuration management for the review provider
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (AIREVIEW_*)
//! 3. Config file (~/.config/aireview/config.toml)
//! 4. Default values

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credential::CredentialSourceKind;
use crate::{Error, Result};

/// Model used when neither the request nor the config names one
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Public Gemini API host
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Number of changed files included in the context blob
pub const DEFAULT_MAX_FILES: usize = 10;

/// Gerrit server settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GerritConfig {
    /// Base URL of the Gerrit server, e.g. `https://review.example.org`
    pub url: Option<String>,

    /// Username for authenticated (`/a/`) REST calls
    pub username: Option<String>,
}

/// Gemini endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Generation API host; overridable for testing or proxies
    pub base_url: String,

    /// Default model identifier
    pub model: String,

    /// Optional HTTP timeout; unset means the transport default
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }
}

/// Context gathering and credential settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Only the first `max_files` changed files are fetched
    pub max_files: usize,

    /// Upper bound on the context blob size in bytes (unbounded when unset)
    pub max_context_bytes: Option<usize>,

    /// Number of diff fetches in flight at once
    pub fetch_concurrency: usize,

    /// Where the Gemini API key comes from
    pub credential_source: CredentialSourceKind,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_context_bytes: None,
            fetch_concurrency: 1,
            credential_source: CredentialSourceKind::Local,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Gerrit configuration
    pub gerrit: GerritConfig,

    /// Gemini configuration
    pub gemini: GeminiConfig,

    /// Review pipeline configuration
    pub review: ReviewConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/aireview/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aireview").join("config.toml"))
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.review.fetch_concurrency == 0 {
            return Err(Error::Config(
                "review.fetch_concurrency must be at least 1".to_string(),
            ));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(Error::Config("gemini.model must not be empty".to_string()));
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - AIREVIEW_GERRIT_URL: Gerrit base URL
    /// - AIREVIEW_GERRIT_USERNAME: Gerrit username
    /// - AIREVIEW_GEMINI_BASE_URL: Gemini API host
    /// - AIREVIEW_MODEL: Default model
    /// - AIREVIEW_CREDENTIAL_SOURCE: `local` or `gerrit`
    pub fn with_env_overrides(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("AIREVIEW_GERRIT_URL") {
            self.gerrit.url = Some(url);
        }

        if let Some(username) = lookup("AIREVIEW_GERRIT_USERNAME") {
            self.gerrit.username = Some(username);
        }

        if let Some(base_url) = lookup("AIREVIEW_GEMINI_BASE_URL") {
            self.gemini.base_url = base_url;
        }

        if let Some(model) = lookup("AIREVIEW_MODEL") {
            self.gemini.model = model;
        }

        if let Some(source) = lookup("AIREVIEW_CREDENTIAL_SOURCE") {
            match source.parse() {
                Ok(kind) => self.review.credential_source = kind,
                Err(e) => tracing::warn!(value = %source, error = %e, "Ignoring invalid credential source"),
            }
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, gerrit_url: Option<String>, model: Option<String>) -> Self {
        if let Some(url) = gerrit_url {
            self.gerrit.url = Some(url);
        }

        if let Some(m) = model {
            self.gemini.model = m;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(gerrit_url: Option<String>, model: Option<String>) -> Result<Self> {
        let config = Self::load()?
            .with_env_overrides()
            .with_cli_overrides(gerrit_url, model);
        config.validate()?;
        Ok(config)
    }
}
