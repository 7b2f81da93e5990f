//! Secrets management for the review provider
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/aireview/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (GEMINI_API_KEY, GERRIT_HTTP_PASSWORD)
//! 2. Secrets file (~/.config/aireview/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable holding the Gemini API key
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Environment variable holding the Gerrit HTTP password
pub const ENV_GERRIT_HTTP_PASSWORD: &str = "GERRIT_HTTP_PASSWORD";

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Gemini configuration
    pub gemini: GeminiSecrets,

    /// Gerrit configuration
    pub gerrit: GerritSecrets,
}

/// Gemini-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiSecrets {
    /// Gemini API key
    pub api_key: Option<String>,
}

/// Gerrit-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GerritSecrets {
    /// Gerrit HTTP password (Settings > HTTP Credentials)
    pub http_password: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        // Check file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            // Group or other bits set
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        secrets.gemini.api_key = normalize(secrets.gemini.api_key.take());
        secrets.gerrit.http_password = normalize(secrets.gerrit.http_password.take());

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/aireview/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aireview").join("secrets.toml"))
    }

    /// Get the Gemini API key with environment variable override
    ///
    /// Priority: GEMINI_API_KEY env var > secrets file
    pub fn gemini_api_key(&self) -> Option<String> {
        if let Some(key) = normalize(std::env::var(ENV_GEMINI_API_KEY).ok()) {
            debug!("Using Gemini API key from {} environment variable", ENV_GEMINI_API_KEY);
            return Some(key);
        }

        self.gemini.api_key.clone().and_then(|key| normalize(Some(key)))
    }

    /// Get the Gerrit HTTP password with environment variable override
    ///
    /// Priority: GERRIT_HTTP_PASSWORD env var > secrets file
    pub fn gerrit_http_password(&self) -> Option<String> {
        if let Some(password) = normalize(std::env::var(ENV_GERRIT_HTTP_PASSWORD).ok()) {
            debug!("Using Gerrit password from {} environment variable", ENV_GERRIT_HTTP_PASSWORD);
            return Some(password);
        }

        self.gerrit.http_password.clone().and_then(|p| normalize(Some(p)))
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;

        Self::create_template_at(&path)?;
        Ok(path)
    }

    /// Create a template secrets file at `path`, refusing to overwrite
    pub fn create_template_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# aireview secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[gemini]
# Gemini API key
# Create at: https://aistudio.google.com/app/apikey
api_key = ""

[gerrit]
# Gerrit HTTP password (Settings > HTTP Credentials)
http_password = ""
"#;

        std::fs::write(path, template).map_err(Error::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your keys");

        Ok(())
    }
}

/// Trim a secret and treat blank values as absent
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
