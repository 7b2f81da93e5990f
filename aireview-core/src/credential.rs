//! Gemini API key resolution
//!
//! A [`CredentialResolver`] wraps one [`CredentialBackend`] strategy and
//! caches the first key it finds for the lifetime of the process. A missing
//! key is not cached, so a later request will look again.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::secrets::{Secrets, ENV_GEMINI_API_KEY};
use crate::{Error, Result};

/// Account resource on the Gerrit server holding the user's Gemini key
pub const TOKEN_ENDPOINT: &str = "/accounts/self/geminiToken";

/// Which store the API key is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSourceKind {
    /// Environment variable or the local secrets file
    #[default]
    Local,
    /// The Gerrit account token endpoint
    Gerrit,
}

impl FromStr for CredentialSourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "gerrit" => Ok(Self::Gerrit),
            other => Err(Error::Config(format!(
                "Unknown credential source '{}'. Expected 'local' or 'gerrit'",
                other
            ))),
        }
    }
}

impl fmt::Display for CredentialSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Gerrit => write!(f, "gerrit"),
        }
    }
}

/// A resolved API key
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building the request URL
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Read side of the server-stored token (`GET /accounts/self/geminiToken`)
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch the raw `token` field, `Ok(None)` when the response has none
    async fn fetch_token(&self) -> Result<Option<String>>;
}

/// Strategy for looking up the API key in one particular store
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Look the key up; `None` means the store has no usable key
    async fn lookup(&self) -> Option<String>;

    /// Human-actionable text explaining how to provision the key
    fn provisioning_hint(&self) -> String;
}

/// Key from `GEMINI_API_KEY` or the local secrets file
#[derive(Debug, Clone, Default)]
pub struct LocalCredentials {
    secrets: Secrets,
}

impl LocalCredentials {
    /// Use already-loaded secrets
    pub fn new(secrets: Secrets) -> Self {
        Self { secrets }
    }
}

#[async_trait]
impl CredentialBackend for LocalCredentials {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn lookup(&self) -> Option<String> {
        self.secrets.gemini_api_key()
    }

    fn provisioning_hint(&self) -> String {
        let path = Secrets::default_secrets_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/aireview/secrets.toml".to_string());
        format!(
            "Missing Gemini API key. Set it in your environment:\n\
             export {}=YOUR_KEY_HERE\n\
             or add api_key = \"YOUR_KEY_HERE\" under [gemini] in {}",
            ENV_GEMINI_API_KEY, path
        )
    }
}

/// Key stored server-side on the user's Gerrit account
#[derive(Clone)]
pub struct GerritTokenCredentials {
    source: Arc<dyn TokenSource>,
}

impl GerritTokenCredentials {
    /// Read through the given token endpoint
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl CredentialBackend for GerritTokenCredentials {
    fn name(&self) -> &'static str {
        "gerrit"
    }

    async fn lookup(&self) -> Option<String> {
        match self.source.fetch_token().await {
            Ok(token) => token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read Gemini token from Gerrit");
                None
            }
        }
    }

    fn provisioning_hint(&self) -> String {
        format!(
            "Missing Gemini API key. Store it server-side via:\n\
             PUT /a{} {{\"token\": \"YOUR_KEY_HERE\"}}",
            TOKEN_ENDPOINT
        )
    }
}

/// Resolves and caches the API key
pub struct CredentialResolver {
    backend: Arc<dyn CredentialBackend>,
    cached: OnceCell<Credential>,
}

impl CredentialResolver {
    /// Create a resolver over one backend strategy
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        Self {
            backend,
            cached: OnceCell::new(),
        }
    }

    /// Resolve the key, reusing the cached value after the first success
    ///
    /// Returns [`Error::CredentialMissing`] with provisioning instructions
    /// when the backend has no key.
    pub async fn resolve(&self) -> Result<Credential> {
        let credential = self
            .cached
            .get_or_try_init(|| async {
                debug!(backend = self.backend.name(), "Resolving Gemini API key");
                self.backend
                    .lookup()
                    .await
                    .map(Credential::new)
                    .ok_or_else(|| Error::CredentialMissing(self.backend.provisioning_hint()))
            })
            .await?;

        Ok(credential.clone())
    }

    /// Whether a key has already been resolved
    pub fn is_cached(&self) -> bool {
        self.cached.initialized()
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("backend", &self.backend.name())
            .field("cached", &self.is_cached())
            .finish()
    }
}
