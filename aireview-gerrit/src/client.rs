//! Gerrit REST client using reqwest

use aireview_core::{Config, Secrets};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::{Error, Result};

/// Prefix Gerrit prepends to JSON bodies to defeat cross-site script inclusion
const XSSI_PREFIX: &str = ")]}'";

/// Percent-encode one path segment (file paths keep no literal `/`)
pub(crate) fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Remove the XSSI guard line from a Gerrit JSON body
pub(crate) fn strip_xssi(body: &str) -> &str {
    body.strip_prefix(XSSI_PREFIX).unwrap_or(body)
}

/// Gerrit REST API client
#[derive(Clone)]
pub struct GerritClient {
    http: reqwest::Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl GerritClient {
    /// Create an anonymous client for the Gerrit server at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid Gerrit URL '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid Gerrit URL '{}'", base_url)));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
        })
    }

    /// Authenticate with HTTP basic credentials; requests go through `/a/`
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Create a client from the `[gerrit]` config section
    ///
    /// A configured username requires the HTTP password from:
    /// 1. GERRIT_HTTP_PASSWORD environment variable
    /// 2. ~/.config/aireview/secrets.toml
    pub fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        let url = config.gerrit.url.as_deref().ok_or_else(|| {
            Error::Config(
                "Gerrit URL not set. Use --gerrit-url, AIREVIEW_GERRIT_URL \
                 or [gerrit] url in ~/.config/aireview/config.toml"
                    .to_string(),
            )
        })?;

        let client = Self::new(url)?;
        let client = match &config.gerrit.username {
            Some(username) => {
                let password = secrets.gerrit_http_password().ok_or_else(|| {
                    Error::Auth(format!(
                        "No HTTP password for Gerrit user '{}'. Set GERRIT_HTTP_PASSWORD \
                         or add http_password under [gerrit] in ~/.config/aireview/secrets.toml",
                        username
                    ))
                })?;
                client.with_credentials(username.clone(), password)
            }
            None => client,
        };

        info!(url = %url, authenticated = client.is_authenticated(), "Created Gerrit client");
        Ok(client)
    }

    /// Get the server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry credentials
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// Full URL for a REST path such as `/changes/1`
    pub(crate) fn url(&self, path: &str) -> String {
        let prefix = if self.is_authenticated() { "/a" } else { "" };
        format!("{}{}{}", self.base_url, prefix, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.auth {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        Err(match status.as_u16() {
            401 | 403 => Error::Auth(format!("{} for {}: {}", status, path, body.trim())),
            404 => Error::NotFound(path.to_string()),
            code => Error::Status {
                status: code,
                path: path.to_string(),
                body: body.trim().to_string(),
            },
        })
    }

    /// GET a JSON resource, stripping the XSSI prefix
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "Gerrit GET");

        let response = self.request(reqwest::Method::GET, path).send().await?;
        let response = Self::check(response, path).await?;
        let body = response.text().await?;

        serde_json::from_str(strip_xssi(&body).trim_start())
            .map_err(|e| Error::Parse(format!("Failed to parse response from {}: {}", path, e)))
    }

    /// PUT a JSON body, ignoring the response content
    pub(crate) async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        debug!(path, "Gerrit PUT");

        let response = self
            .request(reqwest::Method::PUT, path)
            .json(body)
            .send()
            .await?;
        Self::check(response, path).await?;
        Ok(())
    }
}

impl std::fmt::Debug for GerritClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GerritClient")
            .field("base_url", &self.base_url)
            .field("user", &self.auth.as_ref().map(|(user, _)| user))
            .finish_non_exhaustive()
    }
}
