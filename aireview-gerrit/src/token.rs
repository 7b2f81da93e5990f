//! Account-scoped Gemini token (`/accounts/self/geminiToken`)

use aireview_core::credential::TOKEN_ENDPOINT;
use aireview_core::TokenSource;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{Error, GerritClient, Result};

#[derive(Debug, Serialize)]
struct TokenInput<'a> {
    token: &'a str,
}

impl GerritClient {
    /// Read the stored Gemini token of the calling user
    ///
    /// Returns `Ok(None)` when no token is stored or the response carries no
    /// usable string.
    pub async fn get_token(&self) -> Result<Option<String>> {
        let response: Value = match self.get_json(TOKEN_ENDPOINT).await {
            Ok(value) => value,
            Err(Error::NotFound(_)) => {
                debug!("No Gemini token stored on the Gerrit account");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        Ok(response
            .get("token")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from))
    }

    /// Store a Gemini token on the calling user's account, replacing any previous one
    pub async fn set_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Other("Empty 'token'".to_string()));
        }
        if !self.is_authenticated() {
            return Err(Error::Auth(
                "Storing a token requires an authenticated Gerrit client".to_string(),
            ));
        }

        self.put_json(TOKEN_ENDPOINT, &TokenInput { token }).await?;
        info!("Stored Gemini token on the Gerrit account");
        Ok(())
    }
}

#[async_trait]
impl TokenSource for GerritClient {
    async fn fetch_token(&self) -> aireview_core::Result<Option<String>> {
        Ok(self.get_token().await?)
    }
}
