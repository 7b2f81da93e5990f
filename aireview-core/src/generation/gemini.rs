//! Gemini `generateContent` client

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::Generator;
use crate::config::GeminiConfig;
use crate::credential::Credential;
use crate::{Error, Result};

/// Returned when a well-formed response carries no text parts
pub const NO_TEXT_SENTINEL: &str = "(No text returned by Gemini)";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn user(prompt: &'a str) -> Self {
        Self {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        }
    }
}

/// Concatenate the non-empty text parts of the first candidate
///
/// Anything missing or oddly shaped is skipped rather than treated as an
/// error; an empty result becomes [`NO_TEXT_SENTINEL`].
pub fn extract_text(response: &Value) -> String {
    let text: String = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        NO_TEXT_SENTINEL.to_string()
    } else {
        text
    }
}

/// HTTP client for the Gemini generative language API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GeminiClient {
    /// Create a client against `base_url` with transport defaults
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_http(base_url, reqwest::Client::new())
    }

    /// Create a client from configuration
    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Self::with_http(&config.base_url, http)
    }

    fn with_http(base_url: &str, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid Gemini base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Gemini base URL '{}' cannot carry a path",
                base_url
            )));
        }
        Ok(Self { http, base_url })
    }

    /// `{base}/v1beta/models/{model}:generateContent?key={key}`
    pub fn endpoint(&self, model: &str, credential: &Credential) -> Result<Url> {
        let method = format!("{}:generateContent", model);
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("Gemini base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["v1beta", "models", method.as_str()]);
        url.query_pairs_mut().append_pair("key", credential.expose());
        Ok(url)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, credential: &Credential, model: &str, prompt: &str) -> Result<String> {
        let url = self.endpoint(model, credential)?;
        info!(model, prompt_bytes = prompt.len(), "Calling Gemini generateContent");

        let response = self
            .http
            .post(url)
            .json(&GenerateContentRequest::user(prompt))
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text
            };
            return Err(Error::GenerationApi {
                status: status.as_u16(),
                body,
            });
        }

        // The request URL carries the key; keep it out of error text.
        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        let text = extract_text(&json);
        debug!(model, response_bytes = text.len(), "Gemini response received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn key() -> Credential {
        Credential::new("test-key")
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response = json!({
            "candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}]
        });
        assert_eq!(extract_text(&response), "Hello world");
    }

    #[test]
    fn test_extract_text_skips_non_text_parts() {
        let response = json!({
            "candidates": [
                {"content": {"parts": [
                    {"inlineData": {"mimeType": "image/png"}},
                    {"text": ""},
                    {"text": 42},
                    {"text": "kept"}
                ]}},
                {"content": {"parts": [{"text": "second candidate"}]}}
            ]
        });
        assert_eq!(extract_text(&response), "kept");
    }

    #[test]
    fn test_extract_text_sentinel_when_empty() {
        assert_eq!(extract_text(&json!({"candidates": []})), NO_TEXT_SENTINEL);
        assert_eq!(extract_text(&json!({})), NO_TEXT_SENTINEL);
        assert_eq!(
            extract_text(&json!({"candidates": [{"content": {"parts": [{"functionCall": {}}]}}]})),
            NO_TEXT_SENTINEL
        );
    }

    #[test]
    fn test_endpoint_shape() {
        let client = GeminiClient::new("https://generativelanguage.googleapis.com").unwrap();
        let url = client.endpoint("gemini-2.5-flash", &Credential::new("a&b")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent?key=a%26b"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(GeminiClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Review this"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri()).unwrap();
        let text = client
            .generate(&key(), "gemini-2.5-flash", "Review this")
            .await
            .unwrap();
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn test_generate_no_candidates_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri()).unwrap();
        let text = client.generate(&key(), "gemini-2.5-flash", "x").await.unwrap();
        assert_eq!(text, NO_TEXT_SENTINEL);
    }

    #[tokio::test]
    async fn test_generate_error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("Resource has been exhausted"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri()).unwrap();
        let err = client.generate(&key(), "gemini-2.5-flash", "x").await.unwrap_err();

        match &err {
            Error::GenerationApi { status, body } => {
                assert_eq!(*status, 429);
                assert_eq!(body, "Resource has been exhausted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "Gemini error 429: Resource has been exhausted");
    }

    #[tokio::test]
    async fn test_generate_error_without_body_uses_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri()).unwrap();
        let err = client.generate(&key(), "gemini-2.5-flash", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "Gemini error 503: Service Unavailable");
    }

    #[tokio::test]
    async fn test_generate_malformed_json_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri()).unwrap();
        let err = client.generate(&key(), "gemini-2.5-flash", "x").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn test_connection_failure_does_not_expose_key() {
        let client = GeminiClient::new("http://127.0.0.1:1").unwrap();
        let err = client
            .generate(&Credential::new("SUPERSECRETKEY"), "gemini-2.5-flash", "x")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!err.listener_message().contains("SUPERSECRETKEY"));
    }
}
