//! The review provider registered with the host
//!
//! [`GeminiProvider::run`] is the whole pipeline for one request:
//! credential, context, prompt, generation, then exactly one outcome on the
//! listener. [`ReviewProvider::chat`] spawns it and returns immediately.

pub mod catalog;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{Config, DEFAULT_MODEL};
use crate::credential::CredentialResolver;
use crate::generation::Generator;
use crate::review::compose::compose;
use crate::review::context::{ContextGatherer, ContextLimits, DiffSource};
use crate::review::listener::{ChatResponseListener, ResponseEmitter};
use crate::review::request::ReviewRequest;
use crate::review::state::RequestPhase;
use crate::Result;

pub use catalog::{Action, Actions, ModelInfo, Models};

/// Interim response sent once the credential is available
pub const STATUS_MESSAGE: &str = "_Gathering file contents and calling Gemini...";

/// Features the provider declares to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Accepts extra user-attached context beyond the change
    pub supports_add_context: bool,
    /// Accepts prior conversation turns
    pub supports_history: bool,
    /// Offers actions beyond [`ReviewProvider::actions`]
    pub supports_more_menu: bool,
    /// Can operate on the change currently open in the host
    pub supports_this_change: bool,
}

/// Contract the host review tool expects from a provider
pub trait ReviewProvider: Send + Sync {
    /// Static feature flags
    fn capabilities(&self) -> &'static Capabilities;

    /// Supported models and the default
    fn models(&self) -> Models;

    /// The fixed action menu
    fn actions(&self) -> Actions;

    /// Start handling `request`; every result arrives through `listener`
    fn chat(&self, request: ReviewRequest, listener: Arc<dyn ChatResponseListener>) -> JoinHandle<()>;
}

struct Inner {
    credentials: CredentialResolver,
    gatherer: ContextGatherer,
    generator: Arc<dyn Generator>,
    default_model: String,
}

/// Single-shot Gemini review provider
///
/// Cheap to clone; clones share the credential cache.
#[derive(Clone)]
pub struct GeminiProvider {
    inner: Arc<Inner>,
}

impl GeminiProvider {
    pub const CAPABILITIES: Capabilities = Capabilities {
        supports_add_context: false,
        supports_history: false,
        supports_more_menu: false,
        supports_this_change: true,
    };

    /// Assemble a provider from its collaborators
    pub fn new(
        credentials: CredentialResolver,
        gatherer: ContextGatherer,
        generator: Arc<dyn Generator>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                credentials,
                gatherer,
                generator,
                default_model: default_model.into(),
            }),
        }
    }

    /// Assemble a provider using the review and Gemini settings in `config`
    pub fn from_config(
        config: &Config,
        credentials: CredentialResolver,
        diffs: Arc<dyn DiffSource>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let gatherer = ContextGatherer::new(diffs, ContextLimits::from(&config.review));
        let model = if config.gemini.model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.gemini.model.clone()
        };
        Self::new(credentials, gatherer, generator, model)
    }

    /// Model used when a request names none
    pub fn default_model(&self) -> &str {
        &self.inner.default_model
    }

    /// Handle `request` to completion
    ///
    /// The listener sees the optional status response, then exactly one of
    /// `emit_response` or `emit_error`, then `done`.
    pub async fn run(&self, request: ReviewRequest, listener: Arc<dyn ChatResponseListener>) {
        let mut emitter = ResponseEmitter::new(listener);
        let change = request.change.number;

        match self.execute(&request, &mut emitter).await {
            Ok(text) => {
                info!(change, response_bytes = text.len(), "Review request succeeded");
                emitter.succeed(text);
            }
            Err(e) => {
                warn!(change, phase = ?emitter.phase(), error = %e, "Review request failed");
                emitter.fail(&e);
            }
        }
    }

    async fn execute(&self, request: &ReviewRequest, emitter: &mut ResponseEmitter) -> Result<String> {
        let inner = &self.inner;

        emitter.enter(RequestPhase::AwaitingCredential)?;
        let credential = inner.credentials.resolve().await?;
        emitter.status(STATUS_MESSAGE);

        emitter.enter(RequestPhase::GatheringContext)?;
        let context = inner
            .gatherer
            .gather(request.change.number, &request.files)
            .await?;

        emitter.enter(RequestPhase::Composing)?;
        let prompt = compose(&request.prompt, &request.change, &context);

        emitter.enter(RequestPhase::Generating)?;
        let model = request.model_or(&inner.default_model);
        inner.generator.generate(&credential, model, &prompt).await
    }
}

impl ReviewProvider for GeminiProvider {
    fn capabilities(&self) -> &'static Capabilities {
        &Self::CAPABILITIES
    }

    fn models(&self) -> Models {
        catalog::models_for(&self.inner.default_model)
    }

    fn actions(&self) -> Actions {
        catalog::actions()
    }

    fn chat(&self, request: ReviewRequest, listener: Arc<dyn ChatResponseListener>) -> JoinHandle<()> {
        let provider = self.clone();
        tokio::spawn(async move { provider.run(request, listener).await })
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("default_model", &self.inner.default_model)
            .field("credentials", &self.inner.credentials)
            .field("limits", &self.inner.gatherer.limits())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Credential, CredentialBackend};
    use crate::generation::{GeminiClient, NO_TEXT_SENTINEL};
    use crate::review::listener::{ListenerEvent, RecordingListener, ABANDONED_MESSAGE};
    use crate::review::request::{ChangeInfo, ChangedFile, DiffHunk, FileDiff, COMMIT_MSG_PATH};
    use crate::{Error, CONTEXT_FETCH_FALLBACK};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct KeyBackend(Option<&'static str>);

    #[async_trait]
    impl CredentialBackend for KeyBackend {
        fn name(&self) -> &'static str {
            "test"
        }

        async fn lookup(&self) -> Option<String> {
            self.0.map(String::from)
        }

        fn provisioning_hint(&self) -> String {
            "Missing Gemini API key. Store it server-side via:\nPUT /a/accounts/self/geminiToken".to_string()
        }
    }

    #[derive(Default)]
    struct Diffs {
        fail: bool,
        fetched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DiffSource for Diffs {
        async fn fetch_diff(&self, _change: u64, path: &str) -> Result<FileDiff> {
            self.fetched.lock().unwrap().push(path.to_string());
            if self.fail {
                return Err(Error::Other("connection refused".to_string()));
            }
            Ok(FileDiff {
                content: vec![DiffHunk {
                    b: Some(vec![format!("// {}", path)]),
                    ..Default::default()
                }],
            })
        }
    }

    /// Generator that records prompts and echoes a fixed answer
    struct Echo {
        answer: String,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl Echo {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Generator for Echo {
        async fn generate(&self, _credential: &Credential, _model: &str, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answer.clone())
        }
    }

    struct Panics;

    #[async_trait]
    impl Generator for Panics {
        async fn generate(&self, _credential: &Credential, _model: &str, _prompt: &str) -> Result<String> {
            panic!("generator exploded");
        }
    }

    fn provider(key: Option<&'static str>, diffs: Arc<Diffs>, generator: Arc<dyn Generator>) -> GeminiProvider {
        GeminiProvider::new(
            CredentialResolver::new(Arc::new(KeyBackend(key))),
            ContextGatherer::new(diffs, ContextLimits::default()),
            generator,
            DEFAULT_MODEL,
        )
    }

    fn request(prompt: &str, paths: &[&str]) -> ReviewRequest {
        ReviewRequest::new(prompt, ChangeInfo::new(4242))
            .with_files(paths.iter().map(|p| ChangedFile::new(*p)).collect())
    }

    #[tokio::test]
    async fn test_missing_credential_reports_once_and_skips_generation() {
        let diffs = Arc::new(Diffs::default());
        let echo = Arc::new(Echo::new("unused"));
        let listener = Arc::new(RecordingListener::new());

        provider(None, diffs.clone(), echo.clone())
            .run(request("Review", &["a.rs"]), listener.clone())
            .await;

        let events = listener.events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            ListenerEvent::Error(msg) => assert!(msg.contains("/accounts/self/geminiToken")),
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(events[1], ListenerEvent::Done);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
        assert!(diffs.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_emits_status_then_answer_then_done() {
        let echo = Arc::new(Echo::new("LGTM"));
        let listener = Arc::new(RecordingListener::new());

        provider(Some("key"), Arc::new(Diffs::default()), echo.clone())
            .run(request("Review", &[COMMIT_MSG_PATH, "a.rs"]), listener.clone())
            .await;

        assert_eq!(listener.responses(), vec![STATUS_MESSAGE.to_string(), "LGTM".to_string()]);
        assert!(listener.errors().is_empty());
        assert_eq!(listener.done_count(), 1);
        assert_eq!(listener.events().last(), Some(&ListenerEvent::Done));

        let prompts = echo.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            "Review\n\nContext: This is a code review for change 4242.\nCode Content:\n\n--- File: a.rs ---\n// a.rs\n"
        );
    }

    #[tokio::test]
    async fn test_context_failure_uses_fallback_message() {
        let echo = Arc::new(Echo::new("unused"));
        let listener = Arc::new(RecordingListener::new());

        provider(Some("key"), Arc::new(Diffs { fail: true, ..Default::default() }), echo.clone())
            .run(request("Review", &["a.rs"]), listener.clone())
            .await;

        assert_eq!(listener.responses(), vec![STATUS_MESSAGE.to_string()]);
        assert_eq!(listener.errors(), vec![CONTEXT_FETCH_FALLBACK.to_string()]);
        assert_eq!(listener.done_count(), 1);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_identical_requests_yield_identical_prompts_and_answers() {
        let echo = Arc::new(Echo::new("same answer"));
        let provider = provider(Some("key"), Arc::new(Diffs::default()), echo.clone());

        let first = Arc::new(RecordingListener::new());
        let second = Arc::new(RecordingListener::new());
        provider.run(request("Review {{patch}}", &["a.rs", "b.rs"]), first.clone()).await;
        provider.run(request("Review {{patch}}", &["a.rs", "b.rs"]), second.clone()).await;

        let prompts = echo.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], prompts[1]);
        assert_eq!(first.responses(), second.responses());
    }

    #[tokio::test]
    async fn test_chat_spawns_and_delivers_through_listener() {
        let listener = Arc::new(RecordingListener::new());
        let provider = provider(Some("key"), Arc::new(Diffs::default()), Arc::new(Echo::new("async")));

        provider
            .chat(request("Review", &["a.rs"]), listener.clone())
            .await
            .unwrap();

        assert_eq!(listener.responses().last().map(String::as_str), Some("async"));
        assert_eq!(listener.done_count(), 1);
    }

    #[tokio::test]
    async fn test_panic_still_ends_with_error_and_done() {
        let listener = Arc::new(RecordingListener::new());
        let provider = provider(Some("key"), Arc::new(Diffs::default()), Arc::new(Panics));

        let joined = provider.chat(request("Review", &["a.rs"]), listener.clone()).await;
        assert!(joined.is_err());

        assert_eq!(listener.errors(), vec![ABANDONED_MESSAGE.to_string()]);
        assert_eq!(listener.done_count(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_with_mock_gemini() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}]
            })))
            .mount(&server)
            .await;

        let generator = Arc::new(GeminiClient::new(&server.uri()).unwrap());
        let listener = Arc::new(RecordingListener::new());
        provider(Some("key"), Arc::new(Diffs::default()), generator)
            .run(request("Review", &["a.rs"]).with_model("gemini-2.5-pro"), listener.clone())
            .await;

        assert_eq!(listener.responses().last().map(String::as_str), Some("Hello world"));
        assert_eq!(listener.done_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_candidates_is_a_response_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let generator = Arc::new(GeminiClient::new(&server.uri()).unwrap());
        let listener = Arc::new(RecordingListener::new());
        provider(Some("key"), Arc::new(Diffs::default()), generator)
            .run(request("Review", &[]), listener.clone())
            .await;

        assert_eq!(listener.responses().last().map(String::as_str), Some(NO_TEXT_SENTINEL));
        assert!(listener.errors().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported_with_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let generator = Arc::new(GeminiClient::new(&server.uri()).unwrap());
        let listener = Arc::new(RecordingListener::new());
        provider(Some("key"), Arc::new(Diffs::default()), generator)
            .run(request("Review", &["a.rs"]), listener.clone())
            .await;

        let errors = listener.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("429"));
        assert!(errors[0].contains("quota exceeded"));
        assert_eq!(listener.responses(), vec![STATUS_MESSAGE.to_string()]);
        assert_eq!(listener.done_count(), 1);
    }

    #[test]
    fn test_capabilities_are_static() {
        let caps = GeminiProvider::CAPABILITIES;
        assert!(!caps.supports_add_context);
        assert!(!caps.supports_history);
        assert!(!caps.supports_more_menu);
        assert!(caps.supports_this_change);
    }

    #[test]
    fn test_from_config_uses_configured_model() {
        let mut config = Config::default();
        config.gemini.model = "gemini-2.5-pro".to_string();
        config.review.max_files = 3;

        let provider = GeminiProvider::from_config(
            &config,
            CredentialResolver::new(Arc::new(KeyBackend(None))),
            Arc::new(Diffs::default()),
            Arc::new(Echo::new("")),
        );
        assert_eq!(provider.default_model(), "gemini-2.5-pro");
        assert_eq!(provider.models().default_model_id, "gemini-2.5-pro");
        assert_eq!(provider.actions().actions.len(), 2);
        assert_eq!(provider.capabilities(), &GeminiProvider::CAPABILITIES);
    }
}
