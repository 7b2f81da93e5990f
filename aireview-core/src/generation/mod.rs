//! Text generation backends
//!
//! The provider only needs one operation from a model: turn a prompt into
//! text. [`Generator`] is that seam; [`GeminiClient`] is the HTTP
//! implementation.

mod gemini;

use async_trait::async_trait;

use crate::credential::Credential;
use crate::Result;

pub use gemini::{extract_text, GeminiClient, NO_TEXT_SENTINEL};

/// A single-shot prompt-to-text model call
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for `prompt` with `model`
    async fn generate(&self, credential: &Credential, model: &str, prompt: &str) -> Result<String>;
}
