//! Error types for the review provider

use thiserror::Error;

/// Result type alias for review provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback shown to the user when a diff fetch fails
pub const CONTEXT_FETCH_FALLBACK: &str = "Error fetching patch content";

/// Error type for review provider operations
#[derive(Error, Debug)]
pub enum Error {
    /// No credential could be resolved; the message explains how to provision one
    #[error("{0}")]
    CredentialMissing(String),

    /// A diff fetch against the host review system failed
    #[error("Failed to fetch diff for {path}: {reason}")]
    ContextFetch { path: String, reason: String },

    /// The generation endpoint answered with a non-success status
    #[error("Gemini error {status}: {body}")]
    GenerationApi { status: u16, body: String },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Text handed to the listener's `emit_error` for this failure
    ///
    /// Diff fetch failures collapse to a generic message because the
    /// underlying cause is rarely useful to the person reading the chat.
    pub fn listener_message(&self) -> String {
        match self {
            Error::ContextFetch { .. } => CONTEXT_FETCH_FALLBACK.to_string(),
            Error::Other(msg) if msg.trim().is_empty() => CONTEXT_FETCH_FALLBACK.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error is the recoverable "no credential" condition
    pub fn is_credential_missing(&self) -> bool {
        matches!(self, Error::CredentialMissing(_))
    }
}
