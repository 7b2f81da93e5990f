//! aireview core - a Gemini-backed code review provider
//!
//! This crate turns a review request from a code review host into one
//! Gemini `generateContent` call and reports the outcome through a
//! listener. Host services (diffs, stored tokens) are reached through the
//! [`DiffSource`] and [`TokenSource`] traits.

pub mod config;
pub mod credential;
pub mod error;
pub mod generation;
pub mod provider;
pub mod review;
pub mod secrets;

pub use config::Config;
pub use credential::{
    Credential, CredentialBackend, CredentialResolver, CredentialSourceKind,
    GerritTokenCredentials, LocalCredentials, TokenSource,
};
pub use error::{Error, Result, CONTEXT_FETCH_FALLBACK};
pub use generation::{GeminiClient, Generator};
pub use provider::{GeminiProvider, ReviewProvider};
pub use review::{
    ChangeInfo, ChangedFile, ChatResponse, ChatResponseListener, ContextGatherer, DiffSource,
    FileDiff, FileStatus, ReviewRequest,
};
pub use secrets::Secrets;
