//! aireview Gerrit - Gerrit REST integration for the review provider
//!
//! This crate provides the host-side REST calls the provider depends on:
//! per-file diffs, changed-file listings, change metadata and the
//! account-scoped Gemini token.

mod change;
mod client;
mod diff;
mod error;
mod token;

pub use change::ChangedFileInfo;
pub use client::GerritClient;
pub use error::{Error, Result};
