//! Error types for Gerrit operations

use thiserror::Error;

/// Result type for Gerrit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during Gerrit operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level HTTP failure
    #[error("Gerrit request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the REST API
    #[error("Gerrit returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    /// Resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication error
    #[error("Gerrit authentication error: {0}")]
    Auth(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client configuration error
    #[error("Gerrit configuration error: {0}")]
    Config(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<Error> for aireview_core::Error {
    fn from(err: Error) -> Self {
        aireview_core::Error::Other(err.to_string())
    }
}
