//! Error types for skillcoach-client
//!
//! Defines client-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for the SkillCoach client
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure (connection refused, timeout, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    /// Missing or expired bearer token (HTTP 401)
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    /// Microphone acquisition or recording errors
    #[error("Audio capture error: {0}")]
    Capture(String),

    /// Audio decoding or resampling errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// WAV encoding errors
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Analysis task did not reach a terminal status in time
    #[error("Analysis task {task_id} still not finished after {waited_secs}s")]
    PollTimeout { task_id: String, waited_secs: u64 },

    /// Polling stopped before a terminal status
    #[error("Polling for task {0} was cancelled")]
    Cancelled(String),

    /// Invalid request parameter caught before sending
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// JSON encoding or decoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// skillcoach-common error
    #[error(transparent)]
    Common(#[from] skillcoach_common::Error),
}

impl Error {
    /// True for errors worth retrying on the next poll tick
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Convenience Result type using the client Error
pub type Result<T> = std::result::Result<T, Error>;
