//! Masker error types

use std::time::Duration;
use thiserror::Error;

/// Masker error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request shape (e.g. both or neither of text/json set)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Language not supported by the configured recognizer
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Input exceeds a configured size or depth ceiling
    #[error("Input too large: {0}")]
    InputTooLarge(String),

    /// The entity recognizer did not return within the configured timeout
    #[error("Entity recognizer timed out after {0:?}")]
    RecognizerTimeout(Duration),

    /// The entity recognizer failed outright
    #[error("Entity recognizer failed: {0}")]
    RecognizerFailure(String),

    /// Admission rejected by a rate-limit scope
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Estimated wait until a token is available
        retry_after: Duration,
    },

    /// Policy is unusable (incomplete category mapping, bad file)
    #[error("Policy error: {0}")]
    Policy(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for masker operations
pub type Result<T> = std::result::Result<T, Error>;
