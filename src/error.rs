//! Error types for each layer of the client.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while talking to the quiz backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The backend rejected the token (401 or 422).
    #[error("not authorized ({0}); log in again")]
    Unauthorized(StatusCode),
    #[error("backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// Errors raised by the local token store and credential checks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("not logged in; run `vocazoo login <username>` first")]
    NotLoggedIn,
    #[error("{0}")]
    Invalid(&'static str),
    #[error("backend did not return a token")]
    MissingToken,
    #[error("token store: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors raised by session state transitions.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot move session from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

/// Top-level error for the command-line client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to initialize logging: {0}")]
    Logging(String),
    #[error("session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("wrong answer review unlocks at level {required} (you are level {level})")]
    Locked { required: u32, level: u32 },
    #[error("no wrong answers to review")]
    NothingToReview,
}

impl Error {
    /// True when the backend rejected the stored token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(e) if e.is_unauthorized())
    }
}
