//! # vocazoo
//!
//! A terminal client for the vocazoo vocabulary quiz backend.
//!
//! The backend owns questions, scoring and timing. This crate drives a quiz
//! session against it (countdown, play, result report) and renders it in
//! the terminal.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use vocazoo::{ApiClient, AuthSession, Config, QuizSource, SessionController};
//!
//! # async fn example() -> Result<(), vocazoo::Error> {
//! let config = Config::from_env()?;
//! let auth = AuthSession::new("token")?;
//! let client = Arc::new(ApiClient::from_config(&config, Some(auth))?);
//!
//! let controller = SessionController::new(client, QuizSource::WordSet(1), config.timing());
//! let summary = controller.run().await;
//! println!("{} points", summary.score);
//! # Ok(())
//! # }
//! ```

mod app;
pub mod auth;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod levels;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod terminal;
#[cfg(test)]
mod test_support;
mod ui;

pub use app::{Input, handle_input, play};
pub use auth::{AuthSession, TokenStore};
pub use client::{ApiClient, QuizBackend};
pub use config::Config;
pub use error::{ApiError, AuthError, ConfigError, Error, SessionError};
pub use protocol::{QuizSource, WrongAnswer};
pub use session::{
    EndReason, Phase, QuizSession, SaveStatus, SessionController, SessionSummary, SessionTiming,
};
