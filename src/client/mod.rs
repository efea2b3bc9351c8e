//! Backend client.
//!
//! Provides the HTTP client and the session-facing backend trait.

mod backend;
mod http;

pub use backend::QuizBackend;
pub use http::ApiClient;
