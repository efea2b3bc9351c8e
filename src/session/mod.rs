//! Quiz session lifecycle.

mod controller;
mod state;

pub use controller::{SessionController, SessionSummary, SessionTiming, SharedSession};
pub use state::{EndReason, Feedback, Phase, QuizSession, SaveStatus};
