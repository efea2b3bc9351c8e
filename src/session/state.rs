//! Quiz session state.

use std::fmt;

use tokio::time::Instant;

use crate::error::SessionError;
use crate::protocol::{Question, SaveResultRequest, WrongAnswer};

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The polled remaining time reached zero.
    TimeExhausted,
    /// The backend ran out of questions.
    Completed,
    /// The backend answered a submission with `time_over`.
    TimeOver,
    /// The user left the quiz.
    Quit,
    /// The backend rejected the token.
    Unauthorized,
    /// A backend call failed.
    Failed(String),
}

impl EndReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, EndReason::Unauthorized | EndReason::Failed(_))
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::TimeExhausted | EndReason::TimeOver => write!(f, "Time is up"),
            EndReason::Completed => write!(f, "All questions answered"),
            EndReason::Quit => write!(f, "Quiz abandoned"),
            EndReason::Unauthorized => write!(f, "Session expired; log in again"),
            EndReason::Failed(message) => write!(f, "Connection problem: {message}"),
        }
    }
}

/// Lifecycle phase. Only ever moves forward: countdown, playing, ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Countdown,
    Playing,
    Ended(EndReason),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Countdown => "countdown",
            Phase::Playing => "playing",
            Phase::Ended(_) => "ended",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Phase::Playing)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Phase::Ended(_))
    }
}

/// Transient answer feedback, hidden once `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    pub correct: bool,
    pub expires_at: Instant,
}

/// Outcome of reporting the final result to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saving,
    Saved,
    Failed(String),
}

/// One timed quiz attempt, from countdown to end screen.
#[derive(Debug, Clone)]
pub struct QuizSession {
    phase: Phase,
    countdown_remaining: u32,
    current_question: Option<Question>,
    answer_input: String,
    score: f64,
    remaining_time: f64,
    solved_count: u32,
    wrong_answers: Vec<WrongAnswer>,
    feedback: Option<Feedback>,
    submitting: bool,
    started: bool,
    save_status: Option<SaveStatus>,
}

impl QuizSession {
    pub fn new(countdown: u32) -> Self {
        Self {
            phase: Phase::Countdown,
            countdown_remaining: countdown,
            current_question: None,
            answer_input: String::new(),
            score: 0.0,
            remaining_time: 0.0,
            solved_count: 0,
            wrong_answers: Vec::new(),
            feedback: None,
            submitting: false,
            started: false,
            save_status: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn end_reason(&self) -> Option<&EndReason> {
        match &self.phase {
            Phase::Ended(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.countdown_remaining
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    pub fn answer_input(&self) -> &str {
        &self.answer_input
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn remaining_time(&self) -> f64 {
        self.remaining_time
    }

    pub fn solved_count(&self) -> u32 {
        self.solved_count
    }

    pub fn wrong_answers(&self) -> &[WrongAnswer] {
        &self.wrong_answers
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// True once the backend acknowledged the start of the test.
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn save_status(&self) -> Option<&SaveStatus> {
        self.save_status.as_ref()
    }

    /// Feedback still visible at `now`.
    pub fn feedback_at(&self, now: Instant) -> Option<&Feedback> {
        self.feedback.as_ref().filter(|f| now < f.expires_at)
    }

    /// One countdown second elapsed. Returns what is left.
    pub fn tick_countdown(&mut self) -> u32 {
        if self.phase == Phase::Countdown {
            self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        }
        self.countdown_remaining
    }

    /// The backend acknowledged the start, so a result is owed even if the
    /// session ended while the request was in flight.
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    pub fn begin_playing(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Countdown {
            return Err(SessionError::InvalidTransition {
                from: self.phase.name(),
                to: Phase::Playing.name(),
            });
        }
        self.phase = Phase::Playing;
        self.started = true;
        Ok(())
    }

    /// Move to `Ended`. The first reason wins; returns false if the session
    /// had already ended.
    pub fn end(&mut self, reason: EndReason) -> bool {
        if self.phase.is_ended() {
            return false;
        }
        self.phase = Phase::Ended(reason);
        self.submitting = false;
        true
    }

    pub fn set_question(&mut self, question: Question) {
        if self.phase.is_playing() {
            self.current_question = Some(question);
        }
    }

    /// Drop the answered question while the next one is not ready.
    pub fn clear_question(&mut self) {
        if self.phase.is_playing() {
            self.current_question = None;
        }
    }

    pub fn input_push(&mut self, c: char) {
        if self.phase.is_playing() {
            self.answer_input.push(c);
        }
    }

    pub fn input_pop(&mut self) {
        self.answer_input.pop();
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        if self.phase.is_playing() {
            self.answer_input = text.into();
        }
    }

    /// Mirror the backend's score and remaining time.
    pub fn mirror_score(&mut self, score: f64, remaining_time: f64) {
        if self.phase.is_playing() {
            self.score = score;
            self.remaining_time = remaining_time;
        }
    }

    /// Claim the current question and trimmed answer for submission.
    ///
    /// Returns `None` when nothing should be sent: not playing, no question,
    /// blank answer, or a submission already in flight. The input is left
    /// untouched so the user can keep editing.
    pub fn begin_submission(&mut self) -> Option<(Question, String)> {
        if !self.phase.is_playing() || self.submitting {
            return None;
        }
        let question = self.current_question.clone()?;
        let answer = self.answer_input.trim();
        if answer.is_empty() {
            return None;
        }
        self.submitting = true;
        Some((question, answer.to_string()))
    }

    pub fn finish_submission(&mut self) {
        self.submitting = false;
    }

    /// Count a correct answer. Returns false if the session is no longer
    /// playing.
    pub fn record_correct(&mut self, message: String, expires_at: Instant) -> bool {
        if !self.phase.is_playing() {
            return false;
        }
        self.advance(Feedback {
            text: message,
            correct: true,
            expires_at,
        });
        true
    }

    /// Count a wrong answer and remember it for review.
    pub fn record_wrong(&mut self, entry: WrongAnswer, expires_at: Instant) -> bool {
        if !self.phase.is_playing() {
            return false;
        }
        let text = format!("Wrong. The answer is \"{}\".", entry.correct_answer);
        self.wrong_answers.push(entry);
        self.advance(Feedback {
            text,
            correct: false,
            expires_at,
        });
        true
    }

    fn advance(&mut self, feedback: Feedback) {
        self.solved_count += 1;
        self.answer_input.clear();
        self.feedback = Some(feedback);
    }

    pub fn set_save_status(&mut self, status: SaveStatus) {
        self.save_status = Some(status);
    }

    /// Final result as reported to the backend.
    pub fn result(&self) -> SaveResultRequest {
        SaveResultRequest {
            score: self.score,
            wrong_answers: self.wrong_answers.clone(),
        }
    }
}
