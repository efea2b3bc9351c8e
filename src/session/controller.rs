//! Drives a quiz session against the backend.
//!
//! The controller owns the session lifecycle: a countdown, the start-test
//! call, the score poller, answer submission and the final result report.
//! The session itself sits behind a mutex shared with the terminal UI;
//! the lock is never held across a backend call.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::client::QuizBackend;
use crate::error::ApiError;
use crate::protocol::{QuestionReply, QuizSource, Verdict, WrongAnswer};

use super::state::{EndReason, Phase, QuizSession, SaveStatus};

const DEFAULT_CORRECT_MESSAGE: &str = "Correct!";

/// Shared session handle.
pub type SharedSession = Arc<Mutex<QuizSession>>;

/// Timers used by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Countdown length in ticks.
    pub countdown: u32,
    pub tick: Duration,
    pub poll_interval: Duration,
    pub correct_feedback: Duration,
    pub wrong_feedback: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            countdown: 3,
            tick: Duration::from_secs(1),
            poll_interval: Duration::from_millis(250),
            correct_feedback: Duration::from_millis(1200),
            wrong_feedback: Duration::from_millis(1800),
        }
    }
}

/// Final state of a finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub reason: EndReason,
    pub score: f64,
    pub solved_count: u32,
    pub wrong_answers: Vec<WrongAnswer>,
    pub save_status: Option<SaveStatus>,
}

#[derive(Clone)]
pub struct SessionController {
    backend: Arc<dyn QuizBackend>,
    source: Arc<QuizSource>,
    timing: SessionTiming,
    session: SharedSession,
    phase_tx: Arc<watch::Sender<Phase>>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn QuizBackend>, source: QuizSource, timing: SessionTiming) -> Self {
        let (phase_tx, _) = watch::channel(Phase::Countdown);
        Self {
            backend,
            source: Arc::new(source),
            timing,
            session: Arc::new(Mutex::new(QuizSession::new(timing.countdown))),
            phase_tx: Arc::new(phase_tx),
        }
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    pub fn timing(&self) -> SessionTiming {
        self.timing
    }

    /// Watch phase changes.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase_tx.subscribe()
    }

    /// Run the whole session: countdown, play until the session ends, then
    /// report the result.
    pub async fn run(&self) -> SessionSummary {
        let mut phase_rx = self.subscribe();

        if self.start_countdown().await {
            let poller = {
                let controller = self.clone();
                tokio::spawn(async move { controller.poll_score().await })
            };

            if phase_rx.wait_for(Phase::is_ended).await.is_err() {
                warn!("phase channel closed before the session ended");
            }
            poller.abort();
        }

        self.save_result().await;
        self.summary().await
    }

    /// Count down once per tick. When the count reaches 1 the test is started
    /// on the backend; on success the session starts playing and the first
    /// question is fetched.
    ///
    /// Returns true if the session is now playing.
    pub async fn start_countdown(&self) -> bool {
        let mut ticker = time::interval(self.timing.tick);
        ticker.tick().await;

        let mut remaining = self.session.lock().await.countdown_remaining();
        while remaining > 1 {
            ticker.tick().await;
            let mut session = self.session.lock().await;
            if session.phase().is_ended() {
                return false;
            }
            remaining = session.tick_countdown();
            debug!(remaining, "countdown");
        }

        if self.session.lock().await.phase().is_ended() {
            return false;
        }

        info!(source = ?self.source, "starting test");
        if let Err(e) = self.backend.start_test(&self.source).await {
            error!("failed to start test: {e}");
            self.end(failure_reason(&e)).await;
            return false;
        }

        {
            let mut session = self.session.lock().await;
            session.mark_started();
            if let Err(e) = session.begin_playing() {
                info!("test started after the session ended: {e}");
                return false;
            }
            self.phase_tx.send_replace(Phase::Playing);
        }
        info!("session playing");

        self.fetch_question().await;
        true
    }

    /// The polled remaining time ran out.
    pub async fn on_time_exhausted(&self) {
        self.end(EndReason::TimeExhausted).await;
    }

    /// User-initiated end.
    pub async fn quit(&self) {
        self.end(EndReason::Quit).await;
    }

    /// Mirror score and remaining time from the backend every poll interval
    /// while playing. Stops when the session leaves `Playing`, when time runs
    /// out, or on the first error.
    pub async fn poll_score(&self) {
        let mut ticker = time::interval(self.timing.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.session.lock().await.phase().is_playing() {
                break;
            }

            let score = match self.backend.fetch_score().await {
                Ok(score) => score,
                Err(e) => {
                    error!("score poll failed: {e}");
                    self.end(failure_reason(&e)).await;
                    break;
                }
            };

            {
                let mut session = self.session.lock().await;
                if !session.phase().is_playing() {
                    break;
                }
                session.mirror_score(score.score, score.remaining_time);
            }

            if score.remaining_time <= 0.0 {
                debug!(score = score.score, "time exhausted");
                self.on_time_exhausted().await;
                break;
            }
        }
    }

    /// Submit the current answer and act on the verdict.
    ///
    /// Blank answers are ignored and leave the input as typed.
    pub async fn submit(&self) {
        let Some((question, answer)) = self.session.lock().await.begin_submission() else {
            return;
        };

        let outcome = self.backend.check_answer(&question, &answer).await;

        let advance = {
            let mut session = self.session.lock().await;
            session.finish_submission();

            match outcome {
                Ok(reply) => match reply.result {
                    Verdict::Correct => {
                        let message = reply
                            .message
                            .unwrap_or_else(|| DEFAULT_CORRECT_MESSAGE.to_string());
                        let expires_at = Instant::now() + self.timing.correct_feedback;
                        session.record_correct(message, expires_at)
                    }
                    Verdict::Wrong => {
                        let entry = WrongAnswer {
                            question: question.english.clone(),
                            user_answer: answer,
                            correct_answer: reply.correct_answer.unwrap_or_default(),
                        };
                        let expires_at = Instant::now() + self.timing.wrong_feedback;
                        session.record_wrong(entry, expires_at)
                    }
                    Verdict::TimeOver => {
                        self.end_locked(&mut session, EndReason::TimeOver);
                        false
                    }
                },
                Err(e) => {
                    error!("answer check failed: {e}");
                    self.end_locked(&mut session, failure_reason(&e));
                    false
                }
            }
        };

        if advance {
            self.fetch_question().await;
        }
    }

    /// Ask the backend for the next question.
    async fn fetch_question(&self) {
        match self.backend.fetch_question().await {
            Ok(QuestionReply::Question(question)) => {
                debug!(english = %question.english, "next question");
                self.session.lock().await.set_question(question);
            }
            Ok(QuestionReply::Completed) => {
                info!("backend reports test completed");
                self.end(EndReason::Completed).await;
            }
            Ok(QuestionReply::NotReady) => {
                debug!("question not ready");
                self.session.lock().await.clear_question();
            }
            Err(e) => {
                error!("failed to fetch question: {e}");
                self.end(failure_reason(&e)).await;
            }
        }
    }

    /// Report the final score and wrong answers once a played session ended.
    async fn save_result(&self) {
        let result = {
            let mut session = self.session.lock().await;
            if !session.has_started() || session.save_status().is_some() {
                return;
            }
            session.set_save_status(SaveStatus::Saving);
            session.result()
        };

        let status = match self.backend.save_result(&result).await {
            Ok(()) => {
                info!(score = result.score, wrong = result.wrong_answers.len(), "result saved");
                SaveStatus::Saved
            }
            Err(e) => {
                error!("failed to save result: {e}");
                SaveStatus::Failed(e.to_string())
            }
        };
        self.session.lock().await.set_save_status(status);
    }

    async fn end(&self, reason: EndReason) {
        let mut session = self.session.lock().await;
        self.end_locked(&mut session, reason);
    }

    fn end_locked(&self, session: &mut QuizSession, reason: EndReason) {
        if session.end(reason.clone()) {
            info!(?reason, "session ended");
            self.phase_tx.send_replace(session.phase().clone());
        }
    }

    pub async fn summary(&self) -> SessionSummary {
        let session = self.session.lock().await;
        SessionSummary {
            reason: session.end_reason().cloned().unwrap_or(EndReason::Quit),
            score: session.score(),
            solved_count: session.solved_count(),
            wrong_answers: session.wrong_answers().to_vec(),
            save_status: session.save_status().cloned(),
        }
    }
}

fn failure_reason(err: &ApiError) -> EndReason {
    if err.is_unauthorized() {
        EndReason::Unauthorized
    } else {
        EndReason::Failed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::protocol::{CheckAnswerResponse, Question, SaveResultRequest, ScoreResponse};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start,
        Question,
        Check(String),
        Score,
        Save(SaveResultRequest),
    }

    #[derive(Default)]
    struct FakeBackend {
        calls: StdMutex<Vec<Call>>,
        start_error: Option<StatusCode>,
        start_delay: Option<Duration>,
        score_error: bool,
        questions: StdMutex<VecDeque<QuestionReply>>,
        verdicts: StdMutex<VecDeque<CheckAnswerResponse>>,
        scores: StdMutex<VecDeque<ScoreResponse>>,
    }

    impl FakeBackend {
        fn with_questions(words: &[&str]) -> Self {
            let questions = words
                .iter()
                .map(|w| QuestionReply::Question(Question::new(*w)))
                .collect();
            Self {
                questions: StdMutex::new(questions),
                ..Self::default()
            }
        }

        fn push_verdict(&self, result: Verdict, correct_answer: Option<&str>) {
            self.verdicts.lock().unwrap().push_back(CheckAnswerResponse {
                result,
                correct_answer: correct_answer.map(str::to_string),
                message: None,
            });
        }

        fn push_score(&self, score: f64, remaining_time: f64) {
            self.scores.lock().unwrap().push_back(ScoreResponse {
                score,
                remaining_time,
            });
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, matcher: fn(&Call) -> bool) -> usize {
            self.calls().iter().filter(|c| matcher(c)).count()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "boom".to_string(),
        }
    }

    #[async_trait]
    impl QuizBackend for FakeBackend {
        async fn start_test(&self, _source: &QuizSource) -> Result<(), ApiError> {
            self.record(Call::Start);
            if let Some(delay) = self.start_delay {
                time::sleep(delay).await;
            }
            match self.start_error {
                Some(status) if status == StatusCode::UNAUTHORIZED => {
                    Err(ApiError::Unauthorized(status))
                }
                Some(_) => Err(server_error()),
                None => Ok(()),
            }
        }

        async fn fetch_question(&self) -> Result<QuestionReply, ApiError> {
            self.record(Call::Question);
            Ok(self
                .questions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(QuestionReply::NotReady))
        }

        async fn check_answer(
            &self,
            _question: &Question,
            answer: &str,
        ) -> Result<CheckAnswerResponse, ApiError> {
            self.record(Call::Check(answer.to_string()));
            self.verdicts
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(server_error)
        }

        async fn fetch_score(&self) -> Result<ScoreResponse, ApiError> {
            self.record(Call::Score);
            if self.score_error {
                return Err(server_error());
            }
            let mut scores = self.scores.lock().unwrap();
            Ok(if scores.len() > 1 {
                scores.pop_front().unwrap()
            } else {
                scores.front().copied().unwrap_or(ScoreResponse {
                    score: 0.0,
                    remaining_time: 30.0,
                })
            })
        }

        async fn save_result(&self, result: &SaveResultRequest) -> Result<(), ApiError> {
            self.record(Call::Save(result.clone()));
            Ok(())
        }
    }

    fn controller(backend: &Arc<FakeBackend>, countdown: u32) -> SessionController {
        let timing = SessionTiming {
            countdown,
            ..SessionTiming::default()
        };
        SessionController::new(backend.clone(), QuizSource::WordSet(7), timing)
    }

    async fn playing(backend: &Arc<FakeBackend>) -> SessionController {
        let controller = controller(backend, 1);
        assert!(controller.start_countdown().await);
        controller
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_starts_test_once() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple"]));
        let controller = controller(&backend, 3);

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.start_countdown().await })
        };

        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(backend.count(|c| *c == Call::Start), 0);
        assert_eq!(controller.session().lock().await.countdown_remaining(), 2);

        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(backend.count(|c| *c == Call::Start), 1);
        assert!(task.await.unwrap());

        let session = controller.session();
        let session = session.lock().await;
        assert_eq!(session.phase(), &Phase::Playing);
        assert_eq!(session.current_question().unwrap().english, "apple");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_remaining_time_ends_and_saves() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple"]));
        backend.push_score(30.0, 4.0);
        backend.push_score(50.0, 0.0);
        let controller = controller(&backend, 3);

        let started = Instant::now();
        let summary = controller.run().await;
        let poll = SessionTiming::default().poll_interval;

        assert_eq!(summary.reason, EndReason::TimeExhausted);
        assert_eq!(summary.score, 50.0);
        assert_eq!(summary.save_status, Some(SaveStatus::Saved));
        assert!(started.elapsed() <= Duration::from_secs(2) + poll * 2);

        let saves: Vec<_> = backend
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Save(result) => Some(result),
                _ => None,
            })
            .collect();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].score, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_correct_answer_advances() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple", "banana"]));
        backend.push_verdict(Verdict::Correct, None);
        let controller = playing(&backend).await;

        controller.session().lock().await.set_input("사과");
        controller.submit().await;

        let session = controller.session();
        let session = session.lock().await;
        assert_eq!(session.solved_count(), 1);
        assert!(session.wrong_answers().is_empty());
        assert_eq!(session.answer_input(), "");
        assert_eq!(session.current_question().unwrap().english, "banana");

        let now = Instant::now();
        let feedback = session.feedback_at(now).unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.text, "Correct!");
        assert!(session.feedback_at(now + Duration::from_millis(1300)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_answer_recorded() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple", "banana"]));
        backend.push_verdict(Verdict::Wrong, Some("사과"));
        let controller = playing(&backend).await;

        controller.session().lock().await.set_input(" 배 ");
        controller.submit().await;

        let session = controller.session();
        let session = session.lock().await;
        assert_eq!(session.solved_count(), 1);
        assert_eq!(
            session.wrong_answers(),
            &[WrongAnswer {
                question: "apple".to_string(),
                user_answer: "배".to_string(),
                correct_answer: "사과".to_string(),
            }]
        );
        assert_eq!(session.current_question().unwrap().english, "banana");
        let feedback = session.feedback_at(Instant::now()).unwrap();
        assert!(!feedback.correct);
        assert!(feedback.text.contains("사과"));
        assert!(
            session
                .feedback_at(Instant::now() + Duration::from_millis(1700))
                .is_some()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_over_ends_without_advancing() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple", "banana"]));
        backend.push_verdict(Verdict::TimeOver, None);
        let controller = playing(&backend).await;

        controller.session().lock().await.set_input("사과");
        controller.submit().await;

        let session = controller.session();
        let session = session.lock().await;
        assert_eq!(session.end_reason(), Some(&EndReason::TimeOver));
        assert_eq!(session.solved_count(), 0);
        assert_eq!(session.current_question().unwrap().english, "apple");
        assert_eq!(backend.count(|c| *c == Call::Question), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_reply_clears_answered_question() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple"]));
        backend.push_verdict(Verdict::Correct, None);
        let controller = playing(&backend).await;

        controller.session().lock().await.set_input("사과");
        controller.submit().await;
        assert!(controller.session().lock().await.current_question().is_none());

        controller.session().lock().await.set_input("사과");
        controller.submit().await;
        assert_eq!(backend.count(|c| matches!(c, Call::Check(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_answer_is_ignored() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple"]));
        let controller = playing(&backend).await;

        controller.session().lock().await.set_input("  ");
        controller.submit().await;

        assert_eq!(backend.count(|c| matches!(c, Call::Check(_))), 0);
        assert_eq!(controller.session().lock().await.answer_input(), "  ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_reply_ends_session() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple"]));
        backend
            .questions
            .lock()
            .unwrap()
            .push_back(QuestionReply::Completed);
        backend.push_verdict(Verdict::Correct, None);
        let controller = playing(&backend).await;

        controller.session().lock().await.set_input("사과");
        controller.submit().await;

        let session = controller.session();
        let session = session.lock().await;
        assert_eq!(session.end_reason(), Some(&EndReason::Completed));
        assert_eq!(session.solved_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_failure_ends_without_saving() {
        let backend = Arc::new(FakeBackend {
            start_error: Some(StatusCode::INTERNAL_SERVER_ERROR),
            ..FakeBackend::default()
        });
        let controller = controller(&backend, 3);

        let summary = controller.run().await;
        assert!(matches!(summary.reason, EndReason::Failed(_)));
        assert_eq!(summary.save_status, None);
        assert_eq!(backend.calls(), vec![Call::Start]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_start() {
        let backend = Arc::new(FakeBackend {
            start_error: Some(StatusCode::UNAUTHORIZED),
            ..FakeBackend::default()
        });
        let summary = controller(&backend, 1).run().await;
        assert_eq!(summary.reason, EndReason::Unauthorized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_during_countdown() {
        let backend = Arc::new(FakeBackend::default());
        let controller = controller(&backend, 3);

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run().await })
        };
        time::sleep(Duration::from_millis(500)).await;
        controller.quit().await;

        let summary = task.await.unwrap();
        assert_eq!(summary.reason, EndReason::Quit);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_while_starting_still_ends_test() {
        let backend = Arc::new(FakeBackend {
            start_delay: Some(Duration::from_secs(1)),
            ..FakeBackend::with_questions(&["apple"])
        });
        let controller = controller(&backend, 1);

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run().await })
        };
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(backend.calls(), vec![Call::Start]);
        controller.quit().await;

        let summary = task.await.unwrap();
        assert_eq!(summary.reason, EndReason::Quit);
        assert_eq!(summary.save_status, Some(SaveStatus::Saved));
        assert_eq!(backend.count(|c| matches!(c, Call::Save(_))), 1);
        assert_eq!(backend.count(|c| *c == Call::Question), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_ends_session() {
        let backend = Arc::new(FakeBackend {
            score_error: true,
            ..FakeBackend::with_questions(&["apple"])
        });
        let summary = controller(&backend, 1).run().await;

        assert!(matches!(summary.reason, EndReason::Failed(_)));
        assert_eq!(backend.count(|c| *c == Call::Score), 1);
        assert_eq!(summary.save_status, Some(SaveStatus::Saved));
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_changes_are_forward_only() {
        let backend = Arc::new(FakeBackend::with_questions(&["apple"]));
        backend.push_score(10.0, 0.0);
        let controller = controller(&backend, 2);

        let mut rx = controller.subscribe();
        let watcher = tokio::spawn(async move {
            let mut seen = vec![rx.borrow().clone()];
            while rx.changed().await.is_ok() {
                let phase = rx.borrow_and_update().clone();
                let ended = phase.is_ended();
                seen.push(phase);
                if ended {
                    break;
                }
            }
            seen
        });

        controller.run().await;
        let seen = watcher.await.unwrap();

        let rank = |phase: &Phase| match phase {
            Phase::Countdown => 0,
            Phase::Playing => 1,
            Phase::Ended(_) => 2,
        };
        assert!(seen.windows(2).all(|w| rank(&w[0]) < rank(&w[1])));
        assert_eq!(seen.first(), Some(&Phase::Countdown));
        assert_eq!(seen.last(), Some(&Phase::Ended(EndReason::TimeExhausted)));
    }
}
