//! The slice of the backend a quiz session drives.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::protocol::{
    CheckAnswerResponse, Question, QuestionReply, QuizSource, SaveResultRequest, ScoreResponse,
};

/// Quiz session endpoints. The backend owns questions, correctness, timing
/// and scoring; the client only mirrors what these calls report.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// `POST /quiz/start`
    async fn start_test(&self, source: &QuizSource) -> Result<(), ApiError>;

    /// `GET /quiz/question`
    async fn fetch_question(&self) -> Result<QuestionReply, ApiError>;

    /// `POST /quiz/check`
    async fn check_answer(
        &self,
        question: &Question,
        answer: &str,
    ) -> Result<CheckAnswerResponse, ApiError>;

    /// `GET /quiz/score`
    async fn fetch_score(&self) -> Result<ScoreResponse, ApiError>;

    /// `POST /quiz/end`
    async fn save_result(&self, result: &SaveResultRequest) -> Result<(), ApiError>;
}
