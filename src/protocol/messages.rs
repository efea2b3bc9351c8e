//! Request and response bodies for the quiz backend.
//!
//! All messages are JSON over HTTP.

use serde::{Deserialize, Serialize};

/// Word set id the backend uses for a test built from the wrong answer note.
pub const WRONG_ANSWERS_SET: &str = "wrong_answers";

/// What a quiz session is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizSource {
    /// A word set stored on the backend.
    WordSet(i64),
    /// The user's own wrong answers, sent along with the request.
    WrongAnswers(Vec<WordPair>),
}

/// `word_set_id` is numeric for stored sets and a name for the review set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WordSetRef {
    Id(i64),
    Named(&'static str),
}

/// Body of `POST /quiz/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartTestRequest {
    pub word_set_id: WordSetRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordPair>>,
}

impl From<&QuizSource> for StartTestRequest {
    fn from(source: &QuizSource) -> Self {
        match source {
            QuizSource::WordSet(id) => Self {
                word_set_id: WordSetRef::Id(*id),
                words: None,
            },
            QuizSource::WrongAnswers(words) => Self {
                word_set_id: WordSetRef::Named(WRONG_ANSWERS_SET),
                words: Some(words.clone()),
            },
        }
    }
}

/// An English term and its Korean meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    pub english: String,
    pub korean: String,
}

/// A question as served by `GET /quiz/question`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub english: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub korean: Option<String>,
}

impl Question {
    pub fn new(english: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            korean: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawQuestionReply {
    english: Option<String>,
    korean: Option<String>,
    #[serde(default)]
    test_completed: bool,
}

/// Reply of `GET /quiz/question`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawQuestionReply")]
pub enum QuestionReply {
    Question(Question),
    /// The backend has no more questions for this test.
    Completed,
    /// Empty body: the next question is not ready yet.
    NotReady,
}

impl From<RawQuestionReply> for QuestionReply {
    fn from(raw: RawQuestionReply) -> Self {
        if raw.test_completed {
            return QuestionReply::Completed;
        }
        match raw.english {
            Some(english) if !english.is_empty() => QuestionReply::Question(Question {
                english,
                korean: raw.korean,
            }),
            _ => QuestionReply::NotReady,
        }
    }
}

/// Body of `POST /quiz/check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckAnswerRequest {
    pub question: Question,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Wrong,
    TimeOver,
}

/// Reply of `POST /quiz/check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAnswerResponse {
    pub result: Verdict,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply of `GET /quiz/score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub score: f64,
    pub remaining_time: f64,
}

/// A missed question kept for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswer {
    pub question: String,
    #[serde(default)]
    pub user_answer: String,
    pub correct_answer: String,
}

impl WrongAnswer {
    pub fn to_word_pair(&self) -> WordPair {
        WordPair {
            english: self.question.clone(),
            korean: self.correct_answer.clone(),
        }
    }
}

/// Body of `POST /quiz/end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResultRequest {
    pub score: f64,
    pub wrong_answers: Vec<WrongAnswer>,
}

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

/// Reply of `GET /auth/check`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub exp: Option<u32>,
    #[serde(default)]
    pub current_score: Option<f64>,
    #[serde(default)]
    pub completed_tests: Option<u32>,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub id: Option<i64>,
    pub english: String,
    pub korean: String,
    #[serde(default)]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WordSet {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Reply of `GET /user/level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    #[serde(default)]
    pub exp: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub username: String,
    pub score: f64,
}

/// Reply of `GET /rankings`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rankings {
    #[serde(default)]
    pub rankings: Vec<RankingEntry>,
    #[serde(rename = "currentUser", default)]
    pub current_user: Option<RankingEntry>,
    #[serde(rename = "isQualified", default)]
    pub is_qualified: bool,
}

/// One finished test from `GET /test_history`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestRecord {
    pub id: i64,
    pub score: f64,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub wrong_answers: Vec<WrongAnswer>,
}

/// Username validation constants.
pub const USERNAME_MIN_LENGTH: usize = 2;
pub const PASSWORD_MIN_LENGTH: usize = 4;

/// Validates a username: at least two characters of Hangul syllables,
/// ASCII letters or digits.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.chars().count() < USERNAME_MIN_LENGTH {
        return Err("Username must be at least 2 characters");
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c);
    if !username.chars().all(allowed) {
        return Err("Username may only contain Hangul, English letters and digits");
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err("Password must be at least 4 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ab").is_ok());
        assert!(validate_username("민수").is_ok());
        assert!(validate_username("kim99").is_ok());
        assert!(validate_username("a").is_err());
        assert!(validate_username("kim lee").is_err());
        assert!(validate_username("ㅋㅋ").is_err()); // jamo, not syllables
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("abcd").is_ok());
        assert!(validate_password("abc").is_err());
    }

    #[test]
    fn test_question_reply_shapes() {
        let reply: QuestionReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply, QuestionReply::NotReady);

        let reply: QuestionReply = serde_json::from_str(r#"{"test_completed": true}"#).unwrap();
        assert_eq!(reply, QuestionReply::Completed);

        let reply: QuestionReply =
            serde_json::from_str(r#"{"english": "apple", "korean": "사과"}"#).unwrap();
        assert_eq!(
            reply,
            QuestionReply::Question(Question {
                english: "apple".to_string(),
                korean: Some("사과".to_string()),
            })
        );
    }

    #[test]
    fn test_start_request_serialization() {
        let json = serde_json::to_value(StartTestRequest::from(&QuizSource::WordSet(7))).unwrap();
        assert_eq!(json, serde_json::json!({ "word_set_id": 7 }));

        let source = QuizSource::WrongAnswers(vec![WordPair {
            english: "apple".to_string(),
            korean: "사과".to_string(),
        }]);
        let json = serde_json::to_value(StartTestRequest::from(&source)).unwrap();
        assert_eq!(json["word_set_id"], "wrong_answers");
        assert_eq!(json["words"][0]["korean"], "사과");
    }

    #[test]
    fn test_check_answer_response() {
        let reply: CheckAnswerResponse =
            serde_json::from_str(r#"{"result": "time_over"}"#).unwrap();
        assert_eq!(reply.result, Verdict::TimeOver);

        let reply: CheckAnswerResponse =
            serde_json::from_str(r#"{"result": "wrong", "correct_answer": "사과"}"#).unwrap();
        assert_eq!(reply.result, Verdict::Wrong);
        assert_eq!(reply.correct_answer.as_deref(), Some("사과"));
    }

    #[test]
    fn test_wrong_answer_field_names() {
        let entry = WrongAnswer {
            question: "apple".to_string(),
            user_answer: "배".to_string(),
            correct_answer: "사과".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"userAnswer\":\"배\""));
        assert!(json.contains("\"correctAnswer\":\"사과\""));
    }
}
