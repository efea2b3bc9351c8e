//! reqwest-based client for the quiz backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::AuthSession;
use crate::config::Config;
use crate::error::ApiError;
use crate::protocol::{
    AccountInfo, CheckAnswerRequest, CheckAnswerResponse, Credentials, LevelInfo, LoginResponse,
    Question, QuestionReply, QuizSource, Rankings, SaveResultRequest, ScoreResponse,
    StartTestRequest, TestRecord, WordSet, WrongAnswer,
};

use super::backend::QuizBackend;

/// HTTP client for every backend endpoint the CLI uses.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Option<AuthSession>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        auth: Option<AuthSession>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn from_config(config: &Config, auth: Option<AuthSession>) -> Result<Self, ApiError> {
        Self::new(&config.api_url, auth, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.post_json("/auth/login", credentials).await
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.post("/auth/register", credentials).await
    }

    /// Validate the token and fetch the account behind it.
    pub async fn check_auth(&self) -> Result<AccountInfo, ApiError> {
        self.get_json("/auth/check").await
    }

    pub async fn word_sets(&self) -> Result<Vec<WordSet>, ApiError> {
        self.get_json("/admin/word_sets").await
    }

    pub async fn word_set(&self, id: i64) -> Result<WordSet, ApiError> {
        self.get_json(&format!("/word_set/{id}")).await
    }

    pub async fn wrong_answers(&self) -> Result<Vec<WrongAnswer>, ApiError> {
        self.get_json("/quiz/wrong_answers").await
    }

    pub async fn level(&self) -> Result<LevelInfo, ApiError> {
        self.get_json("/user/level").await
    }

    pub async fn rankings(&self) -> Result<Rankings, ApiError> {
        self.get_json("/rankings").await
    }

    pub async fn test_history(&self) -> Result<Vec<TestRecord>, ApiError> {
        self.get_json("/test_history").await
    }

    pub async fn delete_test_record(&self, id: i64) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/delete_test_record/{id}"));
        self.execute(builder).await.map(|_| ())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.auth {
            Some(auth) => builder.header(AUTHORIZATION, auth.authorization()),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "api request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!(%method, %path, %status, "api response");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::UNPROCESSABLE_ENTITY {
            warn!(%method, %path, %status, "token rejected");
            return Err(ApiError::Unauthorized(status));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%method, %path, %status, "api error");
            return Err(ApiError::Status {
                status,
                message: error_message(status, &body),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::POST, path).json(body))
            .await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, path).json(body))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl QuizBackend for ApiClient {
    async fn start_test(&self, source: &QuizSource) -> Result<(), ApiError> {
        self.post("/quiz/start", &StartTestRequest::from(source)).await
    }

    async fn fetch_question(&self) -> Result<QuestionReply, ApiError> {
        self.get_json("/quiz/question").await
    }

    async fn check_answer(
        &self,
        question: &Question,
        answer: &str,
    ) -> Result<CheckAnswerResponse, ApiError> {
        let body = CheckAnswerRequest {
            question: question.clone(),
            answer: answer.to_string(),
        };
        self.post_json("/quiz/check", &body).await
    }

    async fn fetch_score(&self) -> Result<ScoreResponse, ApiError> {
        self.get_json("/quiz/score").await
    }

    async fn save_result(&self, result: &SaveResultRequest) -> Result<(), ApiError> {
        self.post("/quiz/end", result).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Prefer the backend's `message` field, then the raw body, then the
/// status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    fn client(base_url: String) -> ApiClient {
        let auth = AuthSession::new("tok-1").unwrap();
        ApiClient::new(base_url, Some(auth), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_empty_question_is_not_ready() {
        let (url, server) = serve_once("200 OK", "{}").await;
        let reply = client(url).fetch_question().await.unwrap();
        assert_eq!(reply, QuestionReply::NotReady);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /quiz/question"));
        assert!(request.to_lowercase().contains("authorization: bearer tok-1"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let (url, _server) = serve_once("401 Unauthorized", r#"{"message": "expired"}"#).await;
        let err = client(url).fetch_score().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_unprocessable_is_unauthorized() {
        let (url, _server) = serve_once("422 Unprocessable Entity", "{}").await;
        let err = client(url).level().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(StatusCode::UNPROCESSABLE_ENTITY)));
    }

    #[tokio::test]
    async fn test_error_message_from_body() {
        let (url, _server) =
            serve_once("500 Internal Server Error", r#"{"message": "test not started"}"#).await;
        let err = client(url).fetch_question().await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "test not started");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_result_body() {
        let (url, server) = serve_once("200 OK", "{}").await;
        let result = SaveResultRequest {
            score: 50.0,
            wrong_answers: vec![WrongAnswer {
                question: "apple".to_string(),
                user_answer: "배".to_string(),
                correct_answer: "사과".to_string(),
            }],
        };
        client(url).save_result(&result).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /quiz/end"));
        assert!(request.contains("\"score\":50.0"));
        assert!(request.contains("\"correctAnswer\":\"사과\""));
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        assert_eq!(error_message(StatusCode::BAD_REQUEST, "nope"), "nope");
    }
}
