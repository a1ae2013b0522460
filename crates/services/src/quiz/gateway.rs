use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{
    AttemptId, AttemptResult, CourseId, ModuleId, QuestionId, QuizId, UserId,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::PersistenceError;
use crate::quiz::submission::SubmissionService;

/// Records a finished attempt somewhere durable.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Store one finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` when the attempt could not be recorded.
    async fn record_attempt(&self, result: &AttemptResult) -> Result<AttemptId, PersistenceError>;
}

//
// ─── WIRE FORMAT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Body of `POST /quiz/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub module_id: ModuleId,
    pub quiz_id: QuizId,
    pub score: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub time_taken_minutes: u32,
    pub passed: bool,
    pub answers: Vec<SubmittedAnswer>,
}

impl SubmitRequest {
    /// Build the request for an authenticated attempt.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Unauthorized` for anonymous attempts.
    pub fn from_result(result: &AttemptResult) -> Result<Self, PersistenceError> {
        let user_id = result
            .user_id
            .clone()
            .ok_or(PersistenceError::Unauthorized)?;
        Ok(Self {
            user_id,
            course_id: result.course_id.clone(),
            module_id: result.module_id.clone(),
            quiz_id: result.quiz_id.clone(),
            score: result.score_percent,
            total_questions: result.total_questions,
            correct_answers: result.correct_answers,
            time_taken_minutes: result.time_taken_minutes(),
            passed: result.passed,
            answers: result
                .outcomes
                .iter()
                .map(|o| SubmittedAnswer {
                    question_id: o.question_id.clone(),
                    user_answer: o
                        .selected
                        .as_ref()
                        .map(|l| l.as_str().to_string())
                        .unwrap_or_default(),
                    correct_answer: o.correct_answer.as_str().to_string(),
                    is_correct: o.is_correct,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub attempt_id: AttemptId,
    pub score: f64,
    pub passed: bool,
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

/// Posts attempts to a remote submission endpoint.
#[derive(Clone)]
pub struct HttpPersistenceGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpPersistenceGateway {
    /// Build a gateway with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self, PersistenceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl PersistenceGateway for HttpPersistenceGateway {
    async fn record_attempt(&self, result: &AttemptResult) -> Result<AttemptId, PersistenceError> {
        let payload = SubmitRequest::from_result(result)?;
        let url = self.config.submit_url();
        debug!(%url, quiz_id = %payload.quiz_id, "posting quiz attempt");

        let mut request = self.client.post(url).json(&payload);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(PersistenceError::HttpStatus(response.status()));
        }

        let body: SubmitResponse = response.json().await?;
        if !body.success {
            return Err(PersistenceError::Rejected(
                "server reported success=false".into(),
            ));
        }
        Ok(body.attempt_id)
    }
}

//
// ─── LOCAL ─────────────────────────────────────────────────────────────────────
//

/// Records attempts straight into local storage through `SubmissionService`.
///
/// The attempt's own user id is treated as the authenticated user.
#[derive(Clone)]
pub struct LocalGateway {
    submissions: Arc<SubmissionService>,
}

impl LocalGateway {
    #[must_use]
    pub fn new(submissions: Arc<SubmissionService>) -> Self {
        Self { submissions }
    }
}

#[async_trait]
impl PersistenceGateway for LocalGateway {
    async fn record_attempt(&self, result: &AttemptResult) -> Result<AttemptId, PersistenceError> {
        let request = SubmitRequest::from_result(result)?;
        let authenticated = request.user_id.clone();
        let response = self.submissions.submit(Some(&authenticated), request).await?;
        Ok(response.attempt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::ElapsedTime;
    use quiz_core::model::{OptionLetter, QuestionOutcome};
    use quiz_core::time::fixed_now;

    fn result(user: Option<&str>) -> AttemptResult {
        AttemptResult {
            user_id: user.map(UserId::new),
            course_id: CourseId::new("ftce"),
            module_id: ModuleId::new("module-1"),
            quiz_id: QuizId::new("module-1-quiz"),
            total_questions: 2,
            correct_answers: 1,
            score_percent: 50.0,
            elapsed: ElapsedTime::from_secs(90),
            passed: false,
            outcomes: vec![
                QuestionOutcome {
                    question_id: QuestionId::new("q1"),
                    selected: Some(OptionLetter::new("B")),
                    correct_answer: OptionLetter::new("B"),
                    is_correct: true,
                },
                QuestionOutcome {
                    question_id: QuestionId::new("q2"),
                    selected: Some(OptionLetter::new("C")),
                    correct_answer: OptionLetter::new("A"),
                    is_correct: false,
                },
            ],
            submitted_at: fixed_now(),
        }
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = SubmitRequest::from_result(&result(Some("user-1"))).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["quizId"], "module-1-quiz");
        assert_eq!(json["score"], 50.0);
        assert_eq!(json["timeTakenMinutes"], 2);
        assert_eq!(json["answers"][1]["userAnswer"], "C");
        assert_eq!(json["answers"][1]["correctAnswer"], "A");
        assert_eq!(json["answers"][1]["isCorrect"], false);
    }

    #[test]
    fn anonymous_result_cannot_be_submitted() {
        assert!(matches!(
            SubmitRequest::from_result(&result(None)),
            Err(PersistenceError::Unauthorized)
        ));
    }

    #[test]
    fn response_parses_attempt_id() {
        let id = AttemptId::generate();
        let body = format!(
            r#"{{"success":true,"attemptId":"{}","score":50.0,"passed":false}}"#,
            id.value()
        );
        let parsed: SubmitResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.attempt_id, id);
        assert!(parsed.success);
    }

    #[test]
    fn submit_url_trims_trailing_slash() {
        let gateway =
            HttpPersistenceGateway::new(GatewayConfig::new("http://localhost:8080/api/")).unwrap();
        assert_eq!(
            gateway.config().submit_url(),
            "http://localhost:8080/api/quiz/submit"
        );
    }
}
