use std::sync::Arc;

use quiz_core::model::{
    AttemptDetails, AttemptId, AttemptRecord, OptionLetter, QuestionOutcome, UserId,
};
use storage::repository::{AttemptRepository, EnrollmentRepository};
use tracing::{info, warn};

use crate::Clock;
use crate::activity_service::ActivityService;
use crate::error::SubmissionError;
use crate::quiz::gateway::{SubmitRequest, SubmitResponse};

/// Accepts attempt submissions on behalf of an authenticated user.
#[derive(Clone)]
pub struct SubmissionService {
    clock: Clock,
    enrollments: Arc<dyn EnrollmentRepository>,
    attempts: Arc<dyn AttemptRepository>,
    activity: Option<Arc<ActivityService>>,
}

impl SubmissionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        enrollments: Arc<dyn EnrollmentRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            enrollments,
            attempts,
            activity: None,
        }
    }

    /// Count recorded attempts toward study streaks and achievements.
    #[must_use]
    pub fn with_activity(mut self, activity: Arc<ActivityService>) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Validate and store a submitted attempt together with its answers.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::Unauthorized` if there is no authenticated user or it
    /// differs from the request's user, `SubmissionError::NotEnrolled` if the user is
    /// not enrolled in the course, `SubmissionError::InvalidRequest` for inconsistent
    /// counts or scores, and `SubmissionError::Storage` on persistence failures.
    pub async fn submit(
        &self,
        authenticated: Option<&UserId>,
        request: SubmitRequest,
    ) -> Result<SubmitResponse, SubmissionError> {
        let Some(user_id) = authenticated else {
            warn!("submission without authenticated user");
            return Err(SubmissionError::Unauthorized);
        };
        if *user_id != request.user_id {
            warn!(%user_id, requested = %request.user_id, "submission for another user");
            return Err(SubmissionError::Unauthorized);
        }

        validate(&request)?;

        let enrollment = self
            .enrollments
            .find_enrollment(user_id, &request.course_id)
            .await?
            .ok_or(SubmissionError::NotEnrolled)?;

        let details = AttemptDetails {
            attempt: AttemptRecord {
                id: AttemptId::generate(),
                enrollment_id: enrollment.id,
                user_id: request.user_id,
                course_id: request.course_id,
                module_id: request.module_id,
                quiz_id: request.quiz_id,
                score_percent: request.score,
                total_questions: request.total_questions,
                correct_answers: request.correct_answers,
                time_taken_minutes: request.time_taken_minutes,
                passed: request.passed,
                attempted_at: self.clock.now(),
            },
            answers: request
                .answers
                .into_iter()
                .map(|a| QuestionOutcome {
                    question_id: a.question_id,
                    selected: (!a.user_answer.is_empty()).then(|| OptionLetter::new(a.user_answer)),
                    correct_answer: OptionLetter::new(a.correct_answer),
                    is_correct: a.is_correct,
                })
                .collect(),
        };

        let attempt_id = self.attempts.append_attempt(&details).await?;
        info!(
            %attempt_id,
            user_id = %details.attempt.user_id,
            quiz_id = %details.attempt.quiz_id,
            score = details.attempt.score_percent,
            passed = details.attempt.passed,
            "quiz attempt recorded"
        );

        if let Some(activity) = &self.activity
            && let Err(err) = activity
                .record_quiz(
                    user_id,
                    details.attempt.time_taken_minutes,
                    details.attempt.passed,
                    details.attempt.score_percent,
                )
                .await
        {
            warn!(%user_id, error = %err, "could not record study activity");
        }

        Ok(SubmitResponse {
            success: true,
            attempt_id,
            score: details.attempt.score_percent,
            passed: details.attempt.passed,
        })
    }
}

fn validate(request: &SubmitRequest) -> Result<(), SubmissionError> {
    if !(0.0..=100.0).contains(&request.score) {
        return Err(SubmissionError::InvalidRequest(format!(
            "score out of range: {}",
            request.score
        )));
    }
    if request.correct_answers > request.total_questions {
        return Err(SubmissionError::InvalidRequest(format!(
            "{} correct answers exceed {} questions",
            request.correct_answers, request.total_questions
        )));
    }
    let answered = u32::try_from(request.answers.len()).unwrap_or(u32::MAX);
    if answered != request.total_questions {
        return Err(SubmissionError::InvalidRequest(format!(
            "{answered} answers for {} questions",
            request.total_questions
        )));
    }
    Ok(())
}
