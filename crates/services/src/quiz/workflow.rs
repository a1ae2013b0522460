use std::sync::Arc;

use quiz_core::model::{AttemptResult, CourseId, ModuleId, PassingThreshold};
use quiz_core::session::{Learner, QuizEvent, QuizIntent, QuizSession};
use storage::repository::QuestionSource;
use tracing::{debug, info};

use crate::Clock;
use crate::error::QuizServiceError;
use crate::quiz::gateway::PersistenceGateway;
use crate::quiz::persist::PersistenceTask;

/// What one handled intent produced.
#[derive(Debug)]
pub struct QuizStep {
    pub event: QuizEvent,
    /// Present only for the step that submitted the quiz.
    pub persistence: Option<PersistenceTask>,
}

/// Orchestrates quiz start, intent handling and background persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    questions: Arc<dyn QuestionSource>,
    gateway: Arc<dyn PersistenceGateway>,
    passing_threshold: Option<PassingThreshold>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            clock,
            questions,
            gateway,
            passing_threshold: None,
        }
    }

    /// Apply one threshold to every quiz instead of each quiz's own.
    #[must_use]
    pub fn with_passing_threshold(mut self, threshold: Option<PassingThreshold>) -> Self {
        self.passing_threshold = threshold;
        self
    }

    /// Load the module's quiz and start a fresh session for `learner`.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the quiz cannot be loaded.
    pub async fn start_quiz(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
        learner: Learner,
    ) -> Result<QuizSession, QuizServiceError> {
        let mut quiz = self.questions.load_quiz(course_id, module_id).await?;
        if let Some(threshold) = self.passing_threshold {
            quiz = quiz.with_passing_threshold(threshold);
        }
        info!(
            quiz_id = %quiz.id(),
            questions = quiz.len(),
            anonymous = learner.user_id().is_none(),
            "quiz started"
        );
        Ok(QuizSession::new(quiz, learner, self.clock.now()))
    }

    /// Apply an intent; a successful submission also starts persisting the attempt.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` when the controller rejects the intent.
    pub fn handle(
        &self,
        session: &mut QuizSession,
        intent: QuizIntent,
    ) -> Result<QuizStep, QuizServiceError> {
        if intent == QuizIntent::Submit {
            let (result, persistence) = self.submit(session)?;
            return Ok(QuizStep {
                event: QuizEvent::Submitted(Box::new(result)),
                persistence: Some(persistence),
            });
        }
        let event = session.dispatch(intent, self.clock.now())?;
        Ok(QuizStep {
            event,
            persistence: None,
        })
    }

    /// Score and freeze the session, then hand the result to the gateway in the
    /// background. The returned result never depends on persistence succeeding.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` if questions are unanswered or the
    /// session was already submitted.
    pub fn submit(
        &self,
        session: &mut QuizSession,
    ) -> Result<(AttemptResult, PersistenceTask), QuizServiceError> {
        let now = self.clock.now();
        session.sync_elapsed(self.clock.elapsed_since(session.started_at()));
        let result = session.submit(now).inspect_err(|err| {
            debug!(error = %err, "submit rejected");
        })?;
        info!(
            quiz_id = %result.quiz_id,
            score = result.score_percent,
            passed = result.passed,
            elapsed = %result.elapsed,
            "quiz submitted"
        );
        let persistence = PersistenceTask::spawn(Arc::clone(&self.gateway), result.clone());
        Ok((result, persistence))
    }
}
