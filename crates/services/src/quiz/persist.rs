use std::sync::Arc;

use quiz_core::model::{AttemptId, AttemptResult};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::quiz::gateway::PersistenceGateway;

/// How recording a finished attempt turned out.
#[derive(Debug)]
pub enum PersistenceOutcome {
    Saved(AttemptId),
    /// Anonymous attempts are never sent.
    Skipped,
    Failed(PersistenceError),
}

impl PersistenceOutcome {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    /// One-line notice for the learner; `None` when there is nothing to say.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::Saved(_) => None,
            Self::Skipped => Some("Sign in to save your quiz results.".into()),
            Self::Failed(err) => Some(format!(
                "Your results could not be saved ({err}). Your score above is still valid."
            )),
        }
    }
}

/// A fire-and-forget attempt upload whose outcome can still be awaited.
#[derive(Debug)]
pub struct PersistenceTask {
    handle: Option<JoinHandle<PersistenceOutcome>>,
}

impl PersistenceTask {
    /// Spawn the upload of `result`, or skip it for anonymous attempts.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(gateway: Arc<dyn PersistenceGateway>, result: AttemptResult) -> Self {
        if result.is_anonymous() {
            debug!(quiz_id = %result.quiz_id, "anonymous attempt; not persisting");
            return Self::skipped();
        }

        let handle = tokio::spawn(async move {
            match gateway.record_attempt(&result).await {
                Ok(attempt_id) => {
                    info!(%attempt_id, quiz_id = %result.quiz_id, "attempt persisted");
                    PersistenceOutcome::Saved(attempt_id)
                }
                Err(err) => {
                    warn!(error = %err, quiz_id = %result.quiz_id, "attempt not persisted");
                    PersistenceOutcome::Failed(err)
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn skipped() -> Self {
        Self { handle: None }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel the upload if it is still running.
    pub fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Wait for the upload to finish.
    pub async fn outcome(mut self) -> PersistenceOutcome {
        self.finished().await
    }

    /// Wait for the upload without giving up the task.
    ///
    /// Cancel-safe: dropping the future leaves the upload running, so this can
    /// sit in a `tokio::select!` loop. Once it has resolved, the task reports
    /// itself finished and later calls return `Skipped`.
    pub async fn finished(&mut self) -> PersistenceOutcome {
        let Some(handle) = self.handle.as_mut() else {
            return PersistenceOutcome::Skipped;
        };
        let joined = handle.await;
        self.handle = None;
        match joined {
            Ok(outcome) => outcome,
            Err(join) => {
                warn!(error = %join, "persistence task interrupted");
                PersistenceOutcome::Failed(PersistenceError::Interrupted(join.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::ElapsedTime;
    use quiz_core::model::{CourseId, ModuleId, QuizId, UserId};
    use quiz_core::time::fixed_now;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingGateway {
        calls: AtomicUsize,
        fail: bool,
        stall: bool,
    }

    #[async_trait]
    impl PersistenceGateway for CountingGateway {
        async fn record_attempt(
            &self,
            _result: &AttemptResult,
        ) -> Result<AttemptId, PersistenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.fail {
                Err(PersistenceError::NotEnrolled)
            } else {
                Ok(AttemptId::generate())
            }
        }
    }

    fn result(user: Option<&str>) -> AttemptResult {
        AttemptResult {
            user_id: user.map(UserId::new),
            course_id: CourseId::new("c"),
            module_id: ModuleId::new("m"),
            quiz_id: QuizId::new("m-quiz"),
            total_questions: 0,
            correct_answers: 0,
            score_percent: 0.0,
            elapsed: ElapsedTime::ZERO,
            passed: false,
            outcomes: Vec::new(),
            submitted_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn anonymous_attempts_skip_the_gateway() {
        let gateway = Arc::new(CountingGateway::default());
        let task = PersistenceTask::spawn(gateway.clone(), result(None));
        assert!(task.is_finished());
        assert!(matches!(task.outcome().await, PersistenceOutcome::Skipped));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn saved_and_failed_outcomes_are_reported() {
        let ok = Arc::new(CountingGateway::default());
        let saved = PersistenceTask::spawn(ok.clone(), result(Some("u1"))).outcome().await;
        assert!(saved.is_saved());
        assert!(saved.notice().is_none());
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);

        let failing = Arc::new(CountingGateway {
            fail: true,
            ..CountingGateway::default()
        });
        let failed = PersistenceTask::spawn(failing, result(Some("u1"))).outcome().await;
        assert!(matches!(
            failed,
            PersistenceOutcome::Failed(PersistenceError::NotEnrolled)
        ));
        assert!(failed.notice().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_can_be_cancelled_without_losing_the_upload() {
        let slow = Arc::new(CountingGateway {
            stall: true,
            ..CountingGateway::default()
        });
        let mut task = PersistenceTask::spawn(slow.clone(), result(Some("u1")));

        let early = tokio::time::timeout(Duration::from_secs(5), task.finished()).await;
        assert!(early.is_err());
        assert!(!task.is_finished());

        let outcome = task.finished().await;
        assert!(outcome.is_saved());
        assert!(task.is_finished());
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn aborted_task_reports_interruption() {
        let stalled = Arc::new(CountingGateway {
            stall: true,
            ..CountingGateway::default()
        });
        let task = PersistenceTask::spawn(stalled, result(Some("u1")));
        task.abort();
        assert!(matches!(
            task.outcome().await,
            PersistenceOutcome::Failed(PersistenceError::Interrupted(_))
        ));
    }
}
