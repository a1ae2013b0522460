use std::sync::Arc;

use quiz_core::model::{AttemptDetails, AttemptId, AttemptRecord, CourseId, UserId};
use storage::repository::{AttemptRepository, StorageError};

/// Read-side access to a learner's past quiz attempts.
#[derive(Clone)]
pub struct AttemptHistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptHistoryService {
    pub const DEFAULT_LIMIT: u32 = 20;

    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// Most recent attempts first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if attempts cannot be fetched.
    pub async fn recent_attempts(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        self.attempts.list_attempts(user_id, course_id, limit).await
    }

    /// One attempt with its answers. Other users' attempts are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the attempt does not exist or belongs to
    /// someone else.
    pub async fn attempt_details(
        &self,
        user_id: &UserId,
        attempt_id: AttemptId,
    ) -> Result<AttemptDetails, StorageError> {
        let details = self.attempts.get_attempt(attempt_id).await?;
        if &details.attempt.user_id != user_id {
            return Err(StorageError::NotFound);
        }
        Ok(details)
    }
}
