use std::sync::Arc;

use quiz_core::model::{CourseId, Enrollment, UserId};
use storage::repository::{EnrollmentRepository, StorageError};
use tracing::info;

use crate::Clock;
use crate::error::EnrollmentServiceError;

/// Result of an enroll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentOutcome {
    pub enrollment: Enrollment,
    pub already_enrolled: bool,
}

#[derive(Clone)]
pub struct EnrollmentService {
    clock: Clock,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(clock: Clock, enrollments: Arc<dyn EnrollmentRepository>) -> Self {
        Self { clock, enrollments }
    }

    /// Enroll `user_id` in a course. Enrolling twice returns the existing enrollment.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Invalid` when state, exam or course is blank,
    /// or `EnrollmentServiceError::Storage` on persistence failures.
    pub async fn enroll(
        &self,
        user_id: &UserId,
        state_id: &str,
        exam_id: &str,
        course_id: &str,
    ) -> Result<EnrollmentOutcome, EnrollmentServiceError> {
        let enrollment = Enrollment::new(
            user_id.clone(),
            state_id,
            exam_id,
            course_id,
            self.clock.now(),
        )?;

        if let Some(existing) = self
            .enrollments
            .find_enrollment(user_id, &enrollment.course_id)
            .await?
        {
            return Ok(EnrollmentOutcome {
                enrollment: existing,
                already_enrolled: true,
            });
        }

        match self.enrollments.insert_enrollment(&enrollment).await {
            Ok(()) => {
                info!(%user_id, course_id = %enrollment.course_id, "user enrolled");
                Ok(EnrollmentOutcome {
                    enrollment,
                    already_enrolled: false,
                })
            }
            // Lost a race with a concurrent enroll for the same course.
            Err(StorageError::Conflict) => {
                let existing = self
                    .enrollments
                    .find_enrollment(user_id, &enrollment.course_id)
                    .await?
                    .ok_or(StorageError::NotFound)?;
                Ok(EnrollmentOutcome {
                    enrollment: existing,
                    already_enrolled: true,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn enrollment_for(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        self.enrollments.find_enrollment(user_id, course_id).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn enrollments(&self, user_id: &UserId) -> Result<Vec<Enrollment>, StorageError> {
        self.enrollments.list_enrollments(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::EnrollmentError;
    use quiz_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service() -> EnrollmentService {
        EnrollmentService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn enroll_is_idempotent() {
        let svc = service();
        let user = UserId::new("u1");

        let first = svc.enroll(&user, "FL", "ftce", "ftce-elem").await.unwrap();
        assert!(!first.already_enrolled);

        let second = svc.enroll(&user, "FL", "ftce", "ftce-elem").await.unwrap();
        assert!(second.already_enrolled);
        assert_eq!(second.enrollment.id, first.enrollment.id);

        assert_eq!(svc.enrollments(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let svc = service();
        let err = svc
            .enroll(&UserId::new("u1"), "FL", " ", "ftce-elem")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EnrollmentServiceError::Invalid(EnrollmentError::MissingField("examId"))
        ));
    }
}
