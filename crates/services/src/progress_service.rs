use std::sync::Arc;

use quiz_core::model::{CourseId, LessonId, LessonProgress, ModuleId, UserId};
use storage::repository::{ContentRepository, EnrollmentRepository, ProgressRepository};
use tracing::{info, warn};

use crate::Clock;
use crate::activity_service::ActivityService;
use crate::error::ProgressError;

/// Completed-versus-total lessons for a course or module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub completed: u32,
    pub total: u32,
    pub percent: u32,
}

impl ProgressSummary {
    #[must_use]
    pub fn new(completed: u32, total: u32) -> Self {
        let completed = completed.min(total);
        let percent = if total == 0 {
            0
        } else {
            // Round half up in integer arithmetic.
            (u64::from(completed) * 200 + u64::from(total)) / (u64::from(total) * 2)
        };
        Self {
            completed,
            total,
            percent: u32::try_from(percent).unwrap_or(100),
        }
    }
}

#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
    content: Arc<dyn ContentRepository>,
    activity: Option<Arc<ActivityService>>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
        content: Arc<dyn ContentRepository>,
    ) -> Self {
        Self {
            clock,
            enrollments,
            progress,
            content,
            activity: None,
        }
    }

    /// Count completed lessons toward study streaks and achievements.
    #[must_use]
    pub fn with_activity(mut self, activity: Arc<ActivityService>) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Mark a lesson complete. Completing it again replaces the earlier record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NotEnrolled` if the user has no enrollment in the
    /// course, or `ProgressError::Storage` on persistence failures.
    pub async fn complete_lesson(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        module_id: &ModuleId,
        lesson_id: &LessonId,
        time_spent_minutes: u32,
    ) -> Result<LessonProgress, ProgressError> {
        let enrollment = self
            .enrollments
            .find_enrollment(user_id, course_id)
            .await?
            .ok_or(ProgressError::NotEnrolled)?;

        let progress = LessonProgress {
            user_id: user_id.clone(),
            enrollment_id: enrollment.id,
            course_id: course_id.clone(),
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            completed_at: self.clock.now(),
            time_spent_minutes,
        };
        self.progress.upsert_lesson_progress(&progress).await?;
        info!(%user_id, %lesson_id, "lesson completed");

        // Streaks and achievements never fail the completion itself.
        if let Some(activity) = &self.activity
            && let Err(err) = activity.record_lesson(user_id, time_spent_minutes).await
        {
            warn!(%user_id, error = %err, "could not record study activity");
        }
        Ok(progress)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on backend failures.
    pub async fn course_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<ProgressSummary, ProgressError> {
        self.summary(user_id, course_id, None).await
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on backend failures.
    pub async fn module_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> Result<ProgressSummary, ProgressError> {
        self.summary(user_id, course_id, Some(module_id)).await
    }

    async fn summary(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        module_id: Option<&ModuleId>,
    ) -> Result<ProgressSummary, ProgressError> {
        let done = self
            .progress
            .list_lesson_progress(user_id, course_id, module_id)
            .await?;
        let total = self.content.count_lessons(course_id, module_id).await?;
        let completed = u32::try_from(done.len()).unwrap_or(u32::MAX);
        Ok(ProgressSummary::new(completed, total))
    }
}
