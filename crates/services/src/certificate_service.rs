use std::sync::Arc;

use quiz_core::model::{
    AchievementKind, Certificate, CourseCompletion, CourseId, ModuleId, UserId,
};
use storage::repository::{
    AttemptRepository, CertificateRepository, ContentRepository, EnrollmentRepository,
    ProgressRepository, StorageError,
};
use tracing::{info, warn};

use crate::Clock;
use crate::activity_service::ActivityService;
use crate::error::CertificateServiceError;

/// Issues certificates of completion once a course is finished.
#[derive(Clone)]
pub struct CertificateService {
    clock: Clock,
    enrollments: Arc<dyn EnrollmentRepository>,
    content: Arc<dyn ContentRepository>,
    progress: Arc<dyn ProgressRepository>,
    attempts: Arc<dyn AttemptRepository>,
    certificates: Arc<dyn CertificateRepository>,
    activity: Option<Arc<ActivityService>>,
}

impl CertificateService {
    #[must_use]
    pub fn new(
        clock: Clock,
        enrollments: Arc<dyn EnrollmentRepository>,
        content: Arc<dyn ContentRepository>,
        progress: Arc<dyn ProgressRepository>,
        attempts: Arc<dyn AttemptRepository>,
        certificates: Arc<dyn CertificateRepository>,
    ) -> Self {
        Self {
            clock,
            enrollments,
            content,
            progress,
            attempts,
            certificates,
            activity: None,
        }
    }

    /// Grant `CourseComplete` whenever a certificate is issued.
    #[must_use]
    pub fn with_activity(mut self, activity: Arc<ActivityService>) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Lessons and quizzes the user still has to finish in a course.
    ///
    /// # Errors
    ///
    /// Returns `CertificateServiceError::Storage` on backend failures.
    pub async fn completion(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<CourseCompletion, CertificateServiceError> {
        let total = self.content.count_lessons(course_id, None).await?;
        let done = self
            .progress
            .list_lesson_progress(user_id, course_id, None)
            .await?;
        let quiz_modules = self.content.list_quiz_modules(course_id).await?;
        let passed: Vec<ModuleId> = self
            .attempts
            .list_attempts(user_id, course_id, u32::MAX)
            .await?
            .into_iter()
            .filter(|a| a.passed)
            .map(|a| a.module_id)
            .collect();

        Ok(CourseCompletion::evaluate(
            total,
            u32::try_from(done.len()).unwrap_or(u32::MAX),
            &quiz_modules,
            &passed,
        ))
    }

    /// Issue the user's certificate for a course, or return the one already issued.
    ///
    /// # Errors
    ///
    /// Returns `CertificateServiceError::NotEnrolled` without an enrollment,
    /// `CertificateServiceError::NotEligible` while lessons or quizzes remain,
    /// `CertificateServiceError::Invalid` for a blank course name, and
    /// `CertificateServiceError::Storage` on persistence failures.
    pub async fn issue(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        course_name: &str,
    ) -> Result<Certificate, CertificateServiceError> {
        let enrollment = self
            .enrollments
            .find_enrollment(user_id, course_id)
            .await?
            .ok_or(CertificateServiceError::NotEnrolled)?;

        if let Some(existing) = self.certificates.find_certificate(user_id, course_id).await? {
            return Ok(existing);
        }

        let completion = self.completion(user_id, course_id).await?;
        if !completion.is_complete() {
            return Err(CertificateServiceError::NotEligible {
                lessons_remaining: completion.lessons_remaining(),
                quizzes_remaining: completion.quizzes_remaining.len(),
            });
        }

        let certificate = Certificate::issue(&enrollment, course_name, self.clock.now())?;
        match self.certificates.insert_certificate(&certificate).await {
            Ok(()) => {}
            // Issued concurrently; hand back the stored one.
            Err(StorageError::Conflict) => {
                if let Some(existing) =
                    self.certificates.find_certificate(user_id, course_id).await?
                {
                    return Ok(existing);
                }
                return Err(StorageError::Conflict.into());
            }
            Err(err) => return Err(err.into()),
        }
        info!(%user_id, %course_id, number = %certificate.number, "certificate issued");

        if let Some(activity) = &self.activity
            && let Err(err) = activity.grant(user_id, AchievementKind::CourseComplete).await
        {
            warn!(%user_id, error = %err, "could not record course completion achievement");
        }
        Ok(certificate)
    }

    /// # Errors
    ///
    /// Returns `CertificateServiceError::Storage` on backend failures.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<Certificate>, CertificateServiceError> {
        Ok(self.certificates.list_certificates(user_id).await?)
    }
}
