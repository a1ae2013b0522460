use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::enrollment::Enrollment;
use crate::model::ids::{CertificateId, CourseId, EnrollmentId, ModuleId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CertificateError {
    #[error("course name must not be empty")]
    MissingCourseName,
}

/// Printed certificate number, `TCP-{yyyymmdd}-{8 hex digits}`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateNumber(String);

impl CertificateNumber {
    /// Derive the number from the certificate id and its issue date.
    #[must_use]
    pub fn issue(id: CertificateId, issued_at: DateTime<Utc>) -> Self {
        let suffix: String = id
            .value()
            .simple()
            .to_string()
            .chars()
            .take(8)
            .collect::<String>()
            .to_ascii_uppercase();
        Self(format!("TCP-{}-{suffix}", issued_at.format("%Y%m%d")))
    }

    /// Wrap a number read back from storage.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CertificateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateNumber({:?})", self.0)
    }
}

impl fmt::Display for CertificateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Certificate of completion for one course. At most one per (user, course).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub id: CertificateId,
    pub number: CertificateNumber,
    pub user_id: UserId,
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    pub course_name: String,
    pub issued_at: DateTime<Utc>,
}

impl Certificate {
    /// Issue a certificate against an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::MissingCourseName` when `course_name` is blank.
    pub fn issue(
        enrollment: &Enrollment,
        course_name: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, CertificateError> {
        let course_name = course_name.trim();
        if course_name.is_empty() {
            return Err(CertificateError::MissingCourseName);
        }
        let id = CertificateId::generate();
        Ok(Self {
            id,
            number: CertificateNumber::issue(id, issued_at),
            user_id: enrollment.user_id.clone(),
            enrollment_id: enrollment.id,
            course_id: enrollment.course_id.clone(),
            course_name: course_name.to_owned(),
            issued_at,
        })
    }
}

/// How far a learner is from finishing a course.
///
/// A course is finished when every lesson is complete and every module quiz
/// with questions has a passed attempt. A course without lessons never is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseCompletion {
    pub lessons_total: u32,
    pub lessons_completed: u32,
    pub quizzes_remaining: Vec<ModuleId>,
}

impl CourseCompletion {
    #[must_use]
    pub fn evaluate(
        lessons_total: u32,
        lessons_completed: u32,
        quiz_modules: &[ModuleId],
        passed_modules: &[ModuleId],
    ) -> Self {
        Self {
            lessons_total,
            lessons_completed: lessons_completed.min(lessons_total),
            quizzes_remaining: quiz_modules
                .iter()
                .filter(|m| !passed_modules.contains(m))
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn lessons_remaining(&self) -> u32 {
        self.lessons_total - self.lessons_completed
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.lessons_total > 0 && self.lessons_remaining() == 0 && self.quizzes_remaining.is_empty()
    }
}
