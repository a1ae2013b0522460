use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, EnrollmentId, ExamId, LessonId, ModuleId, StateId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// A user's enrollment in a course for a given state and exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub state_id: StateId,
    pub exam_id: ExamId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Build a new enrollment from raw request fields.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::MissingField` when state, exam or course is blank.
    pub fn new(
        user_id: UserId,
        state_id: &str,
        exam_id: &str,
        course_id: &str,
        enrolled_at: DateTime<Utc>,
    ) -> Result<Self, EnrollmentError> {
        let state_id = state_id
            .parse::<StateId>()
            .map_err(|_| EnrollmentError::MissingField("stateId"))?;
        let exam_id = exam_id
            .parse::<ExamId>()
            .map_err(|_| EnrollmentError::MissingField("examId"))?;
        let course_id = course_id
            .parse::<CourseId>()
            .map_err(|_| EnrollmentError::MissingField("courseId"))?;

        Ok(Self {
            id: EnrollmentId::generate(),
            user_id,
            state_id,
            exam_id,
            course_id,
            enrolled_at,
        })
    }
}

/// Completion record for one lesson. Unique per (user, course, lesson).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProgress {
    pub user_id: UserId,
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    pub module_id: ModuleId,
    pub lesson_id: LessonId,
    pub completed_at: DateTime<Utc>,
    pub time_spent_minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn enrollment_requires_all_fields() {
        let err = Enrollment::new(UserId::new("u1"), "FL", "", "ftce", fixed_now()).unwrap_err();
        assert_eq!(err, EnrollmentError::MissingField("examId"));
    }

    #[test]
    fn enrollment_builds_from_fields() {
        let e = Enrollment::new(UserId::new("u1"), "FL", "ftce-pk3", "ftce-pk3-course", fixed_now())
            .unwrap();
        assert_eq!(e.course_id.as_str(), "ftce-pk3-course");
        assert_eq!(e.enrolled_at, fixed_now());
    }
}
