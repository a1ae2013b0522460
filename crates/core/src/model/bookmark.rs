use chrono::{DateTime, Utc};

use crate::model::ids::{CourseId, LessonId, ModuleId, UserId};

/// A saved lesson. Unique per (user, lesson); saving again replaces the notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub module_id: ModuleId,
    pub lesson_id: LessonId,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Blank notes are stored as none.
    #[must_use]
    pub fn new(
        user_id: UserId,
        course_id: CourseId,
        module_id: ModuleId,
        lesson_id: LessonId,
        notes: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            course_id,
            module_id,
            lesson_id,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
            created_at,
        }
    }
}
