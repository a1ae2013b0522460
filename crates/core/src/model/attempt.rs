use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, CourseId, EnrollmentId, ModuleId, QuestionId, QuizId, UserId};
use crate::model::question::OptionLetter;
use crate::time::ElapsedTime;

/// Outcome of a single question within a submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    /// `None` only when scoring a partial record outside a session.
    pub selected: Option<OptionLetter>,
    pub correct_answer: OptionLetter,
    pub is_correct: bool,
}

/// Locally computed result of a submitted quiz attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptResult {
    pub user_id: Option<UserId>,
    pub course_id: CourseId,
    pub module_id: ModuleId,
    pub quiz_id: QuizId,
    pub total_questions: u32,
    pub correct_answers: u32,
    /// Full precision; round only for display.
    pub score_percent: f64,
    pub elapsed: ElapsedTime,
    pub passed: bool,
    pub outcomes: Vec<QuestionOutcome>,
    pub submitted_at: DateTime<Utc>,
}

impl AttemptResult {
    #[must_use]
    pub fn time_taken_minutes(&self) -> u32 {
        self.elapsed.rounded_minutes()
    }

    /// Score rounded to a whole percent for display.
    #[must_use]
    pub fn display_percent(&self) -> u32 {
        display_percent(self.score_percent)
    }

    /// Attempts without a user are scored locally and never persisted.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

/// A stored attempt as read back from persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub id: AttemptId,
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub module_id: ModuleId,
    pub quiz_id: QuizId,
    pub score_percent: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub time_taken_minutes: u32,
    pub passed: bool,
    pub attempted_at: DateTime<Utc>,
}

/// A stored attempt together with its per-question answers.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptDetails {
    pub attempt: AttemptRecord,
    pub answers: Vec<QuestionOutcome>,
}

/// Round a percentage half away from zero, clamped to `0..=100`.
#[must_use]
pub fn display_percent(score_percent: f64) -> u32 {
    let clamped = score_percent.clamp(0.0, 100.0).round();
    // Clamped to 0..=100 so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = clamped as u32;
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_percent_rounds() {
        assert_eq!(display_percent(66.666_666), 67);
        assert_eq!(display_percent(33.333_333), 33);
        assert_eq!(display_percent(100.0), 100);
        assert_eq!(display_percent(0.0), 0);
    }
}
