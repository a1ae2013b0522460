use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

use crate::model::ids::UserId;

// ─── Achievements ──────────────────────────────────────────────────────────────

/// Score at or above which a passed quiz earns `HighScorer`.
pub const HIGH_SCORE_PERCENT: f64 = 90.0;

/// Consecutive study days that earn `DedicatedStudent`.
pub const STREAK_GOAL_DAYS: u32 = 7;

/// Kinds of achievement a learner can earn, each at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AchievementKind {
    FirstLesson,
    FirstQuizPassed,
    HighScorer,
    PerfectScore,
    DedicatedStudent,
    CourseComplete,
}

impl AchievementKind {
    pub const ALL: [Self; 6] = [
        Self::FirstLesson,
        Self::FirstQuizPassed,
        Self::HighScorer,
        Self::PerfectScore,
        Self::DedicatedStudent,
        Self::CourseComplete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstLesson => "first_lesson",
            Self::FirstQuizPassed => "first_quiz_passed",
            Self::HighScorer => "high_scorer",
            Self::PerfectScore => "perfect_score",
            Self::DedicatedStudent => "dedicated_student",
            Self::CourseComplete => "course_complete",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::FirstLesson => "First Lesson Complete",
            Self::FirstQuizPassed => "Quiz Passed",
            Self::HighScorer => "High Scorer",
            Self::PerfectScore => "Perfect Score",
            Self::DedicatedStudent => "Dedicated Student",
            Self::CourseComplete => "Course Complete",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::FirstLesson => "Completed your first lesson!",
            Self::FirstQuizPassed => "Passed your first module quiz.",
            Self::HighScorer => "Scored 90%+ on a module quiz.",
            Self::PerfectScore => "Answered every question of a quiz correctly.",
            Self::DedicatedStudent => "Studied 7 days in a row.",
            Self::CourseComplete => "Earned a certificate of completion.",
        }
    }

    /// Achievements a single quiz result qualifies for.
    #[must_use]
    pub fn for_quiz(passed: bool, score_percent: f64) -> Vec<Self> {
        if !passed {
            return Vec::new();
        }
        let mut kinds = vec![Self::FirstQuizPassed];
        if score_percent >= HIGH_SCORE_PERCENT {
            kinds.push(Self::HighScorer);
        }
        if score_percent >= 100.0 {
            kinds.push(Self::PerfectScore);
        }
        kinds
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub user_id: UserId,
    pub kind: AchievementKind,
    pub earned_at: DateTime<Utc>,
}

impl Achievement {
    #[must_use]
    pub fn new(user_id: UserId, kind: AchievementKind, earned_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            kind,
            earned_at,
        }
    }
}

// ─── Study Streaks ─────────────────────────────────────────────────────────────

/// Activity to add to one day's tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudyActivity {
    pub lessons_completed: u32,
    pub quizzes_taken: u32,
    pub minutes_studied: u32,
}

impl StudyActivity {
    #[must_use]
    pub fn lesson(minutes: u32) -> Self {
        Self {
            lessons_completed: 1,
            minutes_studied: minutes,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn quiz(minutes: u32) -> Self {
        Self {
            quizzes_taken: 1,
            minutes_studied: minutes,
            ..Self::default()
        }
    }
}

/// One calendar day (UTC) of study. Unique per (user, date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyDay {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub lessons_completed: u32,
    pub quizzes_taken: u32,
    pub minutes_studied: u32,
}

impl StudyDay {
    #[must_use]
    pub fn new(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            lessons_completed: 0,
            quizzes_taken: 0,
            minutes_studied: 0,
        }
    }

    pub fn record(&mut self, activity: StudyActivity) {
        self.lessons_completed = self
            .lessons_completed
            .saturating_add(activity.lessons_completed);
        self.quizzes_taken = self.quizzes_taken.saturating_add(activity.quizzes_taken);
        self.minutes_studied = self
            .minutes_studied
            .saturating_add(activity.minutes_studied);
    }
}

/// Consecutive study days ending today, or ending yesterday while today has
/// no activity yet.
#[must_use]
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let mut cursor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| days.contains(yesterday))
    };

    let mut streak = 0;
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}
