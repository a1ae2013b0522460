use std::sync::Arc;

use quiz_core::model::{
    Achievement, AchievementKind, STREAK_GOAL_DAYS, StudyActivity, StudyDay, UserId,
    current_streak,
};
use storage::repository::{AchievementRepository, StreakRepository};
use tracing::info;

use crate::Clock;
use crate::error::ActivityError;

/// Days of history read when working out the current streak.
const STREAK_LOOKBACK_DAYS: u32 = 366;

/// A learner's current run of study days and their recent tallies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyStreak {
    pub current_days: u32,
    /// Newest first.
    pub recent: Vec<StudyDay>,
}

/// Records study days and grants achievements as lessons and quizzes complete.
#[derive(Clone)]
pub struct ActivityService {
    clock: Clock,
    streaks: Arc<dyn StreakRepository>,
    achievements: Arc<dyn AchievementRepository>,
}

impl ActivityService {
    #[must_use]
    pub fn new(
        clock: Clock,
        streaks: Arc<dyn StreakRepository>,
        achievements: Arc<dyn AchievementRepository>,
    ) -> Self {
        Self {
            clock,
            streaks,
            achievements,
        }
    }

    /// Count a completed lesson toward today and return newly earned achievements.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::Storage` on backend failures.
    pub async fn record_lesson(
        &self,
        user_id: &UserId,
        minutes: u32,
    ) -> Result<Vec<AchievementKind>, ActivityError> {
        self.record(user_id, StudyActivity::lesson(minutes), vec![AchievementKind::FirstLesson])
            .await
    }

    /// Count a submitted quiz toward today and return newly earned achievements.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::Storage` on backend failures.
    pub async fn record_quiz(
        &self,
        user_id: &UserId,
        minutes: u32,
        passed: bool,
        score_percent: f64,
    ) -> Result<Vec<AchievementKind>, ActivityError> {
        self.record(
            user_id,
            StudyActivity::quiz(minutes),
            AchievementKind::for_quiz(passed, score_percent),
        )
        .await
    }

    async fn record(
        &self,
        user_id: &UserId,
        activity: StudyActivity,
        mut earned: Vec<AchievementKind>,
    ) -> Result<Vec<AchievementKind>, ActivityError> {
        let today = self.clock.now().date_naive();
        self.streaks
            .record_study_day(user_id, today, activity)
            .await?;

        let days = self.streaks.list_study_days(user_id, STREAK_GOAL_DAYS).await?;
        let dates: Vec<_> = days.iter().map(|d| d.date).collect();
        if current_streak(&dates, today) >= STREAK_GOAL_DAYS {
            earned.push(AchievementKind::DedicatedStudent);
        }

        let mut granted = Vec::new();
        for kind in earned {
            if self.grant(user_id, kind).await? {
                granted.push(kind);
            }
        }
        Ok(granted)
    }

    /// Grant one achievement; `Ok(false)` when the user already holds it.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::Storage` on backend failures.
    pub async fn grant(&self, user_id: &UserId, kind: AchievementKind) -> Result<bool, ActivityError> {
        let achievement = Achievement::new(user_id.clone(), kind, self.clock.now());
        let granted = self.achievements.grant_achievement(&achievement).await?;
        if granted {
            info!(%user_id, achievement = kind.as_str(), "achievement earned");
        }
        Ok(granted)
    }

    /// # Errors
    ///
    /// Returns `ActivityError::Storage` on backend failures.
    pub async fn achievements(&self, user_id: &UserId) -> Result<Vec<Achievement>, ActivityError> {
        Ok(self.achievements.list_achievements(user_id).await?)
    }

    /// # Errors
    ///
    /// Returns `ActivityError::Storage` on backend failures.
    pub async fn streak(&self, user_id: &UserId) -> Result<StudyStreak, ActivityError> {
        let recent = self
            .streaks
            .list_study_days(user_id, STREAK_LOOKBACK_DAYS)
            .await?;
        let dates: Vec<_> = recent.iter().map(|d| d.date).collect();
        Ok(StudyStreak {
            current_days: current_streak(&dates, self.clock.now().date_naive()),
            recent,
        })
    }
}
