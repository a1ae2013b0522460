use chrono::NaiveDate;
use quiz_core::model::{Achievement, StudyActivity, StudyDay, UserId};

use super::{
    SqliteRepository, conn_err,
    mapping::{map_achievement_row, map_study_day_row},
    write_err,
};
use crate::repository::{AchievementRepository, StorageError, StreakRepository};

#[async_trait::async_trait]
impl AchievementRepository for SqliteRepository {
    async fn grant_achievement(&self, achievement: &Achievement) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r"
                INSERT INTO achievements (user_id, kind, earned_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id, kind) DO NOTHING
            ",
        )
        .bind(achievement.user_id.as_str())
        .bind(achievement.kind.as_str())
        .bind(achievement.earned_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_achievements(&self, user_id: &UserId) -> Result<Vec<Achievement>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, kind, earned_at
                FROM achievements
                WHERE user_id = ?1
                ORDER BY earned_at DESC, rowid DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_achievement_row(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl StreakRepository for SqliteRepository {
    async fn record_study_day(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        activity: StudyActivity,
    ) -> Result<StudyDay, StorageError> {
        let row = sqlx::query(
            r"
                INSERT INTO study_streaks (
                    user_id, date, lessons_completed, quizzes_taken, minutes_studied
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(user_id, date) DO UPDATE SET
                    lessons_completed = lessons_completed + excluded.lessons_completed,
                    quizzes_taken = quizzes_taken + excluded.quizzes_taken,
                    minutes_studied = minutes_studied + excluded.minutes_studied
                RETURNING user_id, date, lessons_completed, quizzes_taken, minutes_studied
            ",
        )
        .bind(user_id.as_str())
        .bind(date)
        .bind(i64::from(activity.lessons_completed))
        .bind(i64::from(activity.quizzes_taken))
        .bind(i64::from(activity.minutes_studied))
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_study_day_row(&row)
    }

    async fn list_study_days(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StudyDay>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, date, lessons_completed, quizzes_taken, minutes_studied
                FROM study_streaks
                WHERE user_id = ?1
                ORDER BY date DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_study_day_row(&row)?);
        }
        Ok(out)
    }
}
