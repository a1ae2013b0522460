use quiz_core::model::{CourseId, LessonProgress, ModuleId, UserId};

use super::{SqliteRepository, conn_err, mapping::map_progress_row, write_err};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_lesson_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO lesson_progress (
                    user_id, enrollment_id, course_id, module_id, lesson_id,
                    completed_at, time_spent_minutes
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(user_id, course_id, lesson_id) DO UPDATE SET
                    enrollment_id = excluded.enrollment_id,
                    module_id = excluded.module_id,
                    completed_at = excluded.completed_at,
                    time_spent_minutes = excluded.time_spent_minutes
            ",
        )
        .bind(progress.user_id.as_str())
        .bind(progress.enrollment_id.value())
        .bind(progress.course_id.as_str())
        .bind(progress.module_id.as_str())
        .bind(progress.lesson_id.as_str())
        .bind(progress.completed_at)
        .bind(i64::from(progress.time_spent_minutes))
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn list_lesson_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        module_id: Option<&ModuleId>,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    user_id, enrollment_id, course_id, module_id, lesson_id,
                    completed_at, time_spent_minutes
                FROM lesson_progress
                WHERE user_id = ?1 AND course_id = ?2 AND (?3 IS NULL OR module_id = ?3)
                ORDER BY completed_at ASC
            ",
        )
        .bind(user_id.as_str())
        .bind(course_id.as_str())
        .bind(module_id.map(ModuleId::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }
}
