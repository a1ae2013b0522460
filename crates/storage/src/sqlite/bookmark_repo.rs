use quiz_core::model::{Bookmark, LessonId, UserId};

use super::{SqliteRepository, conn_err, mapping::map_bookmark_row, write_err};
use crate::repository::{BookmarkRepository, StorageError};

#[async_trait::async_trait]
impl BookmarkRepository for SqliteRepository {
    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO bookmarks (user_id, course_id, module_id, lesson_id, notes, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                    notes = excluded.notes
            ",
        )
        .bind(bookmark.user_id.as_str())
        .bind(bookmark.course_id.as_str())
        .bind(bookmark.module_id.as_str())
        .bind(bookmark.lesson_id.as_str())
        .bind(bookmark.notes.as_deref())
        .bind(bookmark.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn remove_bookmark(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = ?1 AND lesson_id = ?2")
            .bind(user_id.as_str())
            .bind(lesson_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_bookmarks(&self, user_id: &UserId) -> Result<Vec<Bookmark>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, course_id, module_id, lesson_id, notes, created_at
                FROM bookmarks
                WHERE user_id = ?1
                ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_bookmark_row(&row)?);
        }
        Ok(out)
    }
}
