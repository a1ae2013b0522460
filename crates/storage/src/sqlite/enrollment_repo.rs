use quiz_core::model::{CourseId, Enrollment, UserId};

use super::{SqliteRepository, conn_err, mapping::map_enrollment_row, write_err};
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO enrollments (id, user_id, state_id, exam_id, course_id, enrolled_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(enrollment.id.value())
        .bind(enrollment.user_id.as_str())
        .bind(enrollment.state_id.as_str())
        .bind(enrollment.exam_id.as_str())
        .bind(enrollment.course_id.as_str())
        .bind(enrollment.enrolled_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, user_id, state_id, exam_id, course_id, enrolled_at
                FROM enrollments
                WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(course_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn list_enrollments(&self, user_id: &UserId) -> Result<Vec<Enrollment>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, state_id, exam_id, course_id, enrolled_at
                FROM enrollments
                WHERE user_id = ?1
                ORDER BY enrolled_at DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_enrollment_row(&row)?);
        }
        Ok(out)
    }
}
