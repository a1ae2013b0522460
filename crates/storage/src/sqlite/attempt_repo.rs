use quiz_core::model::{AttemptDetails, AttemptId, AttemptRecord, CourseId, UserId};

use super::{
    SqliteRepository, conn_err,
    mapping::{map_answer_row, map_attempt_row},
    write_err,
};
use crate::repository::{AttemptRepository, StorageError};

const ATTEMPT_COLUMNS: &str = r"
    id, enrollment_id, user_id, course_id, module_id, quiz_id, score,
    total_questions, correct_answers, time_taken_minutes, passed, attempted_at
";

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, details: &AttemptDetails) -> Result<AttemptId, StorageError> {
        let attempt = &details.attempt;
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    id, enrollment_id, user_id, course_id, module_id, quiz_id, score,
                    total_questions, correct_answers, time_taken_minutes, passed, attempted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
        )
        .bind(attempt.id.value())
        .bind(attempt.enrollment_id.value())
        .bind(attempt.user_id.as_str())
        .bind(attempt.course_id.as_str())
        .bind(attempt.module_id.as_str())
        .bind(attempt.quiz_id.as_str())
        .bind(attempt.score_percent)
        .bind(i64::from(attempt.total_questions))
        .bind(i64::from(attempt.correct_answers))
        .bind(i64::from(attempt.time_taken_minutes))
        .bind(i64::from(attempt.passed))
        .bind(attempt.attempted_at)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        for (position, answer) in details.answers.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO quiz_answers (
                        attempt_id, position, question_id, selected_answer,
                        correct_answer, is_correct
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(attempt.id.value())
            .bind(position)
            .bind(answer.question_id.as_str())
            .bind(answer.selected.as_ref().map(|l| l.as_str().to_owned()))
            .bind(answer.correct_answer.as_str())
            .bind(i64::from(answer.is_correct))
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        // Dropping the transaction without commit rolls back the attempt row too.
        tx.commit().await.map_err(conn_err)?;
        Ok(attempt.id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptDetails, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = ?1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?
        .ok_or(StorageError::NotFound)?;
        let attempt = map_attempt_row(&row)?;

        let rows = sqlx::query(
            r"
                SELECT question_id, selected_answer, correct_answer, is_correct
                FROM quiz_answers
                WHERE attempt_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut answers = Vec::with_capacity(rows.len());
        for row in rows {
            answers.push(map_answer_row(&row)?);
        }
        Ok(AttemptDetails { attempt, answers })
    }

    async fn list_attempts(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
                SELECT {ATTEMPT_COLUMNS}
                FROM quiz_attempts
                WHERE user_id = ?1 AND course_id = ?2
                ORDER BY attempted_at DESC, rowid DESC
                LIMIT ?3
            "
        ))
        .bind(user_id.as_str())
        .bind(course_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}
