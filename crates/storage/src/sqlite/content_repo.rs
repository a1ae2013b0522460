use quiz_core::model::{CourseId, ModuleContent, ModuleId, PassingThreshold, Quiz, QuizId};
use sqlx::Row;

use super::{
    SqliteRepository, conn_err,
    mapping::{map_question_row, options_to_json, ser, u32_from_i64},
    write_err,
};
use crate::repository::{ContentRepository, QuestionSource, StorageError};

#[async_trait::async_trait]
impl QuestionSource for SqliteRepository {
    async fn load_quiz(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> Result<Quiz, StorageError> {
        let header = sqlx::query(
            r"
                SELECT quiz_id, title, passing_score
                FROM quizzes
                WHERE course_id = ?1 AND module_id = ?2
            ",
        )
        .bind(course_id.as_str())
        .bind(module_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?
        .ok_or(StorageError::NotFound)?;

        let rows = sqlx::query(
            r"
                SELECT id, kind, prompt, options, correct_answer, explanation
                FROM quiz_questions
                WHERE course_id = ?1 AND module_id = ?2
                ORDER BY position ASC
            ",
        )
        .bind(course_id.as_str())
        .bind(module_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut drafts = Vec::with_capacity(rows.len());
        for row in &rows {
            drafts.push(map_question_row(row)?);
        }

        let threshold =
            PassingThreshold::new(header.try_get("passing_score").map_err(ser)?).map_err(ser)?;
        let quiz = Quiz::from_drafts(course_id.clone(), module_id.clone(), drafts)
            .map_err(ser)?
            .with_id(QuizId::new(header.try_get::<String, _>("quiz_id").map_err(ser)?))
            .with_title(header.try_get::<String, _>("title").map_err(ser)?)
            .with_passing_threshold(threshold);
        Ok(quiz)
    }
}

#[async_trait::async_trait]
impl ContentRepository for SqliteRepository {
    async fn upsert_module(
        &self,
        course_id: &CourseId,
        module: &ModuleContent,
    ) -> Result<(), StorageError> {
        // Validate before touching the database so stored questions are always well-formed.
        let quiz = module.to_quiz(course_id.clone()).map_err(ser)?;

        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        sqlx::query(
            r"
                INSERT INTO quizzes (course_id, module_id, quiz_id, title, passing_score)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(course_id, module_id) DO UPDATE SET
                    quiz_id = excluded.quiz_id,
                    title = excluded.title,
                    passing_score = excluded.passing_score
            ",
        )
        .bind(course_id.as_str())
        .bind(module.module_id.as_str())
        .bind(quiz.id().as_str())
        .bind(quiz.title())
        .bind(quiz.passing_threshold().percent())
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        sqlx::query("DELETE FROM quiz_questions WHERE course_id = ?1 AND module_id = ?2")
            .bind(course_id.as_str())
            .bind(module.module_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;

        for (position, question) in quiz.questions().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO quiz_questions (
                        course_id, module_id, id, position, kind, prompt,
                        options, correct_answer, explanation
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
            )
            .bind(course_id.as_str())
            .bind(module.module_id.as_str())
            .bind(question.id().as_str())
            .bind(position)
            .bind(question.kind().as_str())
            .bind(question.prompt())
            .bind(options_to_json(question.options())?)
            .bind(question.correct_answer().as_str())
            .bind(question.explanation())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        sqlx::query("DELETE FROM lessons WHERE course_id = ?1 AND module_id = ?2")
            .bind(course_id.as_str())
            .bind(module.module_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;

        for lesson in &module.lessons {
            sqlx::query(
                r"
                    INSERT INTO lessons (course_id, module_id, id, number, title, duration)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(course_id.as_str())
            .bind(module.module_id.as_str())
            .bind(lesson.id.as_str())
            .bind(i64::from(lesson.number))
            .bind(lesson.title.as_str())
            .bind(lesson.duration.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(conn_err)?;
        Ok(())
    }

    async fn count_lessons(
        &self,
        course_id: &CourseId,
        module_id: Option<&ModuleId>,
    ) -> Result<u32, StorageError> {
        let count: i64 = sqlx::query_scalar(
            r"
                SELECT COUNT(*)
                FROM lessons
                WHERE course_id = ?1 AND (?2 IS NULL OR module_id = ?2)
            ",
        )
        .bind(course_id.as_str())
        .bind(module_id.map(ModuleId::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(conn_err)?;

        u32_from_i64("lesson count", count)
    }

    async fn list_quiz_modules(&self, course_id: &CourseId) -> Result<Vec<ModuleId>, StorageError> {
        let modules: Vec<String> = sqlx::query_scalar(
            r"
                SELECT DISTINCT module_id
                FROM quiz_questions
                WHERE course_id = ?1
                ORDER BY module_id ASC
            ",
        )
        .bind(course_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        Ok(modules.into_iter().map(ModuleId::new).collect())
    }
}
