use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS quizzes (
            course_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            quiz_id TEXT NOT NULL,
            title TEXT NOT NULL,
            passing_score REAL NOT NULL CHECK (passing_score BETWEEN 0 AND 100),
            PRIMARY KEY (course_id, module_id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_questions (
            course_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            id TEXT NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            kind TEXT NOT NULL,
            prompt TEXT NOT NULL,
            options TEXT NOT NULL,
            correct_answer TEXT NOT NULL,
            explanation TEXT NOT NULL,
            PRIMARY KEY (course_id, module_id, id),
            FOREIGN KEY (course_id, module_id)
                REFERENCES quizzes(course_id, module_id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS lessons (
            course_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            id TEXT NOT NULL,
            number INTEGER NOT NULL CHECK (number >= 0),
            title TEXT NOT NULL,
            duration TEXT,
            PRIMARY KEY (course_id, module_id, id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS enrollments (
            id BLOB PRIMARY KEY,
            user_id TEXT NOT NULL,
            state_id TEXT NOT NULL,
            exam_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            enrolled_at TEXT NOT NULL,
            UNIQUE (user_id, course_id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_attempts (
            id BLOB PRIMARY KEY,
            enrollment_id BLOB NOT NULL,
            user_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            quiz_id TEXT NOT NULL,
            score REAL NOT NULL CHECK (score BETWEEN 0 AND 100),
            total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
            correct_answers INTEGER NOT NULL CHECK (correct_answers >= 0),
            time_taken_minutes INTEGER NOT NULL CHECK (time_taken_minutes >= 0),
            passed INTEGER NOT NULL CHECK (passed IN (0, 1)),
            attempted_at TEXT NOT NULL,
            FOREIGN KEY (enrollment_id) REFERENCES enrollments(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_answers (
            attempt_id BLOB NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            question_id TEXT NOT NULL,
            selected_answer TEXT,
            correct_answer TEXT NOT NULL,
            is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
            PRIMARY KEY (attempt_id, question_id),
            FOREIGN KEY (attempt_id) REFERENCES quiz_attempts(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS lesson_progress (
            user_id TEXT NOT NULL,
            enrollment_id BLOB NOT NULL,
            course_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            lesson_id TEXT NOT NULL,
            completed_at TEXT NOT NULL,
            time_spent_minutes INTEGER NOT NULL CHECK (time_spent_minutes >= 0),
            PRIMARY KEY (user_id, course_id, lesson_id),
            FOREIGN KEY (enrollment_id) REFERENCES enrollments(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_questions_position
            ON quiz_questions (course_id, module_id, position);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user_course_attempted
            ON quiz_attempts (user_id, course_id, attempted_at);
    ",
];

const SCHEMA_V2: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS certificates (
            id BLOB PRIMARY KEY,
            number TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            enrollment_id BLOB NOT NULL,
            course_id TEXT NOT NULL,
            course_name TEXT NOT NULL,
            issued_at TEXT NOT NULL,
            UNIQUE (user_id, course_id),
            FOREIGN KEY (enrollment_id) REFERENCES enrollments(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS achievements (
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            earned_at TEXT NOT NULL,
            PRIMARY KEY (user_id, kind)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS study_streaks (
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            lessons_completed INTEGER NOT NULL CHECK (lessons_completed >= 0),
            quizzes_taken INTEGER NOT NULL CHECK (quizzes_taken >= 0),
            minutes_studied INTEGER NOT NULL CHECK (minutes_studied >= 0),
            PRIMARY KEY (user_id, date)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS bookmarks (
            user_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            lesson_id TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, lesson_id)
        );
    ",
];

const MIGRATIONS: &[(i64, &[&str])] = &[(1, SCHEMA_V1), (2, SCHEMA_V2)];

/// Applies every pending schema version in order, each in its own transaction.
///
/// Version 1 creates quiz content (quizzes, questions, lessons), enrollments,
/// attempts with their answers, and lesson progress. Version 2 adds
/// certificates, achievements, study streaks and bookmarks.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    for (version, statements) in MIGRATIONS {
        if is_applied(pool, *version).await? {
            continue;
        }
        let mut tx = pool.begin().await?;

        for statement in *statements {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(*version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
