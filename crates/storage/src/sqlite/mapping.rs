use quiz_core::model::{
    Achievement, AchievementKind, AttemptId, AttemptRecord, Bookmark, Certificate, CertificateId,
    CertificateNumber, CourseId, Enrollment, EnrollmentId, ExamId, LessonId, LessonProgress,
    ModuleId, OptionLetter, QuestionDraft, QuestionId, QuestionKind, QuestionOutcome, QuizId,
    StateId, StudyDay, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn text(row: &SqliteRow, column: &str) -> Result<String, StorageError> {
    row.try_get::<String, _>(column).map_err(ser)
}

fn flag(row: &SqliteRow, column: &str) -> Result<bool, StorageError> {
    match row.try_get::<i64, _>(column).map_err(ser)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StorageError::Serialization(format!(
            "invalid {column}: {other}"
        ))),
    }
}

pub(crate) fn parse_kind(s: &str) -> Result<QuestionKind, StorageError> {
    QuestionKind::parse(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid question kind: {s}")))
}

/// Options are stored as a JSON array of labels, in display order.
pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuestionDraft, StorageError> {
    let options: Vec<String> = serde_json::from_str(&text(row, "options")?).map_err(ser)?;
    Ok(QuestionDraft {
        id: text(row, "id")?,
        kind: parse_kind(&text(row, "kind")?)?,
        prompt: text(row, "prompt")?,
        options,
        correct_answer: text(row, "correct_answer")?,
        explanation: text(row, "explanation")?,
    })
}

pub(crate) fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    Ok(Enrollment {
        id: EnrollmentId::new(row.try_get::<Uuid, _>("id").map_err(ser)?),
        user_id: UserId::new(text(row, "user_id")?),
        state_id: StateId::new(text(row, "state_id")?),
        exam_id: ExamId::new(text(row, "exam_id")?),
        course_id: CourseId::new(text(row, "course_id")?),
        enrolled_at: row.try_get("enrolled_at").map_err(ser)?,
    })
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<AttemptRecord, StorageError> {
    Ok(AttemptRecord {
        id: AttemptId::new(row.try_get::<Uuid, _>("id").map_err(ser)?),
        enrollment_id: EnrollmentId::new(row.try_get::<Uuid, _>("enrollment_id").map_err(ser)?),
        user_id: UserId::new(text(row, "user_id")?),
        course_id: CourseId::new(text(row, "course_id")?),
        module_id: ModuleId::new(text(row, "module_id")?),
        quiz_id: QuizId::new(text(row, "quiz_id")?),
        score_percent: row.try_get("score").map_err(ser)?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        correct_answers: u32_from_i64(
            "correct_answers",
            row.try_get("correct_answers").map_err(ser)?,
        )?,
        time_taken_minutes: u32_from_i64(
            "time_taken_minutes",
            row.try_get("time_taken_minutes").map_err(ser)?,
        )?,
        passed: flag(row, "passed")?,
        attempted_at: row.try_get("attempted_at").map_err(ser)?,
    })
}

pub(crate) fn map_answer_row(row: &SqliteRow) -> Result<QuestionOutcome, StorageError> {
    Ok(QuestionOutcome {
        question_id: QuestionId::new(text(row, "question_id")?),
        selected: row
            .try_get::<Option<String>, _>("selected_answer")
            .map_err(ser)?
            .map(OptionLetter::new),
        correct_answer: OptionLetter::new(text(row, "correct_answer")?),
        is_correct: flag(row, "is_correct")?,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    Ok(LessonProgress {
        user_id: UserId::new(text(row, "user_id")?),
        enrollment_id: EnrollmentId::new(row.try_get::<Uuid, _>("enrollment_id").map_err(ser)?),
        course_id: CourseId::new(text(row, "course_id")?),
        module_id: ModuleId::new(text(row, "module_id")?),
        lesson_id: LessonId::new(text(row, "lesson_id")?),
        completed_at: row.try_get("completed_at").map_err(ser)?,
        time_spent_minutes: u32_from_i64(
            "time_spent_minutes",
            row.try_get("time_spent_minutes").map_err(ser)?,
        )?,
    })
}

pub(crate) fn map_certificate_row(row: &SqliteRow) -> Result<Certificate, StorageError> {
    Ok(Certificate {
        id: CertificateId::new(row.try_get::<Uuid, _>("id").map_err(ser)?),
        number: CertificateNumber::new(text(row, "number")?),
        user_id: UserId::new(text(row, "user_id")?),
        enrollment_id: EnrollmentId::new(row.try_get::<Uuid, _>("enrollment_id").map_err(ser)?),
        course_id: CourseId::new(text(row, "course_id")?),
        course_name: text(row, "course_name")?,
        issued_at: row.try_get("issued_at").map_err(ser)?,
    })
}

pub(crate) fn map_achievement_row(row: &SqliteRow) -> Result<Achievement, StorageError> {
    let kind = text(row, "kind")?;
    Ok(Achievement {
        user_id: UserId::new(text(row, "user_id")?),
        kind: AchievementKind::parse(&kind)
            .ok_or_else(|| StorageError::Serialization(format!("invalid achievement: {kind}")))?,
        earned_at: row.try_get("earned_at").map_err(ser)?,
    })
}

pub(crate) fn map_study_day_row(row: &SqliteRow) -> Result<StudyDay, StorageError> {
    Ok(StudyDay {
        user_id: UserId::new(text(row, "user_id")?),
        date: row.try_get("date").map_err(ser)?,
        lessons_completed: u32_from_i64(
            "lessons_completed",
            row.try_get("lessons_completed").map_err(ser)?,
        )?,
        quizzes_taken: u32_from_i64("quizzes_taken", row.try_get("quizzes_taken").map_err(ser)?)?,
        minutes_studied: u32_from_i64(
            "minutes_studied",
            row.try_get("minutes_studied").map_err(ser)?,
        )?,
    })
}

pub(crate) fn map_bookmark_row(row: &SqliteRow) -> Result<Bookmark, StorageError> {
    Ok(Bookmark {
        user_id: UserId::new(text(row, "user_id")?),
        course_id: CourseId::new(text(row, "course_id")?),
        module_id: ModuleId::new(text(row, "module_id")?),
        lesson_id: LessonId::new(text(row, "lesson_id")?),
        notes: row.try_get("notes").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
