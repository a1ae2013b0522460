use async_trait::async_trait;
use chrono::NaiveDate;
use quiz_core::model::{
    Achievement, AttemptDetails, AttemptId, AttemptRecord, Bookmark, Certificate, CourseId,
    Enrollment, LessonId, LessonProgress, ModuleContent, ModuleId, Quiz, StudyActivity, StudyDay,
    UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Supplies the ordered question set for a module quiz.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Load and validate the quiz for a course module.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module has no quiz, or
    /// `StorageError::Serialization` if stored questions are structurally incomplete.
    async fn load_quiz(&self, course_id: &CourseId, module_id: &ModuleId)
    -> Result<Quiz, StorageError>;
}

/// Authoring-side access to module content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Replace a module's lessons and quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the content cannot be stored.
    async fn upsert_module(
        &self,
        course_id: &CourseId,
        module: &ModuleContent,
    ) -> Result<(), StorageError>;

    /// Count lessons in a course, or in one module of it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_lessons(
        &self,
        course_id: &CourseId,
        module_id: Option<&ModuleId>,
    ) -> Result<u32, StorageError>;

    /// Modules of a course whose quiz has at least one question, by module id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_quiz_modules(&self, course_id: &CourseId) -> Result<Vec<ModuleId>, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Store a new enrollment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user is already enrolled in the course.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// Find the enrollment of a user in a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing enrollment is `Ok(None)`.
    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// All enrollments of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_enrollments(&self, user_id: &UserId) -> Result<Vec<Enrollment>, StorageError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Store an attempt and all of its answers atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt id already exists.
    async fn append_attempt(&self, details: &AttemptDetails) -> Result<AttemptId, StorageError>;

    /// Fetch an attempt with its answers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptDetails, StorageError>;

    /// A user's attempts in a course, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_attempts(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert or replace completion of a lesson, keyed by (user, course, lesson).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_lesson_progress(&self, progress: &LessonProgress) -> Result<(), StorageError>;

    /// Completed lessons for a user in a course, optionally narrowed to one module.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_lesson_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        module_id: Option<&ModuleId>,
    ) -> Result<Vec<LessonProgress>, StorageError>;
}

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Store an issued certificate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user already holds a certificate for
    /// the course or the number is taken.
    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing certificate is `Ok(None)`.
    async fn find_certificate(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Certificate>, StorageError>;

    /// A user's certificates, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_certificates(&self, user_id: &UserId) -> Result<Vec<Certificate>, StorageError>;
}

#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// Record an achievement; `Ok(false)` when the user already holds that kind.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn grant_achievement(&self, achievement: &Achievement) -> Result<bool, StorageError>;

    /// A user's achievements, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_achievements(&self, user_id: &UserId) -> Result<Vec<Achievement>, StorageError>;
}

#[async_trait]
pub trait StreakRepository: Send + Sync {
    /// Add `activity` to the user's tally for `date` and return the updated day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the tally cannot be stored.
    async fn record_study_day(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        activity: StudyActivity,
    ) -> Result<StudyDay, StorageError>;

    /// The user's most recent study days, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_study_days(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StudyDay>, StorageError>;
}

#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Save a lesson bookmark; saving the same lesson again replaces its notes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark cannot be stored.
    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Result<(), StorageError>;

    /// Delete a bookmark; `Ok(false)` when there was none.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn remove_bookmark(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> Result<bool, StorageError>;

    /// A user's bookmarks, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_bookmarks(&self, user_id: &UserId) -> Result<Vec<Bookmark>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    modules: Arc<Mutex<HashMap<(CourseId, ModuleId), ModuleContent>>>,
    enrollments: Arc<Mutex<Vec<Enrollment>>>,
    attempts: Arc<Mutex<Vec<AttemptDetails>>>,
    progress: Arc<Mutex<Vec<LessonProgress>>>,
    certificates: Arc<Mutex<Vec<Certificate>>>,
    achievements: Arc<Mutex<Vec<Achievement>>>,
    study_days: Arc<Mutex<Vec<StudyDay>>>,
    bookmarks: Arc<Mutex<Vec<Bookmark>>>,
}

fn poisoned<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionSource for InMemoryRepository {
    async fn load_quiz(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> Result<Quiz, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        let module = guard
            .get(&(course_id.clone(), module_id.clone()))
            .ok_or(StorageError::NotFound)?;
        module
            .to_quiz(course_id.clone())
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn upsert_module(
        &self,
        course_id: &CourseId,
        module: &ModuleContent,
    ) -> Result<(), StorageError> {
        module
            .to_quiz(course_id.clone())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut guard = self.modules.lock().map_err(poisoned)?;
        guard.insert((course_id.clone(), module.module_id.clone()), module.clone());
        Ok(())
    }

    async fn count_lessons(
        &self,
        course_id: &CourseId,
        module_id: Option<&ModuleId>,
    ) -> Result<u32, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        let count: usize = guard
            .iter()
            .filter(|((c, m), _)| c == course_id && module_id.is_none_or(|wanted| m == wanted))
            .map(|(_, module)| module.lessons.len())
            .sum();
        u32::try_from(count).map_err(|_| StorageError::Serialization("lesson count overflow".into()))
    }

    async fn list_quiz_modules(&self, course_id: &CourseId) -> Result<Vec<ModuleId>, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        let mut out: Vec<ModuleId> = guard
            .iter()
            .filter(|((c, _), module)| c == course_id && !module.quiz.questions.is_empty())
            .map(|((_, m), _)| m.clone())
            .collect();
        out.sort();
        Ok(out)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = self.enrollments.lock().map_err(poisoned)?;
        if guard
            .iter()
            .any(|e| e.user_id == enrollment.user_id && e.course_id == enrollment.course_id)
        {
            return Err(StorageError::Conflict);
        }
        guard.push(enrollment.clone());
        Ok(())
    }

    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let guard = self.enrollments.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .find(|e| &e.user_id == user_id && &e.course_id == course_id)
            .cloned())
    }

    async fn list_enrollments(&self, user_id: &UserId) -> Result<Vec<Enrollment>, StorageError> {
        let guard = self.enrollments.lock().map_err(poisoned)?;
        let mut out: Vec<Enrollment> = guard
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(out)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, details: &AttemptDetails) -> Result<AttemptId, StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        if guard.iter().any(|d| d.attempt.id == details.attempt.id) {
            return Err(StorageError::Conflict);
        }
        guard.push(details.clone());
        Ok(details.attempt.id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptDetails, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        guard
            .iter()
            .find(|d| d.attempt.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        // Vec order is insertion order; reverse so ties on timestamp stay newest first.
        let mut out: Vec<AttemptRecord> = guard
            .iter()
            .rev()
            .filter(|d| &d.attempt.user_id == user_id && &d.attempt.course_id == course_id)
            .map(|d| d.attempt.clone())
            .collect();
        out.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_lesson_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard.retain(|p| {
            !(p.user_id == progress.user_id
                && p.course_id == progress.course_id
                && p.lesson_id == progress.lesson_id)
        });
        guard.push(progress.clone());
        Ok(())
    }

    async fn list_lesson_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        module_id: Option<&ModuleId>,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|p| {
                &p.user_id == user_id
                    && &p.course_id == course_id
                    && module_id.is_none_or(|m| &p.module_id == m)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CertificateRepository for InMemoryRepository {
    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), StorageError> {
        let mut guard = self.certificates.lock().map_err(poisoned)?;
        if guard.iter().any(|c| {
            (c.user_id == certificate.user_id && c.course_id == certificate.course_id)
                || c.number == certificate.number
        }) {
            return Err(StorageError::Conflict);
        }
        guard.push(certificate.clone());
        Ok(())
    }

    async fn find_certificate(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Certificate>, StorageError> {
        let guard = self.certificates.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .find(|c| &c.user_id == user_id && &c.course_id == course_id)
            .cloned())
    }

    async fn list_certificates(&self, user_id: &UserId) -> Result<Vec<Certificate>, StorageError> {
        let guard = self.certificates.lock().map_err(poisoned)?;
        let mut out: Vec<Certificate> = guard
            .iter()
            .filter(|c| &c.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(out)
    }
}

#[async_trait]
impl AchievementRepository for InMemoryRepository {
    async fn grant_achievement(&self, achievement: &Achievement) -> Result<bool, StorageError> {
        let mut guard = self.achievements.lock().map_err(poisoned)?;
        if guard
            .iter()
            .any(|a| a.user_id == achievement.user_id && a.kind == achievement.kind)
        {
            return Ok(false);
        }
        guard.push(achievement.clone());
        Ok(true)
    }

    async fn list_achievements(&self, user_id: &UserId) -> Result<Vec<Achievement>, StorageError> {
        let guard = self.achievements.lock().map_err(poisoned)?;
        let mut out: Vec<Achievement> = guard
            .iter()
            .rev()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(out)
    }
}

#[async_trait]
impl StreakRepository for InMemoryRepository {
    async fn record_study_day(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        activity: StudyActivity,
    ) -> Result<StudyDay, StorageError> {
        let mut guard = self.study_days.lock().map_err(poisoned)?;
        if let Some(day) = guard
            .iter_mut()
            .find(|d| &d.user_id == user_id && d.date == date)
        {
            day.record(activity);
            return Ok(day.clone());
        }
        let mut day = StudyDay::new(user_id.clone(), date);
        day.record(activity);
        guard.push(day.clone());
        Ok(day)
    }

    async fn list_study_days(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<StudyDay>, StorageError> {
        let guard = self.study_days.lock().map_err(poisoned)?;
        let mut out: Vec<StudyDay> = guard
            .iter()
            .filter(|d| &d.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }
}

#[async_trait]
impl BookmarkRepository for InMemoryRepository {
    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Result<(), StorageError> {
        let mut guard = self.bookmarks.lock().map_err(poisoned)?;
        if let Some(existing) = guard
            .iter_mut()
            .find(|b| b.user_id == bookmark.user_id && b.lesson_id == bookmark.lesson_id)
        {
            existing.notes.clone_from(&bookmark.notes);
            return Ok(());
        }
        guard.push(bookmark.clone());
        Ok(())
    }

    async fn remove_bookmark(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> Result<bool, StorageError> {
        let mut guard = self.bookmarks.lock().map_err(poisoned)?;
        let before = guard.len();
        guard.retain(|b| !(&b.user_id == user_id && &b.lesson_id == lesson_id));
        Ok(guard.len() != before)
    }

    async fn list_bookmarks(&self, user_id: &UserId) -> Result<Vec<Bookmark>, StorageError> {
        let guard = self.bookmarks.lock().map_err(poisoned)?;
        let mut out: Vec<Bookmark> = guard
            .iter()
            .rev()
            .filter(|b| &b.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionSource>,
    pub content: Arc<dyn ContentRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub certificates: Arc<dyn CertificateRepository>,
    pub achievements: Arc<dyn AchievementRepository>,
    pub streaks: Arc<dyn StreakRepository>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    pub(crate) fn from_repository<R>(repo: R) -> Self
    where
        R: QuestionSource
            + ContentRepository
            + EnrollmentRepository
            + AttemptRepository
            + ProgressRepository
            + CertificateRepository
            + AchievementRepository
            + StreakRepository
            + BookmarkRepository
            + Clone
            + 'static,
    {
        Self {
            questions: Arc::new(repo.clone()),
            content: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            attempts: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            certificates: Arc::new(repo.clone()),
            achievements: Arc::new(repo.clone()),
            streaks: Arc::new(repo.clone()),
            bookmarks: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{
        AchievementKind, EnrollmentId, LessonSummary, OptionLetter, QuestionDraft, QuestionId,
        QuestionKind, QuestionOutcome, QuizContent, QuizId,
    };
    use quiz_core::time::fixed_now;

    fn module(id: &str, lessons: u32) -> ModuleContent {
        ModuleContent {
            module_id: ModuleId::new(id),
            lessons: (1..=lessons)
                .map(|n| LessonSummary {
                    id: LessonId::new(format!("{id}-l{n}")),
                    number: n,
                    title: format!("Lesson {n}"),
                    duration: None,
                })
                .collect(),
            quiz: QuizContent {
                title: None,
                passing_score: None,
                questions: vec![QuestionDraft {
                    id: "q1".into(),
                    kind: QuestionKind::MultipleChoice,
                    prompt: "Prompt".into(),
                    options: vec!["A) a".into(), "B) b".into()],
                    correct_answer: "A".into(),
                    explanation: String::new(),
                }],
            },
        }
    }

    fn attempt(user: &str, minutes_ago: i64) -> AttemptDetails {
        AttemptDetails {
            attempt: AttemptRecord {
                id: AttemptId::generate(),
                enrollment_id: EnrollmentId::generate(),
                user_id: UserId::new(user),
                course_id: CourseId::new("ftce"),
                module_id: ModuleId::new("m1"),
                quiz_id: QuizId::new("m1-quiz"),
                score_percent: 100.0,
                total_questions: 1,
                correct_answers: 1,
                time_taken_minutes: 2,
                passed: true,
                attempted_at: fixed_now() - Duration::minutes(minutes_ago),
            },
            answers: vec![QuestionOutcome {
                question_id: QuestionId::new("q1"),
                selected: Some(OptionLetter::new("A")),
                correct_answer: OptionLetter::new("A"),
                is_correct: true,
            }],
        }
    }

    #[tokio::test]
    async fn loads_quiz_from_stored_module() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new("ftce");
        repo.upsert_module(&course, &module("m1", 3)).await.unwrap();

        let quiz = repo.load_quiz(&course, &ModuleId::new("m1")).await.unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(repo.count_lessons(&course, None).await.unwrap(), 3);

        let missing = repo.load_quiz(&course, &ModuleId::new("m2")).await;
        assert!(matches!(missing, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn enrollment_is_unique_per_course() {
        let repo = InMemoryRepository::new();
        let e = Enrollment::new(UserId::new("u1"), "FL", "ftce", "ftce", fixed_now()).unwrap();
        repo.insert_enrollment(&e).await.unwrap();
        let dup = Enrollment::new(UserId::new("u1"), "FL", "ftce", "ftce", fixed_now()).unwrap();
        assert!(matches!(
            repo.insert_enrollment(&dup).await,
            Err(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn attempts_list_newest_first() {
        let repo = InMemoryRepository::new();
        let older = attempt("u1", 10);
        let newer = attempt("u1", 1);
        repo.append_attempt(&older).await.unwrap();
        repo.append_attempt(&newer).await.unwrap();
        repo.append_attempt(&attempt("u2", 0)).await.unwrap();

        let list = repo
            .list_attempts(&UserId::new("u1"), &CourseId::new("ftce"), 10)
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, newer.attempt.id);

        let fetched = repo.get_attempt(older.attempt.id).await.unwrap();
        assert_eq!(fetched.answers.len(), 1);
    }

    #[tokio::test]
    async fn lesson_progress_upserts_per_lesson() {
        let repo = InMemoryRepository::new();
        let mut p = LessonProgress {
            user_id: UserId::new("u1"),
            enrollment_id: EnrollmentId::generate(),
            course_id: CourseId::new("ftce"),
            module_id: ModuleId::new("m1"),
            lesson_id: LessonId::new("l1"),
            completed_at: fixed_now(),
            time_spent_minutes: 5,
        };
        repo.upsert_lesson_progress(&p).await.unwrap();
        p.time_spent_minutes = 9;
        repo.upsert_lesson_progress(&p).await.unwrap();

        let rows = repo
            .list_lesson_progress(&UserId::new("u1"), &CourseId::new("ftce"), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time_spent_minutes, 9);
    }

    #[tokio::test]
    async fn quiz_modules_skip_empty_quizzes() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new("ftce");
        repo.upsert_module(&course, &module("m2", 1)).await.unwrap();
        repo.upsert_module(&course, &module("m1", 1)).await.unwrap();
        let mut empty = module("m3", 1);
        empty.quiz.questions.clear();
        repo.upsert_module(&course, &empty).await.unwrap();

        let modules = repo.list_quiz_modules(&course).await.unwrap();
        assert_eq!(modules, vec![ModuleId::new("m1"), ModuleId::new("m2")]);
    }

    #[tokio::test]
    async fn certificates_are_unique_per_course() {
        let repo = InMemoryRepository::new();
        let e = Enrollment::new(UserId::new("u1"), "FL", "ftce", "ftce", fixed_now()).unwrap();
        let first = Certificate::issue(&e, "FTCE", fixed_now()).unwrap();
        repo.insert_certificate(&first).await.unwrap();

        let again = Certificate::issue(&e, "FTCE", fixed_now()).unwrap();
        assert!(matches!(
            repo.insert_certificate(&again).await,
            Err(StorageError::Conflict)
        ));
        let found = repo
            .find_certificate(&UserId::new("u1"), &CourseId::new("ftce"))
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.number), Some(first.number));
    }

    #[tokio::test]
    async fn achievements_are_granted_once() {
        let repo = InMemoryRepository::new();
        let earned = Achievement::new(UserId::new("u1"), AchievementKind::FirstLesson, fixed_now());
        assert!(repo.grant_achievement(&earned).await.unwrap());
        assert!(!repo.grant_achievement(&earned).await.unwrap());
        assert_eq!(repo.list_achievements(&UserId::new("u1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn study_days_accumulate_and_list_newest_first() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        let today = fixed_now().date_naive();
        let yesterday = today.pred_opt().unwrap();

        repo.record_study_day(&user, yesterday, StudyActivity::lesson(5))
            .await
            .unwrap();
        repo.record_study_day(&user, today, StudyActivity::lesson(10))
            .await
            .unwrap();
        let day = repo
            .record_study_day(&user, today, StudyActivity::quiz(3))
            .await
            .unwrap();
        assert_eq!((day.lessons_completed, day.quizzes_taken, day.minutes_studied), (1, 1, 13));

        let days = repo.list_study_days(&user, 30).await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, today);
        assert_eq!(repo.list_study_days(&user, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bookmarks_replace_notes_and_remove() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        let mark = |notes| {
            Bookmark::new(
                user.clone(),
                CourseId::new("ftce"),
                ModuleId::new("m1"),
                LessonId::new("l1"),
                notes,
                fixed_now(),
            )
        };
        repo.upsert_bookmark(&mark(Some("first"))).await.unwrap();
        repo.upsert_bookmark(&mark(Some("second"))).await.unwrap();

        let list = repo.list_bookmarks(&user).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].notes.as_deref(), Some("second"));

        assert!(repo.remove_bookmark(&user, &LessonId::new("l1")).await.unwrap());
        assert!(!repo.remove_bookmark(&user, &LessonId::new("l1")).await.unwrap());
    }
}
