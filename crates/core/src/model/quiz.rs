use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CourseId, ModuleId, QuestionId, QuizId};
use crate::model::question::{Question, QuestionDraft, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("passing threshold must be within 0..=100, got {0}")]
    InvalidThreshold(f64),

    #[error("question id {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

//
// ─── PASSING THRESHOLD ─────────────────────────────────────────────────────────
//

/// Minimum score percentage required to pass an attempt.
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PassingThreshold(f64);

impl PassingThreshold {
    pub const DEFAULT_PERCENT: f64 = 70.0;

    /// # Errors
    ///
    /// Returns `QuizError::InvalidThreshold` when `percent` is not a finite value in `0..=100`.
    pub fn new(percent: f64) -> Result<Self, QuizError> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(QuizError::InvalidThreshold(percent));
        }
        Ok(Self(percent))
    }

    #[must_use]
    pub fn percent(self) -> f64 {
        self.0
    }

    /// Whether a full-precision score clears this threshold.
    #[must_use]
    pub fn is_met_by(self, score_percent: f64) -> bool {
        score_percent >= self.0
    }
}

impl Default for PassingThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT_PERCENT)
    }
}

impl TryFrom<f64> for PassingThreshold {
    type Error = QuizError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PassingThreshold> for f64 {
    fn from(value: PassingThreshold) -> Self {
        value.0
    }
}

impl fmt::Debug for PassingThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PassingThreshold({})", self.0)
    }
}

impl fmt::Display for PassingThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// An ordered, validated set of questions attached to a course module.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    id: QuizId,
    course_id: CourseId,
    module_id: ModuleId,
    title: String,
    passing_threshold: PassingThreshold,
    questions: Vec<Question>,
}

impl Quiz {
    pub const DEFAULT_TITLE: &'static str = "Module Quiz";

    /// Build a quiz with the default id, title and threshold.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        course_id: CourseId,
        module_id: ModuleId,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        for (i, q) in questions.iter().enumerate() {
            if questions[..i].iter().any(|other| other.id() == q.id()) {
                return Err(QuizError::DuplicateQuestion(q.id().clone()));
            }
        }

        Ok(Self {
            id: QuizId::for_module(&module_id),
            course_id,
            module_id,
            title: Self::DEFAULT_TITLE.to_owned(),
            passing_threshold: PassingThreshold::default(),
            questions,
        })
    }

    /// Validate authored drafts and build a quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Question` for the first structurally incomplete draft,
    /// or `QuizError::DuplicateQuestion`.
    pub fn from_drafts(
        course_id: CourseId,
        module_id: ModuleId,
        drafts: impl IntoIterator<Item = QuestionDraft>,
    ) -> Result<Self, QuizError> {
        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(course_id, module_id, questions)
    }

    #[must_use]
    pub fn with_id(mut self, id: QuizId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_passing_threshold(mut self, threshold: PassingThreshold) -> Self {
        self.passing_threshold = threshold;
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn passing_threshold(&self) -> PassingThreshold {
        self.passing_threshold
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }
}
