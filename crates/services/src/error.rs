//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{CertificateError, EnrollmentError, QuizError};
use quiz_core::session::QuizSessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors from recording a finished attempt. Never fatal to the local session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("attempt has no authenticated user")]
    Unauthorized,
    #[error("user is not enrolled in this course")]
    NotEnrolled,
    #[error("attempt was rejected: {0}")]
    Rejected(String),
    #[error("persistence request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("persistence request timed out")]
    Timeout,
    #[error(transparent)]
    Http(reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("persistence task did not finish: {0}")]
    Interrupted(String),
}

impl From<reqwest::Error> for PersistenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl From<SubmissionError> for PersistenceError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Unauthorized => Self::Unauthorized,
            SubmissionError::NotEnrolled => Self::NotEnrolled,
            SubmissionError::InvalidRequest(reason) => Self::Rejected(reason),
            SubmissionError::Storage(e) => Self::Storage(e),
        }
    }
}

/// Errors emitted by `SubmissionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("not enrolled in this course")]
    NotEnrolled,
    #[error("invalid submission: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Session(#[from] QuizSessionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuizServiceError {
    /// The requested quiz does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::NotFound))
    }
}

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentServiceError {
    #[error(transparent)]
    Invalid(#[from] EnrollmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("not enrolled in this course")]
    NotEnrolled,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CertificateService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateServiceError {
    #[error("not enrolled in this course")]
    NotEnrolled,
    #[error(
        "course not finished: {lessons_remaining} lessons and {quizzes_remaining} quizzes remaining"
    )]
    NotEligible {
        lessons_remaining: u32,
        quizzes_remaining: usize,
    },
    #[error(transparent)]
    Invalid(#[from] CertificateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ActivityService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ActivityError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `BookmarkService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BookmarkError {
    #[error("lesson is not bookmarked")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from reading `QuizConfig` out of the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
    #[error("invalid {var} value: {raw}")]
    Invalid { var: &'static str, raw: String },
}

/// Errors emitted while bootstrapping quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
