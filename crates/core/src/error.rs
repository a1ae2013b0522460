use thiserror::Error;

use crate::model::{CertificateError, EnrollmentError, QuestionError, QuizError};
use crate::session::QuizSessionError;

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Session(#[from] QuizSessionError),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Certificate(#[from] CertificateError),
}
