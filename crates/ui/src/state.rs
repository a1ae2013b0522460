use quiz_core::session::QuizSessionError;
use services::QuizServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// Submit was pressed with questions still unanswered.
    Incomplete { unanswered: usize },
    /// An answer referred to a question or option that is not on screen.
    InvalidChoice,
    QuizNotFound,
    AlreadySubmitted,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ViewError::Incomplete { unanswered: 1 } => {
                "Please answer the remaining question before submitting.".into()
            }
            ViewError::Incomplete { unanswered } => {
                format!("Please answer the remaining {unanswered} questions before submitting.")
            }
            ViewError::InvalidChoice => "That is not one of the available options.".into(),
            ViewError::QuizNotFound => "This module has no quiz yet.".into(),
            ViewError::AlreadySubmitted => "This quiz has already been submitted.".into(),
            ViewError::Unknown => "Something went wrong. Please try again.".into(),
        }
    }
}

impl From<&QuizSessionError> for ViewError {
    fn from(err: &QuizSessionError) -> Self {
        match err {
            QuizSessionError::Validation { missing, .. } => ViewError::Incomplete {
                unanswered: missing.len(),
            },
            QuizSessionError::Completed => ViewError::AlreadySubmitted,
            e if e.is_out_of_range() => ViewError::InvalidChoice,
            _ => ViewError::Unknown,
        }
    }
}

impl From<QuizServiceError> for ViewError {
    fn from(err: QuizServiceError) -> Self {
        match &err {
            QuizServiceError::Session(session) => ViewError::from(session),
            e if e.is_not_found() => ViewError::QuizNotFound,
            _ => ViewError::Unknown,
        }
    }
}
