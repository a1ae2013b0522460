mod activity;
mod answers;
mod attempt;
mod bookmark;
mod certificate;
mod enrollment;
mod ids;
mod module;
mod question;
mod quiz;

pub use ids::{
    AttemptId, CertificateId, CourseId, EnrollmentId, ExamId, LessonId, ModuleId, ParseIdError,
    QuestionId, QuizId, StateId, UserId,
};

pub use activity::{
    Achievement, AchievementKind, HIGH_SCORE_PERCENT, STREAK_GOAL_DAYS, StudyActivity, StudyDay,
    current_streak,
};

pub use answers::AnswerRecord;
pub use attempt::{AttemptDetails, AttemptRecord, AttemptResult, QuestionOutcome, display_percent};
pub use bookmark::Bookmark;
pub use certificate::{Certificate, CertificateError, CertificateNumber, CourseCompletion};
pub use enrollment::{Enrollment, EnrollmentError, LessonProgress};
pub use module::{LessonSummary, ModuleContent, QuizContent};
pub use question::{OptionLetter, Question, QuestionDraft, QuestionError, QuestionKind};
pub use quiz::{PassingThreshold, Quiz, QuizError};
