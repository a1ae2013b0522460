mod controller;
mod intent;

pub use controller::{Learner, QuizProgress, QuizSession, QuizSessionError};
pub use intent::{QuizEvent, QuizIntent};
