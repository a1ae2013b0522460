mod activity_vm;
mod bookmark_vm;
mod certificate_vm;
mod history_vm;
mod quiz_vm;
mod results_vm;
mod time_fmt;

pub use activity_vm::{AchievementVm, StreakVm, StudyDayVm, map_achievements};
pub use bookmark_vm::{BookmarkVm, map_bookmarks};
pub use certificate_vm::CertificateVm;
pub use history_vm::{AttemptCardVm, map_attempt_cards};
pub use quiz_vm::{
    ExplanationVm, OptionVm, QuizScreenVm, QuizVm, QuizVmOutcome, progress_percent, start_quiz,
};
pub use results_vm::{OutcomeVm, ResultsVm, persistence_notice};
pub use time_fmt::{format_date, format_datetime, format_elapsed, format_minutes};
