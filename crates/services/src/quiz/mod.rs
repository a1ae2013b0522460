pub mod gateway;
pub mod history;
pub mod persist;
pub mod submission;
pub mod timer;
pub mod workflow;

pub use gateway::{
    HttpPersistenceGateway, LocalGateway, PersistenceGateway, SubmitRequest, SubmitResponse,
    SubmittedAnswer,
};
pub use history::AttemptHistoryService;
pub use persist::{PersistenceOutcome, PersistenceTask};
pub use submission::SubmissionService;
pub use timer::QuizTimer;
pub use workflow::{QuizLoopService, QuizStep};
