#![forbid(unsafe_code)]

pub mod activity_service;
pub mod app_services;
pub mod bookmark_service;
pub mod certificate_service;
pub mod config;
pub mod enrollment_service;
pub mod error;
pub mod progress_service;
pub mod quiz;

pub use quiz_core::Clock;

pub use activity_service::{ActivityService, StudyStreak};
pub use app_services::AppServices;
pub use bookmark_service::BookmarkService;
pub use certificate_service::CertificateService;
pub use config::{GatewayConfig, QuizConfig};
pub use enrollment_service::{EnrollmentOutcome, EnrollmentService};
pub use error::{
    ActivityError, AppServicesError, BookmarkError, CertificateServiceError, ConfigError,
    EnrollmentServiceError, PersistenceError, ProgressError, QuizServiceError, SubmissionError,
};
pub use progress_service::{ProgressService, ProgressSummary};
pub use quiz::{
    AttemptHistoryService, HttpPersistenceGateway, LocalGateway, PersistenceGateway,
    PersistenceOutcome, PersistenceTask, QuizLoopService, QuizStep, QuizTimer, SubmissionService,
    SubmitRequest, SubmitResponse,
};
