use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::activity_service::ActivityService;
use crate::bookmark_service::BookmarkService;
use crate::certificate_service::CertificateService;
use crate::config::QuizConfig;
use crate::enrollment_service::EnrollmentService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::quiz::{
    AttemptHistoryService, HttpPersistenceGateway, LocalGateway, PersistenceGateway,
    QuizLoopService, SubmissionService,
};

/// Assembles app-facing quiz services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
    submissions: Arc<SubmissionService>,
    history: Arc<AttemptHistoryService>,
    enrollments: Arc<EnrollmentService>,
    progress: Arc<ProgressService>,
    activity: Arc<ActivityService>,
    certificates: Arc<CertificateService>,
    bookmarks: Arc<BookmarkService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage at `config.db_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or gateway setup fails.
    pub async fn new_sqlite(config: &QuizConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.db_url).await?;
        Self::from_storage(&storage, config, clock)
    }

    /// Build services over an existing storage aggregate.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Persistence` if the HTTP gateway cannot be built.
    pub fn from_storage(
        storage: &Storage,
        config: &QuizConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let activity = Arc::new(ActivityService::new(
            clock,
            Arc::clone(&storage.streaks),
            Arc::clone(&storage.achievements),
        ));
        let submissions = Arc::new(
            SubmissionService::new(
                clock,
                Arc::clone(&storage.enrollments),
                Arc::clone(&storage.attempts),
            )
            .with_activity(Arc::clone(&activity)),
        );

        let gateway: Arc<dyn PersistenceGateway> = match &config.gateway {
            Some(gateway) => {
                info!(url = %gateway.submit_url(), "recording attempts over HTTP");
                Arc::new(HttpPersistenceGateway::new(gateway.clone())?)
            }
            None => {
                info!(db = %config.db_url, "recording attempts locally");
                Arc::new(LocalGateway::new(Arc::clone(&submissions)))
            }
        };

        let quiz_loop = Arc::new(
            QuizLoopService::new(clock, Arc::clone(&storage.questions), gateway)
                .with_passing_threshold(config.passing_threshold),
        );
        let history = Arc::new(AttemptHistoryService::new(Arc::clone(&storage.attempts)));
        let enrollments = Arc::new(EnrollmentService::new(
            clock,
            Arc::clone(&storage.enrollments),
        ));
        let progress = Arc::new(
            ProgressService::new(
                clock,
                Arc::clone(&storage.enrollments),
                Arc::clone(&storage.progress),
                Arc::clone(&storage.content),
            )
            .with_activity(Arc::clone(&activity)),
        );
        let certificates = Arc::new(
            CertificateService::new(
                clock,
                Arc::clone(&storage.enrollments),
                Arc::clone(&storage.content),
                Arc::clone(&storage.progress),
                Arc::clone(&storage.attempts),
                Arc::clone(&storage.certificates),
            )
            .with_activity(Arc::clone(&activity)),
        );
        let bookmarks = Arc::new(BookmarkService::new(clock, Arc::clone(&storage.bookmarks)));

        Ok(Self {
            quiz_loop,
            submissions,
            history,
            enrollments,
            progress,
            activity,
            certificates,
            bookmarks,
        })
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn submissions(&self) -> Arc<SubmissionService> {
        Arc::clone(&self.submissions)
    }

    #[must_use]
    pub fn history(&self) -> Arc<AttemptHistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn activity(&self) -> Arc<ActivityService> {
        Arc::clone(&self.activity)
    }

    #[must_use]
    pub fn certificates(&self) -> Arc<CertificateService> {
        Arc::clone(&self.certificates)
    }

    #[must_use]
    pub fn bookmarks(&self) -> Arc<BookmarkService> {
        Arc::clone(&self.bookmarks)
    }
}
