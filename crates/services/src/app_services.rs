use std::sync::Arc;

use storage::repository::Storage;
use tracing::debug;

use crate::Clock;
use crate::curation_service::CurationService;
use crate::error::AppServicesError;
use crate::quiz_service::QuizService;
use crate::sessions::TestSessionService;
use crate::settings_service::SettingsService;
use crate::stats_service::StatsService;

/// Wires every service to one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz: Arc<QuizService>,
    sessions: Arc<TestSessionService>,
    stats: Arc<StatsService>,
    settings: Arc<SettingsService>,
    curation: Arc<CurationService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// A `seed` makes every draw reproducible.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        seed: Option<u64>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        debug!(db_url, "opened sqlite storage");
        Ok(Self::from_storage(&storage, clock, seed))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, seed: Option<u64>) -> Self {
        let mut quiz = QuizService::new(
            Arc::clone(&storage.questions),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.curation),
        );
        if let Some(seed) = seed {
            quiz = quiz.with_seed(seed);
        }
        let quiz = Arc::new(quiz);

        let sessions = Arc::new(TestSessionService::new(
            clock,
            Arc::clone(&quiz),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.test_state),
            Arc::clone(&storage.history),
            Arc::clone(&storage.curation),
            Arc::clone(&storage.settings),
        ));
        let stats = Arc::new(StatsService::new(
            Arc::clone(&storage.questions),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.history),
            Arc::clone(&storage.settings),
            Arc::clone(&storage.test_state),
        ));
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));
        let curation = Arc::new(CurationService::new(
            clock,
            Arc::clone(&quiz),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.curation),
        ));

        Self {
            quiz,
            sessions,
            stats,
            settings,
            curation,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<TestSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn curation(&self) -> Arc<CurationService> {
        Arc::clone(&self.curation)
    }
}
