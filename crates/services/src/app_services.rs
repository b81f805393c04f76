use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::app_settings_service::AppSettingsService;
use crate::auth_service::AuthService;
use crate::error::AppServicesError;
use crate::leaderboard_service::LeaderboardService;
use crate::question_bank::QuestionSource;
use crate::sessions::ExerciseService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<AuthService>,
    exercises: Arc<ExerciseService>,
    leaderboard: Arc<LeaderboardService>,
    app_settings: Arc<AppSettingsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, questions))
    }

    /// Build services over an already opened storage.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.current_user),
        ));
        let exercises = Arc::new(ExerciseService::new(
            clock,
            questions,
            Arc::clone(&storage.users),
            Arc::clone(&storage.current_user),
        ));
        let leaderboard = Arc::new(LeaderboardService::new(Arc::clone(&storage.users)));
        let app_settings = Arc::new(AppSettingsService::new(Arc::clone(&storage.app_settings)));

        Self {
            auth,
            exercises,
            leaderboard,
            app_settings,
        }
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn exercises(&self) -> Arc<ExerciseService> {
        Arc::clone(&self.exercises)
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }

    #[must_use]
    pub fn app_settings(&self) -> Arc<AppSettingsService> {
        Arc::clone(&self.app_settings)
    }
}
