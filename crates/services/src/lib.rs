#![forbid(unsafe_code)]

pub mod app_services;
pub mod app_settings_service;
pub mod auth_service;
pub mod error;
pub mod leaderboard_service;
pub mod question_bank;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use app_settings_service::AppSettingsService;
pub use auth_service::AuthService;
pub use error::{
    AppServicesError, AppSettingsServiceError, AuthError, LeaderboardError, QuestionBankError,
    SessionError,
};
pub use leaderboard_service::LeaderboardService;
pub use question_bank::{QuestionSource, StaticQuestionBank};
pub use sessions::{
    AnswerOutcome, ExerciseEvent, ExerciseRunner, ExerciseService, Phase, PlayerProgress,
    RunOutcome, SessionContext, SessionController,
};
