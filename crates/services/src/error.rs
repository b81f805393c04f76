//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{Level, QuestionError, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("username, password and country are required")]
    MissingFields,
    #[error("username is already taken")]
    AlreadyExists,
    #[error("wrong username or password")]
    WrongCredentials,
    #[error("no user is signed in")]
    NotSignedIn,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading a question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("duplicate question id {0}")]
    DuplicateId(String),
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for attempt")]
    Empty,
    #[error("attempt is not completed yet")]
    NotCompleted,
    #[error("no user is signed in")]
    NotSignedIn,
    #[error("level {level} requires {required} points")]
    LevelLocked { level: Level, required: u32 },
    #[error("accuracy is below the pass mark")]
    CannotAdvance,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AppSettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppSettingsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    QuestionBank(#[from] QuestionBankError),
}
