use thiserror::Error;

use crate::model::{AppSettingsError, LevelError, QuestionError, QuizSettingsError, UserError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    QuizSettings(#[from] QuizSettingsError),
    #[error(transparent)]
    AppSettings(#[from] AppSettingsError),
}
