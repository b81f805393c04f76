mod app_settings;
mod ids;
mod leaderboard;
mod level;
mod question;
mod quiz_settings;
mod result;
mod user;

pub use ids::{AttemptId, ParseIdError, QuestionId, UserId};

pub use app_settings::{AppSettings, AppSettingsError, Language, Theme};
pub use leaderboard::{LeaderboardEntry, rank_users};
pub use level::{Level, LevelError, LevelInfo, LevelTable, MilestoneProgress};
pub use question::{Question, QuestionDraft, QuestionError, QuestionKind};
pub use quiz_settings::{QuizSettings, QuizSettingsError};
pub use result::GameResult;
pub use user::{Country, User, UserError};
