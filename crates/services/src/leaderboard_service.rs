use std::sync::Arc;

use quiz_core::model::{LeaderboardEntry, User, rank_users};
use storage::repository::{StorageError, UserRecord, UserRepository};

use crate::error::LeaderboardError;

/// Number of places shown on the podium.
pub const PODIUM_SIZE: usize = 3;

/// Ranked view over all registered users.
#[derive(Clone)]
pub struct LeaderboardService {
    users: Arc<dyn UserRepository>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// All users, highest total first.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if users cannot be loaded.
    pub async fn standings(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let users = self
            .users
            .list_users()
            .await?
            .into_iter()
            .map(UserRecord::into_user)
            .collect::<Result<Vec<User>, StorageError>>()?;
        Ok(rank_users(&users))
    }

    /// The top three entries.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if users cannot be loaded.
    pub async fn podium(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut standings = self.standings().await?;
        standings.truncate(PODIUM_SIZE);
        Ok(standings)
    }
}
