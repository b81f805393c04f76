use std::sync::Arc;

use quiz_core::model::{Country, Level, User, UserId};
use storage::repository::{CurrentUserRepository, StorageError, UserRecord, UserRepository};
use tracing::{info, warn};

use crate::Clock;
use crate::error::AuthError;

/// Shortest password accepted by `change_password`.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Local accounts: registration, sign-in and the persisted current user.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    current_user: Arc<dyn CurrentUserRepository>,
    hash_cost: u32,
}

impl AuthService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        current_user: Arc<dyn CurrentUserRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            current_user,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor (tests use the minimum).
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is blank,
    /// `AuthError::AlreadyExists` if the username is taken, or storage/hash errors.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        country: &str,
    ) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() || country.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        let now = self.clock.now();
        let id = self.next_user_id(now.timestamp_millis()).await?;
        let user = User::new(id, username, Country::new(country)?, now)?;
        let password_hash = bcrypt::hash(password, self.hash_cost)?;

        match self.users.insert_user(UserRecord::new(&user, password_hash)).await {
            Ok(()) => {}
            Err(StorageError::Conflict) => return Err(AuthError::AlreadyExists),
            Err(err) => return Err(err.into()),
        }
        self.current_user.set_current_user(&user).await?;

        info!(user_id = %user.id(), username = user.username(), "registered user");
        Ok(user)
    }

    /// Check credentials and make the user current.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongCredentials` for an unknown user or bad password.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some(record) = self.users.find_by_username(username.trim()).await? else {
            warn!(username, "login rejected: unknown user");
            return Err(AuthError::WrongCredentials);
        };
        if !bcrypt::verify(password, &record.password_hash)? {
            warn!(username, "login rejected: bad password");
            return Err(AuthError::WrongCredentials);
        }

        let user = record.into_user()?;
        self.current_user.set_current_user(&user).await?;
        info!(user_id = %user.id(), "user signed in");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the current user cannot be cleared.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.current_user.clear_current_user().await?;
        info!("user signed out");
        Ok(())
    }

    /// The user restored from the last session, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the stored user cannot be read.
    pub async fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.current_user.current_user().await?)
    }

    /// Replace the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs,
    /// `AuthError::PasswordTooShort` below six characters, or
    /// `AuthError::NotSignedIn` without a current user.
    pub async fn change_password(&self, new_password: &str, confirm: &str) -> Result<(), AuthError> {
        if new_password != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        let user = self
            .current_user
            .current_user()
            .await?
            .ok_or(AuthError::NotSignedIn)?;

        let mut record = self.users.get_user(user.id()).await?;
        record.password_hash = bcrypt::hash(new_password, self.hash_cost)?;
        self.users.update_user(record).await?;
        info!(user_id = %user.id(), "password changed");
        Ok(())
    }

    async fn next_user_id(&self, millis: i64) -> Result<UserId, AuthError> {
        let taken: Vec<u64> = self
            .users
            .list_users()
            .await?
            .iter()
            .map(|u| u.id().value())
            .collect();
        let mut candidate = u64::try_from(millis).unwrap_or(0);
        while taken.contains(&candidate) {
            candidate = candidate.saturating_add(1);
        }
        Ok(UserId::new(candidate))
    }
}

/// Apply `change` to the stored user and mirror it into the current-user slot
/// when that user is signed in.
pub(crate) async fn update_stored_user(
    users: &dyn UserRepository,
    current_user: &dyn CurrentUserRepository,
    id: UserId,
    change: impl FnOnce(&mut User) + Send,
) -> Result<User, StorageError> {
    let record = users.get_user(id).await?;
    let password_hash = record.password_hash.clone();
    let mut user = record.into_user()?;
    change(&mut user);
    users
        .update_user(UserRecord::new(&user, password_hash))
        .await?;

    if current_user
        .current_user()
        .await?
        .is_some_and(|current| current.id() == id)
    {
        current_user.set_current_user(&user).await?;
    }
    Ok(user)
}

/// Raise a stored user's level, never lowering it.
pub(crate) async fn raise_stored_level(
    users: &dyn UserRepository,
    current_user: &dyn CurrentUserRepository,
    id: UserId,
    level: Level,
) -> Result<User, StorageError> {
    update_stored_user(users, current_user, id, |u| u.reach_level(level)).await
}
