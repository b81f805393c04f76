use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{AppSettings, Country, Level, User, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::kv_repo::KvRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Public part of a persisted user, as kept under the current-user key.
///
/// Mirrors the domain `User` so the JSON layout stays independent of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: u64,
    pub username: String,
    pub country: String,
    pub total_points: u32,
    pub current_level: u8,
    pub created_at: DateTime<Utc>,
}

impl ProfileRecord {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id().value(),
            username: user.username().to_owned(),
            country: user.country().code().to_owned(),
            total_points: user.total_points(),
            current_level: user.current_level().value(),
            created_at: user.created_at(),
        }
    }

    /// Convert the record back into a domain `User`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a stored field no longer passes
    /// domain validation.
    pub fn into_user(self) -> Result<User, StorageError> {
        let country = Country::new(&self.country).map_err(ser)?;
        let level = Level::new(self.current_level).map_err(ser)?;
        User::from_persisted(
            UserId::new(self.id),
            self.username,
            country,
            self.total_points,
            level,
            self.created_at,
        )
        .map_err(ser)
    }
}

/// A user entry in the persisted user list, credentials included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(flatten)]
    pub profile: ProfileRecord,
    pub password_hash: String,
}

impl UserRecord {
    #[must_use]
    pub fn new(user: &User, password_hash: impl Into<String>) -> Self {
        Self {
            profile: ProfileRecord::from_user(user),
            password_hash: password_hash.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        UserId::new(self.profile.id)
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.profile.username
    }

    /// Convert into a domain `User`, dropping the credentials.
    ///
    /// # Errors
    ///
    /// See [`ProfileRecord::into_user`].
    pub fn into_user(self) -> Result<User, StorageError> {
        self.profile.into_user()
    }
}

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Raw string blobs by key. Values are opaque to the store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be reached.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be reached.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Registered users with their credentials.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users in registration order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be read or decoded.
    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError>;

    /// Look a user up by exact username.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be read or decoded.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Fetch a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_user(&self, id: UserId) -> Result<UserRecord, StorageError>;

    /// Append a new user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the ID or username is already taken.
    async fn insert_user(&self, record: UserRecord) -> Result<(), StorageError>;

    /// Replace an existing user, matched by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no user has the record's ID.
    async fn update_user(&self, record: UserRecord) -> Result<(), StorageError>;
}

/// The signed-in user, kept so a restart resumes the same session.
#[async_trait]
pub trait CurrentUserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the stored value cannot be read or decoded.
    async fn current_user(&self) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set_current_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be removed.
    async fn clear_current_user(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait AppSettingsRepository: Send + Sync {
    /// Stored preferences, defaults for anything never saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if stored values cannot be read or decoded.
    async fn get_settings(&self) -> Result<AppSettings, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if settings cannot be stored.
    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the typed repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub current_user: Arc<dyn CurrentUserRepository>,
    pub app_settings: Arc<dyn AppSettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }

    /// Build typed repositories over any key-value backend.
    #[must_use]
    pub fn from_store(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = KvRepository::new(store);
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let current_user: Arc<dyn CurrentUserRepository> = Arc::new(repo.clone());
        let app_settings: Arc<dyn AppSettingsRepository> = Arc::new(repo);
        Self {
            users,
            current_user,
            app_settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn build_user(id: u64, name: &str) -> User {
        User::new(UserId::new(id), name, Country::new("de").unwrap(), fixed_now()).unwrap()
    }

    #[tokio::test]
    async fn in_memory_store_sets_and_removes() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[test]
    fn user_record_uses_camel_case_json() {
        let mut user = build_user(7, "ana");
        user.add_points(120);
        let record = UserRecord::new(&user, "hash");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["username"], "ana");
        assert_eq!(json["totalPoints"], 120);
        assert_eq!(json["currentLevel"], 1);
        assert_eq!(json["passwordHash"], "hash");
        assert_eq!(json["country"], "DE");
    }

    #[test]
    fn profile_round_trips_into_user() {
        let mut user = build_user(3, "luis");
        user.add_points(600);
        user.reach_level(Level::new(2).unwrap());
        let restored = ProfileRecord::from_user(&user).into_user().unwrap();
        assert_eq!(restored, user);
    }

    #[test]
    fn invalid_persisted_level_is_a_serialization_error() {
        let mut record = ProfileRecord::from_user(&build_user(1, "ana"));
        record.current_level = 9;
        assert!(matches!(
            record.into_user(),
            Err(StorageError::Serialization(_))
        ));
    }
}
