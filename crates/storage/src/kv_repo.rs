use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{AppSettings, Language, Theme, User, UserId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::{
    AppSettingsRepository, CurrentUserRepository, KeyValueStore, ProfileRecord, StorageError,
    UserRecord, UserRepository, ser,
};

pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "currentUser";
pub const LANGUAGE_KEY: &str = "language";
pub const THEME_KEY: &str = "theme";

/// Typed repositories stored as JSON blobs in a [`KeyValueStore`].
///
/// The user list is rewritten as a whole on every change.
#[derive(Clone)]
pub struct KvRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(ser),
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(ser)?;
        self.store.set(key, &raw).await
    }

    async fn load_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(self.read_json(USERS_KEY).await?.unwrap_or_default())
    }
}

#[async_trait]
impl UserRepository for KvRepository {
    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        self.load_users().await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let users = self.load_users().await?;
        Ok(users.into_iter().find(|u| u.username() == username))
    }

    async fn get_user(&self, id: UserId) -> Result<UserRecord, StorageError> {
        let users = self.load_users().await?;
        users
            .into_iter()
            .find(|u| u.id() == id)
            .ok_or(StorageError::NotFound)
    }

    async fn insert_user(&self, record: UserRecord) -> Result<(), StorageError> {
        let mut users = self.load_users().await?;
        if users
            .iter()
            .any(|u| u.id() == record.id() || u.username() == record.username())
        {
            return Err(StorageError::Conflict);
        }
        users.push(record);
        self.write_json(USERS_KEY, &users).await
    }

    async fn update_user(&self, record: UserRecord) -> Result<(), StorageError> {
        let mut users = self.load_users().await?;
        let slot = users
            .iter_mut()
            .find(|u| u.id() == record.id())
            .ok_or(StorageError::NotFound)?;
        *slot = record;
        self.write_json(USERS_KEY, &users).await
    }
}

#[async_trait]
impl CurrentUserRepository for KvRepository {
    async fn current_user(&self) -> Result<Option<User>, StorageError> {
        let record: Option<ProfileRecord> = self.read_json(CURRENT_USER_KEY).await?;
        record.map(ProfileRecord::into_user).transpose()
    }

    async fn set_current_user(&self, user: &User) -> Result<(), StorageError> {
        self.write_json(CURRENT_USER_KEY, &ProfileRecord::from_user(user))
            .await
    }

    async fn clear_current_user(&self) -> Result<(), StorageError> {
        self.store.remove(CURRENT_USER_KEY).await
    }
}

#[async_trait]
impl AppSettingsRepository for KvRepository {
    async fn get_settings(&self) -> Result<AppSettings, StorageError> {
        let language: Option<Language> = self.read_json(LANGUAGE_KEY).await?;
        let theme: Option<Theme> = self.read_json(THEME_KEY).await?;
        Ok(AppSettings::new(
            language.unwrap_or_default(),
            theme.unwrap_or_default(),
        ))
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        self.write_json(LANGUAGE_KEY, &settings.language()).await?;
        self.write_json(THEME_KEY, &settings.theme()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use quiz_core::model::Country;
    use quiz_core::time::fixed_now;

    fn repo() -> (KvRepository, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (KvRepository::new(store.clone()), store)
    }

    fn record(id: u64, name: &str) -> UserRecord {
        let user = User::new(UserId::new(id), name, Country::new("ES").unwrap(), fixed_now())
            .unwrap();
        UserRecord::new(&user, format!("hash-{id}"))
    }

    #[tokio::test]
    async fn users_are_listed_in_insertion_order() {
        let (repo, _) = repo();
        assert!(repo.list_users().await.unwrap().is_empty());
        repo.insert_user(record(2, "bea")).await.unwrap();
        repo.insert_user(record(1, "ana")).await.unwrap();
        let names: Vec<_> = repo
            .list_users()
            .await
            .unwrap()
            .iter()
            .map(|u| u.username().to_owned())
            .collect();
        assert_eq!(names, ["bea", "ana"]);
    }

    #[tokio::test]
    async fn duplicate_username_or_id_conflicts() {
        let (repo, _) = repo();
        repo.insert_user(record(1, "ana")).await.unwrap();
        assert!(matches!(
            repo.insert_user(record(2, "ana")).await,
            Err(StorageError::Conflict)
        ));
        assert!(matches!(
            repo.insert_user(record(1, "eva")).await,
            Err(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn update_replaces_by_id() {
        let (repo, _) = repo();
        repo.insert_user(record(1, "ana")).await.unwrap();
        let mut updated = record(1, "ana");
        updated.profile.total_points = 90;
        repo.update_user(updated).await.unwrap();
        assert_eq!(
            repo.get_user(UserId::new(1)).await.unwrap().profile.total_points,
            90
        );
        assert!(matches!(
            repo.update_user(record(5, "zoe")).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn current_user_blob_has_no_password() {
        let (repo, store) = repo();
        let user = record(1, "ana").into_user().unwrap();
        repo.set_current_user(&user).await.unwrap();

        let raw = store.get(CURRENT_USER_KEY).await.unwrap().unwrap();
        assert!(!raw.contains("password"));
        assert_eq!(repo.current_user().await.unwrap(), Some(user));

        repo.clear_current_user().await.unwrap();
        assert_eq!(repo.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn settings_default_until_saved() {
        let (repo, store) = repo();
        assert_eq!(repo.get_settings().await.unwrap(), AppSettings::default());

        let settings = AppSettings::new(Language::Es, Theme::Dark);
        repo.save_settings(&settings).await.unwrap();
        assert_eq!(repo.get_settings().await.unwrap(), settings);
        assert_eq!(
            store.get(LANGUAGE_KEY).await.unwrap().as_deref(),
            Some("\"es\"")
        );
    }

    #[tokio::test]
    async fn corrupt_blob_is_a_serialization_error() {
        let (repo, store) = repo();
        store.set(USERS_KEY, "not json").await.unwrap();
        assert!(matches!(
            repo.list_users().await,
            Err(StorageError::Serialization(_))
        ));
    }
}
