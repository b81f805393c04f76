use quiz_core::model::{AppSettings, Country, Language, Theme, User, UserId};
use quiz_core::time::fixed_now;
use storage::repository::{
    AppSettingsRepository, CurrentUserRepository, KeyValueStore, Storage, StorageError,
    UserRecord, UserRepository,
};
use storage::sqlite::SqliteRepository;

fn build_user(id: u64, name: &str) -> User {
    User::new(UserId::new(id), name, Country::new("AT").unwrap(), fixed_now()).unwrap()
}

#[tokio::test]
async fn sqlite_kv_upserts_and_removes() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Running twice must be a no-op.
    repo.migrate().await.expect("migrate again");

    assert_eq!(repo.get("language").await.unwrap(), None);
    repo.set("language", "\"de\"").await.unwrap();
    repo.set("language", "\"es\"").await.unwrap();
    assert_eq!(
        repo.get("language").await.unwrap().as_deref(),
        Some("\"es\"")
    );

    repo.remove("language").await.unwrap();
    assert_eq!(repo.get("language").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_storage_persists_users_and_session() {
    let storage = Storage::sqlite("sqlite:file:memdb_users?mode=memory&cache=shared")
        .await
        .expect("storage");

    let mut ana = build_user(1, "ana");
    storage
        .users
        .insert_user(UserRecord::new(&ana, "$2b$04$hash"))
        .await
        .unwrap();
    assert!(matches!(
        storage
            .users
            .insert_user(UserRecord::new(&build_user(2, "ana"), "x"))
            .await,
        Err(StorageError::Conflict)
    ));

    ana.add_points(190);
    storage
        .users
        .update_user(UserRecord::new(&ana, "$2b$04$hash"))
        .await
        .unwrap();
    storage.current_user.set_current_user(&ana).await.unwrap();

    let found = storage.users.find_by_username("ana").await.unwrap().unwrap();
    assert_eq!(found.profile.total_points, 190);
    assert_eq!(found.password_hash, "$2b$04$hash");
    assert_eq!(
        storage.current_user.current_user().await.unwrap(),
        Some(ana)
    );
    assert!(storage.users.find_by_username("ANA").await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_storage_persists_settings() {
    let storage = Storage::sqlite("sqlite:file:memdb_settings?mode=memory&cache=shared")
        .await
        .expect("storage");
    assert_eq!(
        storage.app_settings.get_settings().await.unwrap(),
        AppSettings::default()
    );
    let settings = AppSettings::new(Language::Es, Theme::Dark);
    storage.app_settings.save_settings(&settings).await.unwrap();
    assert_eq!(storage.app_settings.get_settings().await.unwrap(), settings);
}
