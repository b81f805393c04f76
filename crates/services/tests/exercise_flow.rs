use std::sync::Arc;

use quiz_core::model::{Country, Level, User, UserId};
use quiz_core::time::{fixed_clock, fixed_now};
use services::{AppServices, PlayerProgress, SessionError, StaticQuestionBank};
use storage::repository::{Storage, UserRecord};

async fn seed_player(storage: &Storage, id: u64, name: &str, points: u32) -> User {
    let mut user =
        User::new(UserId::new(id), name, Country::new("ES").unwrap(), fixed_now()).unwrap();
    user.add_points(points);
    storage
        .users
        .insert_user(UserRecord::new(&user, "unused"))
        .await
        .unwrap();
    user
}

#[tokio::test]
async fn full_attempt_updates_leaderboard_and_progress() {
    let storage = Storage::in_memory();
    let bank = Arc::new(StaticQuestionBank::bundled().unwrap());
    let services = AppServices::from_storage(&storage, fixed_clock(), bank);

    seed_player(&storage, 1, "rival", 450).await;
    let ana = seed_player(&storage, 2, "ana", 0).await;
    storage.current_user.set_current_user(&ana).await.unwrap();

    let exercises = services.exercises();
    assert!(matches!(
        exercises.start(Level::new(2).unwrap()).await,
        Err(SessionError::LevelLocked { required: 500, .. })
    ));

    let mut attempt = exercises.start(Level::first()).await.unwrap();
    assert_eq!(attempt.questions().len(), 5);
    while !attempt.is_complete() {
        let answer = attempt.current_question().unwrap().correct_answer().to_owned();
        exercises.submit_answer(&mut attempt, &answer).await.unwrap();
        attempt.end_feedback();
        attempt.advance(exercises.now());
    }
    assert_eq!(attempt.results().len(), 5);
    assert!(attempt.can_advance());

    let board = services.leaderboard().standings().await.unwrap();
    assert_eq!(board[0].username, "ana");
    assert_eq!(board[0].total_points, 500);
    assert_eq!(board[1].username, "rival");

    let next = exercises.proceed_to_next_level(&attempt).await.unwrap().unwrap();
    assert_eq!(next.level(), Level::new(2).unwrap());

    let current = services.auth().current_user().await.unwrap().unwrap();
    let progress = PlayerProgress::for_user(&current, exercises.levels());
    assert_eq!(progress.current_level.name, "Básico");
    assert_eq!(progress.milestone.points_to_next, 1000);
    assert!(progress.milestone.percent.abs() < f64::EPSILON);
}

#[tokio::test]
async fn level_selection_respects_points_after_promotion() {
    let storage = Storage::in_memory();
    let bank = Arc::new(StaticQuestionBank::bundled().unwrap());
    let services = AppServices::from_storage(&storage, fixed_clock(), bank);
    let level3 = Level::new(3).unwrap();

    let mut promoted = seed_player(&storage, 1, "ana", 1499).await;
    promoted.reach_level(level3);
    storage
        .users
        .update_user(UserRecord::new(&promoted, "unused"))
        .await
        .unwrap();
    storage.current_user.set_current_user(&promoted).await.unwrap();

    let exercises = services.exercises();
    let progress = PlayerProgress::for_user(&promoted, exercises.levels());
    assert!(progress.unlocked.iter().all(|info| info.level != level3));
    assert!(matches!(
        exercises.start(level3).await,
        Err(SessionError::LevelLocked { required: 1500, .. })
    ));

    let qualified = seed_player(&storage, 2, "ben", 1500).await;
    storage.current_user.set_current_user(&qualified).await.unwrap();
    let progress = PlayerProgress::for_user(&qualified, exercises.levels());
    assert!(progress.unlocked.iter().any(|info| info.level == level3));
    assert_eq!(exercises.start(level3).await.unwrap().level(), level3);
}
