use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{Level, Question, QuestionDraft, QuestionKind};
use quiz_core::time::fixed_clock;
use rand::RngCore;
use services::{
    AuthService, ExerciseEvent, ExerciseRunner, ExerciseService, QuestionSource, RunOutcome,
};
use storage::repository::Storage;
use tokio::sync::mpsc;

/// Hands out questions in declaration order.
struct OrderedSource(Vec<Question>);

impl QuestionSource for OrderedSource {
    fn questions_for_level(
        &self,
        level: Level,
        limit: usize,
        _rng: &mut dyn RngCore,
    ) -> Vec<Question> {
        self.0
            .iter()
            .filter(|q| q.level() == level)
            .take(limit)
            .cloned()
            .collect()
    }
}

fn question(id: &str) -> Question {
    QuestionDraft {
        id: id.into(),
        level: 1,
        kind: QuestionKind::DragDrop,
        sentence: "¿Dónde __ el supermercado?".into(),
        correct_answer: "está".into(),
        options: vec!["está".into(), "es".into(), "son".into()],
        translation: Some("Wo ist der Supermarkt?".into()),
    }
    .validate()
    .unwrap()
}

async fn setup() -> (ExerciseService, AuthService) {
    let storage = Storage::in_memory();
    let auth = AuthService::new(
        fixed_clock(),
        Arc::clone(&storage.users),
        Arc::clone(&storage.current_user),
    )
    .with_hash_cost(4);
    auth.register("ana", "secreto", "DE").await.unwrap();

    let source: Arc<dyn QuestionSource> = Arc::new(OrderedSource(vec![question("a"), question("b")]));
    let service = ExerciseService::new(fixed_clock(), source, storage.users, storage.current_user);
    (service, auth)
}

#[tokio::test(start_paused = true)]
async fn answers_and_timeouts_follow_the_clock() {
    let (service, auth) = setup().await;
    let controller = service.start(Level::first()).await.unwrap();

    let (answer_tx, answer_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::channel(64);
    let runner_service = service.clone();
    let handle = tokio::spawn(async move {
        ExerciseRunner::new(&runner_service)
            .run(controller, answer_rx, event_tx)
            .await
    });

    assert!(matches!(
        event_rx.recv().await,
        Some(ExerciseEvent::QuestionShown {
            index: 0,
            total: 2,
            time_left: 20,
            ..
        })
    ));

    tokio::time::sleep(Duration::from_millis(4500)).await;
    answer_tx.send("está".to_owned()).await.unwrap();
    answer_tx.send("es".to_owned()).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }
    let outcome = handle.await.unwrap().unwrap();
    let RunOutcome::Completed(controller) = outcome else {
        panic!("attempt should complete");
    };

    let ticks_before_answer: Vec<u32> = events
        .iter()
        .take_while(|e| !matches!(e, ExerciseEvent::Answered(_)))
        .filter_map(|e| match e {
            ExerciseEvent::Tick { time_left } => Some(*time_left),
            _ => None,
        })
        .collect();
    assert_eq!(ticks_before_answer, [19, 18, 17, 16]);

    let answered: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExerciseEvent::Answered(outcome) => Some(outcome),
            _ => None,
        })
        .collect();
    assert_eq!(answered.len(), 2);
    assert!(answered[0].result.is_correct());
    assert_eq!(answered[0].result.points_earned(), 80);
    assert!(answered[1].timed_out);
    assert_eq!(answered[1].result.points_earned(), 0);
    assert!((answered[1].result.time_spent() - 20.0).abs() < 1e-6);

    assert!(events.iter().any(|e| matches!(
        e,
        ExerciseEvent::AnswerIgnored { answer } if answer == "es"
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ExerciseEvent::QuestionShown { index: 1, .. }
    )));
    let Some(ExerciseEvent::Completed {
        results,
        stats,
        can_advance,
    }) = events.last()
    else {
        panic!("last event should be Completed");
    };
    assert_eq!(results.len(), 2);
    assert_eq!(stats.unwrap().correct_count, 1);
    assert!(!can_advance);

    assert_eq!(controller.results().len(), 2);
    assert_eq!(
        auth.current_user().await.unwrap().unwrap().total_points(),
        80
    );
}

#[tokio::test(start_paused = true)]
async fn closing_the_answer_channel_abandons_the_attempt() {
    let (service, _) = setup().await;
    let controller = service.start(Level::first()).await.unwrap();

    let (answer_tx, answer_rx) = mpsc::channel::<String>(1);
    let (event_tx, mut event_rx) = mpsc::channel(64);
    let runner_service = service.clone();
    let handle = tokio::spawn(async move {
        ExerciseRunner::new(&runner_service)
            .run(controller, answer_rx, event_tx)
            .await
    });

    assert!(matches!(
        event_rx.recv().await,
        Some(ExerciseEvent::QuestionShown { .. })
    ));
    drop(answer_tx);

    let RunOutcome::Abandoned(controller) = handle.await.unwrap().unwrap() else {
        panic!("attempt should be abandoned");
    };
    assert!(controller.results().is_empty());
    assert!(!controller.is_complete());
}
