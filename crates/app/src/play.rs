use std::error::Error;
use std::io::BufRead;
use std::sync::Arc;

use quiz_core::model::{Level, Question};
use quiz_core::scoring::{AttemptStats, PerformanceBand};
use services::{ExerciseEvent, ExerciseRunner, ExerciseService, RunOutcome, SessionController};
use tokio::sync::mpsc;
use tracing::debug;

/// Play `level` interactively until the player quits or input ends.
pub async fn play(exercises: Arc<ExerciseService>, level: Level) -> Result<(), Box<dyn Error>> {
    let mut lines = spawn_stdin_lines();
    let mut controller = exercises.start(level).await?;

    loop {
        print_level_banner(&exercises, controller.level());
        let Some(finished) = run_attempt(&exercises, controller, &mut lines).await? else {
            println!("Attempt abandoned");
            return Ok(());
        };

        let can_advance = finished.can_advance();
        controller = loop {
            if can_advance {
                println!("[r]etry  [n]ext level  [q]uit");
            } else {
                println!("[r]etry  [q]uit");
            }
            let Some(choice) = lines.recv().await else {
                return Ok(());
            };
            match choice.trim() {
                "r" => break exercises.retry(&finished).await?,
                "n" if can_advance => match exercises.proceed_to_next_level(&finished).await? {
                    Some(next) => break next,
                    None => {
                        println!("You finished the last level. ¡Enhorabuena!");
                        return Ok(());
                    }
                },
                "q" => return Ok(()),
                _ => {}
            }
        };
    }
}

/// Forward stdin lines from a plain thread; tokio's stdin would hold the
/// runtime open on exit while a read is pending.
fn spawn_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_attempt(
    exercises: &Arc<ExerciseService>,
    controller: SessionController,
    lines: &mut mpsc::Receiver<String>,
) -> Result<Option<SessionController>, Box<dyn Error>> {
    let (answer_tx, answer_rx) = mpsc::channel(8);
    let (event_tx, mut events) = mpsc::channel(16);
    let service = Arc::clone(exercises);
    let handle = tokio::spawn(async move {
        ExerciseRunner::new(&service)
            .run(controller, answer_rx, event_tx)
            .await
    });

    let mut answer_tx = Some(answer_tx);
    let mut current: Option<Question> = None;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if let ExerciseEvent::QuestionShown { question, .. } = &event {
                    current = Some(question.clone());
                }
                print_event(&event, current.as_ref());
            }
            line = lines.recv(), if answer_tx.is_some() => {
                let Some(line) = line.filter(|l| l.trim() != "q") else {
                    // Closing the answer channel abandons the attempt.
                    answer_tx = None;
                    continue;
                };
                let Some(answer) = resolve_answer(&line, current.as_ref()) else {
                    continue;
                };
                if let Some(tx) = &answer_tx {
                    if tx.send(answer).await.is_err() {
                        answer_tx = None;
                    }
                }
            }
        }
    }

    match handle.await?? {
        RunOutcome::Completed(controller) => Ok(Some(controller)),
        RunOutcome::Abandoned(_) => Ok(None),
    }
}

/// Numbers pick an option; anything else is sent verbatim. Blank lines are
/// not answers.
fn resolve_answer(line: &str, question: Option<&Question>) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let picked = question.and_then(|q| {
        let n = line.parse::<usize>().ok()?;
        q.options().get(n.checked_sub(1)?)
    });
    Some(picked.map_or_else(|| line.to_owned(), String::clone))
}

fn print_level_banner(exercises: &ExerciseService, level: Level) {
    let info = exercises.levels().info(level);
    println!();
    println!("── Level {}: {} ──", info.level, info.name);
    println!("{}", info.description);
}

fn print_event(event: &ExerciseEvent, current: Option<&Question>) {
    match event {
        ExerciseEvent::QuestionShown {
            index,
            total,
            question,
            time_left,
        } => {
            println!();
            println!("Question {}/{total}  ({time_left}s)", index + 1);
            println!("  {}", question.sentence());
            for (i, option) in question.options().iter().enumerate() {
                println!("  {}) {option}", i + 1);
            }
        }
        ExerciseEvent::Tick { time_left } => {
            if *time_left <= 5 || time_left % 5 == 0 {
                println!("  … {time_left}s");
            }
        }
        ExerciseEvent::Answered(outcome) => {
            if outcome.timed_out {
                println!("  Time is up.");
            }
            if outcome.result.is_correct() {
                println!(
                    "  ¡Correcto! +{} ({} total)",
                    outcome.result.points_earned(),
                    outcome.total_points
                );
            } else if let Some(question) = current {
                println!("  Incorrect. Answer: {}", question.correct_answer());
            }
            if let Some(translation) = current.and_then(Question::translation) {
                println!("  {translation}");
            }
        }
        ExerciseEvent::AnswerIgnored { answer } => {
            debug!(%answer, "input ignored during feedback");
        }
        ExerciseEvent::Completed {
            stats, can_advance, ..
        } => {
            println!();
            match stats {
                Some(stats) => print_stats(stats),
                None => println!("No questions answered"),
            }
            if !can_advance {
                println!("Not enough correct answers to unlock the next level.");
            }
        }
    }
}

fn print_stats(stats: &AttemptStats) {
    let verdict = match stats.performance_band() {
        PerformanceBand::Excellent => "¡Excelente!",
        PerformanceBand::Good => "¡Bien!",
        PerformanceBand::KeepPracticing => "Keep practicing",
    };
    println!("{verdict}");
    println!(
        "{} points, {}/{} correct ({}%), {:.1}s per question",
        stats.total_points,
        stats.correct_count,
        stats.total_count,
        stats.accuracy_percent(),
        stats.average_time
    );
}
