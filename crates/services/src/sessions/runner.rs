use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use quiz_core::model::{GameResult, Question};
use quiz_core::scoring::AttemptStats;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info};

use super::controller::{AnswerOutcome, Phase, SessionController, Step};
use super::exercise::ExerciseService;
use crate::error::SessionError;

const TICK: Duration = Duration::from_secs(1);

/// What the presentation layer is told while an attempt runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseEvent {
    QuestionShown {
        index: usize,
        total: usize,
        question: Question,
        time_left: u32,
    },
    Tick {
        time_left: u32,
    },
    Answered(AnswerOutcome),
    /// An answer arrived after the question was already decided.
    AnswerIgnored {
        answer: String,
    },
    Completed {
        results: Vec<GameResult>,
        stats: Option<AttemptStats>,
        can_advance: bool,
    },
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(SessionController),
    /// The answer or event channel closed before the last question.
    Abandoned(SessionController),
}

/// Drives one attempt in real time: a one-second countdown per question,
/// answers from a channel, and a fixed feedback pause between questions.
pub struct ExerciseRunner<'a> {
    service: &'a ExerciseService,
    anchor: DateTime<Utc>,
    started: Instant,
}

impl<'a> ExerciseRunner<'a> {
    #[must_use]
    pub fn new(service: &'a ExerciseService) -> Self {
        Self {
            service,
            anchor: service.now(),
            started: Instant::now(),
        }
    }

    /// Wall time derived from the tokio clock, so paused test time is honored.
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.started.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
        self.anchor + elapsed
    }

    /// Run `controller` until it completes or either channel closes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if awarded points cannot be saved.
    pub async fn run(
        &self,
        mut controller: SessionController,
        mut answers: mpsc::Receiver<String>,
        events: mpsc::Sender<ExerciseEvent>,
    ) -> Result<RunOutcome, SessionError> {
        let attempt_id = controller.attempt_id();
        if !emit_question(&controller, &events).await {
            return Ok(RunOutcome::Abandoned(controller));
        }

        loop {
            let keep_going = match controller.phase() {
                Phase::AwaitingAnswer { .. } => {
                    self.await_answer(&mut controller, &mut answers, &events)
                        .await?
                }
                Phase::ShowingFeedback { .. } => {
                    let open = self.hold_feedback(&mut controller, &mut answers, &events).await?;
                    controller.end_feedback();
                    open
                }
                Phase::Advancing => match controller.advance(self.now()) {
                    Some(Step::NextQuestion { .. }) => emit_question(&controller, &events).await,
                    Some(Step::Complete) | None => {
                        let completed = ExerciseEvent::Completed {
                            results: controller.results().to_vec(),
                            stats: controller.stats(),
                            can_advance: controller.can_advance(),
                        };
                        emit(&events, completed).await;
                        info!(%attempt_id, "attempt completed");
                        return Ok(RunOutcome::Completed(controller));
                    }
                },
                Phase::Complete => return Ok(RunOutcome::Completed(controller)),
            };

            if !keep_going {
                info!(%attempt_id, "attempt abandoned");
                return Ok(RunOutcome::Abandoned(controller));
            }
        }
    }

    /// Count down until an answer or the timeout decides the question.
    /// Returns `false` once a channel is closed.
    async fn await_answer(
        &self,
        controller: &mut SessionController,
        answers: &mut mpsc::Receiver<String>,
        events: &mpsc::Sender<ExerciseEvent>,
    ) -> Result<bool, SessionError> {
        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(outcome) = self.service.tick_at(controller, self.now()).await? {
                        return Ok(emit(events, ExerciseEvent::Answered(outcome)).await);
                    }
                    let time_left = controller.time_left().unwrap_or(0);
                    if !emit(events, ExerciseEvent::Tick { time_left }).await {
                        return Ok(false);
                    }
                }
                answer = answers.recv() => {
                    let Some(answer) = answer else {
                        return Ok(false);
                    };
                    if let Some(outcome) = self
                        .service
                        .submit_answer_at(controller, &answer, self.now())
                        .await?
                    {
                        return Ok(emit(events, ExerciseEvent::Answered(outcome)).await);
                    }
                }
            }
        }
    }

    /// Keep the feedback on screen for the configured delay, rejecting any
    /// answers that arrive meanwhile.
    async fn hold_feedback(
        &self,
        controller: &mut SessionController,
        answers: &mut mpsc::Receiver<String>,
        events: &mpsc::Sender<ExerciseEvent>,
    ) -> Result<bool, SessionError> {
        let delay = sleep(Duration::from_secs(u64::from(
            controller.settings().feedback_delay_secs(),
        )));
        tokio::pin!(delay);

        loop {
            tokio::select! {
                () = &mut delay => return Ok(true),
                answer = answers.recv() => {
                    let Some(answer) = answer else {
                        return Ok(false);
                    };
                    let ignored = self
                        .service
                        .submit_answer_at(controller, &answer, self.now())
                        .await?;
                    debug_assert!(ignored.is_none());
                    debug!(attempt_id = %controller.attempt_id(), "late answer rejected");
                    if !emit(events, ExerciseEvent::AnswerIgnored { answer }).await {
                        return Ok(false);
                    }
                }
            }
        }
    }
}

async fn emit_question(
    controller: &SessionController,
    events: &mpsc::Sender<ExerciseEvent>,
) -> bool {
    let Some(question) = controller.current_question() else {
        return true;
    };
    let event = ExerciseEvent::QuestionShown {
        index: controller.current_index(),
        total: controller.questions().len(),
        question: question.clone(),
        time_left: controller.time_left().unwrap_or(0),
    };
    emit(events, event).await
}

async fn emit(events: &mpsc::Sender<ExerciseEvent>, event: ExerciseEvent) -> bool {
    events.send(event).await.is_ok()
}
