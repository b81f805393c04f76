use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{AttemptId, GameResult, Level, Question, QuizSettings, User};
use quiz_core::scoring::{self, AttemptStats};
use quiz_core::time::elapsed_secs;

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── CONTEXT ───────────────────────────────────────────────────────────────────
//

/// The signed-in player an attempt runs for.
///
/// Points earned during the attempt are added here as answers come in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user: User,
}

impl SessionContext {
    #[must_use]
    pub fn new(user: User) -> Self {
        Self { user }
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn into_user(self) -> User {
        self.user
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where the attempt currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the player; `time_left` counts down in whole seconds.
    AwaitingAnswer { time_left: u32 },
    /// An answer (or the timeout) was recorded and is being shown.
    ShowingFeedback { answer: String, correct: bool },
    Advancing,
    Complete,
}

/// What happened when an answer was accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub index: usize,
    pub result: GameResult,
    pub timed_out: bool,
    /// The player's total after this answer.
    pub total_points: u32,
}

/// Result of leaving the `Advancing` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    NextQuestion { index: usize, time_left: u32 },
    Complete,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// One exercise attempt: an ordered list of questions, the current index,
/// the per-question countdown and the results recorded so far.
///
/// All transitions take the current time from the caller. Events that do not
/// apply to the current phase return `None` and change nothing.
pub struct SessionController {
    attempt_id: AttemptId,
    level: Level,
    settings: QuizSettings,
    context: SessionContext,
    questions: Vec<Question>,
    current: usize,
    results: Vec<GameResult>,
    phase: Phase,
    question_started_at: DateTime<Utc>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionController {
    /// Start an attempt at question 0 with a full countdown.
    ///
    /// At most `questions_per_attempt` questions are kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(
        context: SessionContext,
        level: Level,
        mut questions: Vec<Question>,
        settings: QuizSettings,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let limit = usize::try_from(settings.questions_per_attempt()).unwrap_or(usize::MAX);
        questions.truncate(limit);
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            attempt_id: AttemptId::generate(),
            level,
            phase: Phase::AwaitingAnswer {
                time_left: settings.time_limit_secs(),
            },
            settings,
            context,
            questions,
            current: 0,
            results: Vec::new(),
            question_started_at: started_at,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Seconds left on the countdown, only while awaiting an answer.
    #[must_use]
    pub fn time_left(&self) -> Option<u32> {
        match self.phase {
            Phase::AwaitingAnswer { time_left } => Some(time_left),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_showing_feedback(&self) -> bool {
        matches!(self.phase, Phase::ShowingFeedback { .. })
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question on screen; `None` once the attempt is complete.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn results(&self) -> &[GameResult] {
        &self.results
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.results.len(),
            remaining: self.questions.len().saturating_sub(self.results.len()),
            position: (self.current + 1).min(self.questions.len()),
            is_complete: self.is_complete(),
        }
    }

    /// Aggregate over the results recorded so far.
    #[must_use]
    pub fn stats(&self) -> Option<AttemptStats> {
        AttemptStats::from_results(&self.results)
    }

    /// Whether a completed attempt qualifies for the next level.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.is_complete()
            && scoring::can_advance_with(&self.results, self.settings.pass_accuracy())
    }

    /// The full results list, available once the attempt is complete.
    #[must_use]
    pub fn completed_results(&self) -> Option<&[GameResult]> {
        self.is_complete().then_some(self.results.as_slice())
    }

    /// Record the player's answer to the current question.
    ///
    /// Only the first answer per question counts; anything submitted outside
    /// `AwaitingAnswer` returns `None`.
    pub fn submit_answer(&mut self, answer: &str, now: DateTime<Utc>) -> Option<AnswerOutcome> {
        if !matches!(self.phase, Phase::AwaitingAnswer { .. }) {
            return None;
        }
        Some(self.record(answer, now, false))
    }

    /// One second of countdown. Returns the timeout outcome when it reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<AnswerOutcome> {
        let Phase::AwaitingAnswer { time_left } = &mut self.phase else {
            return None;
        };
        *time_left = time_left.saturating_sub(1);
        if *time_left > 0 {
            return None;
        }
        Some(self.record("", now, true))
    }

    /// Leave the feedback display. Returns `false` when not showing feedback.
    pub fn end_feedback(&mut self) -> bool {
        if !self.is_showing_feedback() {
            return false;
        }
        self.phase = Phase::Advancing;
        true
    }

    /// Move to the next question, or finish the attempt after the last one.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<Step> {
        if self.phase != Phase::Advancing {
            return None;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            let time_left = self.settings.time_limit_secs();
            self.phase = Phase::AwaitingAnswer { time_left };
            self.question_started_at = now;
            Some(Step::NextQuestion {
                index: self.current,
                time_left,
            })
        } else {
            self.phase = Phase::Complete;
            self.completed_at = Some(now);
            Some(Step::Complete)
        }
    }

    fn record(&mut self, answer: &str, now: DateTime<Utc>, timed_out: bool) -> AnswerOutcome {
        let question = &self.questions[self.current];
        let elapsed = elapsed_secs(self.question_started_at, now);
        let result = scoring::score_answer(question, answer, elapsed);
        if result.is_correct() {
            self.context.user.add_points(result.points_earned());
        }

        self.phase = Phase::ShowingFeedback {
            answer: answer.to_owned(),
            correct: result.is_correct(),
        };
        self.results.push(result.clone());

        AnswerOutcome {
            index: self.current,
            result,
            timed_out,
            total_points: self.context.user.total_points(),
        }
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("attempt_id", &self.attempt_id)
            .field("level", &self.level)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("results_len", &self.results.len())
            .field("phase", &self.phase)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
