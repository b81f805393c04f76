use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use quiz_core::model::{Level, LevelTable, QuizSettings, User};
use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::{CurrentUserRepository, UserRepository};
use tracing::{debug, info};

use super::controller::{AnswerOutcome, SessionContext, SessionController};
use crate::Clock;
use crate::auth_service::{raise_stored_level, update_stored_user};
use crate::error::SessionError;
use crate::question_bank::QuestionSource;

/// Starts attempts and persists what they earn.
///
/// The controller itself never touches storage; this service wraps its
/// transitions and writes awarded points and level changes through.
#[derive(Clone)]
pub struct ExerciseService {
    clock: Clock,
    settings: QuizSettings,
    levels: LevelTable,
    questions: Arc<dyn QuestionSource>,
    users: Arc<dyn UserRepository>,
    current_user: Arc<dyn CurrentUserRepository>,
    rng: Arc<Mutex<StdRng>>,
}

impl ExerciseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
        users: Arc<dyn UserRepository>,
        current_user: Arc<dyn CurrentUserRepository>,
    ) -> Self {
        Self {
            clock,
            settings: QuizSettings::standard(),
            levels: LevelTable::standard(),
            questions,
            users,
            current_user,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Make question selection reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// A level is selectable once the player's points reach its threshold.
    #[must_use]
    pub fn is_playable(&self, user: &User, level: Level) -> bool {
        self.levels.is_unlocked(level, user.total_points())
    }

    /// Begin an attempt for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSignedIn` without a current user,
    /// `SessionError::LevelLocked` if the level is not playable yet, or
    /// `SessionError::Empty` when the question source has nothing for it.
    pub async fn start(&self, level: Level) -> Result<SessionController, SessionError> {
        let user = self.signed_in_user().await?;
        if !self.is_playable(&user, level) {
            return Err(SessionError::LevelLocked {
                level,
                required: self.levels.points_required(level),
            });
        }
        self.begin(user, level)
    }

    async fn signed_in_user(&self) -> Result<User, SessionError> {
        self.current_user
            .current_user()
            .await?
            .ok_or(SessionError::NotSignedIn)
    }

    fn begin(&self, user: User, level: Level) -> Result<SessionController, SessionError> {
        let limit = usize::try_from(self.settings.questions_per_attempt()).unwrap_or(usize::MAX);
        let questions = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.questions.questions_for_level(level, limit, &mut *rng)
        };

        let controller = SessionController::new(
            SessionContext::new(user),
            level,
            questions,
            self.settings.clone(),
            self.clock.now(),
        )?;
        info!(
            attempt_id = %controller.attempt_id(),
            level = level.value(),
            questions = controller.questions().len(),
            "attempt started"
        );
        Ok(controller)
    }

    /// Replay the level of `previous` with a fresh draw of questions.
    ///
    /// Like proceeding, a retry continues the current play-through and does
    /// not re-check the level's points threshold.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSignedIn` without a current user or
    /// `SessionError::Empty` when the question source has nothing for it.
    pub async fn retry(
        &self,
        previous: &SessionController,
    ) -> Result<SessionController, SessionError> {
        let level = previous.level();
        debug!(level = level.value(), "retrying level");
        let user = self.signed_in_user().await?;
        self.begin(user, level)
    }

    /// Submit an answer using the service clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if awarded points cannot be saved.
    pub async fn submit_answer(
        &self,
        controller: &mut SessionController,
        answer: &str,
    ) -> Result<Option<AnswerOutcome>, SessionError> {
        self.submit_answer_at(controller, answer, self.clock.now())
            .await
    }

    /// Submit an answer observed at `now`. Ignored answers return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if awarded points cannot be saved.
    pub async fn submit_answer_at(
        &self,
        controller: &mut SessionController,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AnswerOutcome>, SessionError> {
        let Some(outcome) = controller.submit_answer(answer, now) else {
            debug!(attempt_id = %controller.attempt_id(), "answer ignored");
            return Ok(None);
        };
        self.persist(controller, &outcome).await?;
        Ok(Some(outcome))
    }

    /// Advance the countdown by one second observed at `now`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persistence fails.
    pub async fn tick_at(
        &self,
        controller: &mut SessionController,
        now: DateTime<Utc>,
    ) -> Result<Option<AnswerOutcome>, SessionError> {
        let Some(outcome) = controller.tick(now) else {
            return Ok(None);
        };
        self.persist(controller, &outcome).await?;
        Ok(Some(outcome))
    }

    /// Continue with the next level after a passing attempt.
    ///
    /// The passing attempt itself grants entry, so the next level's points
    /// threshold is not checked here. Choosing that level again later still
    /// goes through [`ExerciseService::start`]. Returns `None` after the last
    /// level.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` for an unfinished attempt,
    /// `SessionError::CannotAdvance` when accuracy is below the pass mark, or
    /// `SessionError::Empty` when there are no questions for the next level.
    pub async fn proceed_to_next_level(
        &self,
        controller: &SessionController,
    ) -> Result<Option<SessionController>, SessionError> {
        if !controller.is_complete() {
            return Err(SessionError::NotCompleted);
        }
        if !controller.can_advance() {
            return Err(SessionError::CannotAdvance);
        }
        let Some(next) = controller.level().next() else {
            return Ok(None);
        };

        let user_id = controller.context().user().id();
        let user = raise_stored_level(
            self.users.as_ref(),
            self.current_user.as_ref(),
            user_id,
            next,
        )
        .await?;
        info!(user_id = %user_id, level = next.value(), "advanced to next level");
        self.begin(user, next).map(Some)
    }

    async fn persist(
        &self,
        controller: &SessionController,
        outcome: &AnswerOutcome,
    ) -> Result<(), SessionError> {
        debug!(
            attempt_id = %controller.attempt_id(),
            index = outcome.index,
            correct = outcome.result.is_correct(),
            points = outcome.result.points_earned(),
            timed_out = outcome.timed_out,
            "answer recorded"
        );
        let points = outcome.result.points_earned();
        if points == 0 {
            return Ok(());
        }
        update_stored_user(
            self.users.as_ref(),
            self.current_user.as_ref(),
            controller.context().user().id(),
            |u| u.add_points(points),
        )
        .await?;
        Ok(())
    }
}
