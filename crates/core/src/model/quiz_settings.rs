use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("question time limit must be between 5 and 600 seconds")]
    InvalidTimeLimit,

    #[error("feedback delay must be at most 60 seconds")]
    InvalidFeedbackDelay,

    #[error("questions per attempt must be > 0")]
    InvalidQuestionCount,

    #[error("pass accuracy must be in (0, 1]")]
    InvalidPassAccuracy,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunables for one exercise attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSettings {
    time_limit_secs: u32,
    feedback_delay_secs: u32,
    questions_per_attempt: u32,
    pass_accuracy: f64,
}

impl QuizSettings {
    /// The configuration the game ships with:
    /// - 20 seconds per question
    /// - 2 seconds of feedback before moving on
    /// - 10 questions per attempt
    /// - 70% accuracy to advance to the next level
    #[must_use]
    pub fn standard() -> Self {
        Self {
            time_limit_secs: 20,
            feedback_delay_secs: 2,
            questions_per_attempt: 10,
            pass_accuracy: 0.70,
        }
    }

    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError` if any value is outside its supported range.
    pub fn new(
        time_limit_secs: u32,
        feedback_delay_secs: u32,
        questions_per_attempt: u32,
        pass_accuracy: f64,
    ) -> Result<Self, QuizSettingsError> {
        if !(5..=600).contains(&time_limit_secs) {
            return Err(QuizSettingsError::InvalidTimeLimit);
        }
        if feedback_delay_secs > 60 {
            return Err(QuizSettingsError::InvalidFeedbackDelay);
        }
        if questions_per_attempt == 0 {
            return Err(QuizSettingsError::InvalidQuestionCount);
        }
        if !pass_accuracy.is_finite() || pass_accuracy <= 0.0 || pass_accuracy > 1.0 {
            return Err(QuizSettingsError::InvalidPassAccuracy);
        }

        Ok(Self {
            time_limit_secs,
            feedback_delay_secs,
            questions_per_attempt,
            pass_accuracy,
        })
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn feedback_delay_secs(&self) -> u32 {
        self.feedback_delay_secs
    }

    #[must_use]
    pub fn questions_per_attempt(&self) -> u32 {
        self.questions_per_attempt
    }

    #[must_use]
    pub fn pass_accuracy(&self) -> f64 {
        self.pass_accuracy
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self::standard()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
