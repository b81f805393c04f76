use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// Outcome of one answered (or timed-out) question.
///
/// Created exactly once per question by the scoring pipeline; immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    question_id: QuestionId,
    time_spent: f64,
    points_earned: u32,
    correct: bool,
}

impl GameResult {
    pub(crate) fn new(
        question_id: QuestionId,
        time_spent: f64,
        points_earned: u32,
        correct: bool,
    ) -> Self {
        Self {
            question_id,
            time_spent,
            points_earned,
            correct,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    /// Seconds between the question appearing and the answer (or timeout).
    #[must_use]
    pub fn time_spent(&self) -> f64 {
        self.time_spent
    }

    #[must_use]
    pub fn points_earned(&self) -> u32 {
        self.points_earned
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.correct
    }
}
