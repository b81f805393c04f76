use std::collections::HashSet;
use std::path::Path;

use quiz_core::model::{Level, Question, QuestionDraft};
use rand::RngCore;
use rand::seq::SliceRandom;

use crate::error::QuestionBankError;

const BUNDLED_QUESTIONS: &str = include_str!("../data/questions.json");

/// Supplies questions for an attempt.
pub trait QuestionSource: Send + Sync {
    /// A shuffled selection of at most `limit` questions for `level`.
    fn questions_for_level(&self, level: Level, limit: usize, rng: &mut dyn RngCore)
    -> Vec<Question>;
}

/// Fixed set of validated questions held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionBank {
    questions: Vec<Question>,
}

impl StaticQuestionBank {
    /// Validate drafts and reject duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Question` for an invalid draft or
    /// `QuestionBankError::DuplicateId` when two questions share an id.
    pub fn from_drafts(
        drafts: impl IntoIterator<Item = QuestionDraft>,
    ) -> Result<Self, QuestionBankError> {
        let mut seen = HashSet::new();
        let mut questions = Vec::new();
        for draft in drafts {
            let question = draft.validate()?;
            if !seen.insert(question.id().clone()) {
                return Err(QuestionBankError::DuplicateId(
                    question.id().as_str().to_owned(),
                ));
            }
            questions.push(question);
        }
        Ok(Self { questions })
    }

    /// Parse a JSON array of questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Parse` for malformed JSON, otherwise see
    /// [`StaticQuestionBank::from_drafts`].
    pub fn from_json(json: &str) -> Result<Self, QuestionBankError> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(json)?;
        Self::from_drafts(drafts)
    }

    /// Load a JSON question file from disk.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Io` if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, QuestionBankError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The seed bank shipped with the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled file is broken.
    pub fn bundled() -> Result<Self, QuestionBankError> {
        Self::from_json(BUNDLED_QUESTIONS)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn count_for_level(&self, level: Level) -> usize {
        self.questions.iter().filter(|q| q.level() == level).count()
    }
}

impl QuestionSource for StaticQuestionBank {
    fn questions_for_level(
        &self,
        level: Level,
        limit: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Question> {
        let mut picked: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.level() == level)
            .cloned()
            .collect();
        picked.shuffle(rng);
        picked.truncate(limit);
        picked
    }
}
