use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::level::{Level, LevelError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id}: sentence cannot be empty")]
    EmptySentence { id: String },

    #[error("question {id}: correct answer cannot be empty")]
    EmptyAnswer { id: String },

    #[error("question {id}: needs at least two distinct options")]
    TooFewOptions { id: String },

    #[error("question {id}: correct answer is not among the options")]
    AnswerNotInOptions { id: String },

    #[error("question {id}: {source}")]
    InvalidLevel {
        id: String,
        #[source]
        source: LevelError,
    },
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// How the options are presented to the player.
///
/// Both kinds are answered with one option string; the kind only matters to
/// the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    DragDrop,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in a question bank file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: String,
    pub level: u8,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub sentence: String,
    pub correct_answer: String,
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id, sentence or answer is blank, the
    /// level is out of range, fewer than two distinct options are given, or
    /// the correct answer is not one of the options.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        let level = Level::new(self.level).map_err(|source| QuestionError::InvalidLevel {
            id: id.clone(),
            source,
        })?;
        if self.sentence.trim().is_empty() {
            return Err(QuestionError::EmptySentence { id });
        }
        if self.correct_answer.is_empty() {
            return Err(QuestionError::EmptyAnswer { id });
        }

        let distinct: HashSet<&str> = self.options.iter().map(String::as_str).collect();
        if distinct.len() < 2 {
            return Err(QuestionError::TooFewOptions { id });
        }
        if !distinct.contains(self.correct_answer.as_str()) {
            return Err(QuestionError::AnswerNotInOptions { id });
        }

        let translation = self
            .translation
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Question {
            id: QuestionId::new(id),
            level,
            kind: self.kind,
            sentence: self.sentence,
            correct_answer: self.correct_answer,
            options: self.options,
            translation,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A fill-in-the-blank question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    level: Level,
    kind: QuestionKind,
    sentence: String,
    correct_answer: String,
    options: Vec<String>,
    translation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    /// Prompt sentence, with `__` marking the blank.
    #[must_use]
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn translation(&self) -> Option<&str> {
        self.translation.as_deref()
    }

    /// Convert back into the bank file shape.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            id: self.id.as_str().to_string(),
            level: self.level.value(),
            kind: self.kind,
            sentence: self.sentence.clone(),
            correct_answer: self.correct_answer.clone(),
            options: self.options.clone(),
            translation: self.translation.clone(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
