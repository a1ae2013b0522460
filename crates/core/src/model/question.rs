use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id} has no prompt text")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} has an empty option at position {index}")]
    EmptyOption { id: QuestionId, index: usize },

    #[error("question {id} repeats option letter {letter}")]
    DuplicateOption { id: QuestionId, letter: OptionLetter },

    #[error("question {id} has correct answer {letter} which is not among its options")]
    CorrectAnswerMissing { id: QuestionId, letter: OptionLetter },
}

//
// ─── OPTION LETTER ─────────────────────────────────────────────────────────────
//

/// Letter token that prefixes an option label (`"B) Piaget"` → `B`).
///
/// Comparison is exact and case-sensitive.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionLetter(String);

impl OptionLetter {
    #[must_use]
    pub fn new(letter: impl Into<String>) -> Self {
        Self(letter.into())
    }

    /// Extract the letter token from an option label: its first character.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        label.trim_start().chars().next().map(|c| Self(c.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionLetter({:?})", self.0)
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::TrueFalse => "true-false",
            Self::ShortAnswer => "short-answer",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "multiple-choice" => Some(Self::MultipleChoice),
            "true-false" => Some(Self::TrueFalse),
            "short-answer" => Some(Self::ShortAnswer),
            _ => None,
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in authored module content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionDraft {
    /// Check structural completeness and build an immutable `Question`.
    ///
    /// Authoring quality is not judged; only the shape needed for scoring.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id or prompt is blank, there are no options,
    /// an option label is blank, two options share a letter, or the correct answer
    /// letter is not one of the option letters.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        let id = QuestionId::new(id);

        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions { id });
        }

        let mut letters = Vec::with_capacity(self.options.len());
        for (index, label) in self.options.iter().enumerate() {
            let Some(letter) = OptionLetter::from_label(label) else {
                return Err(QuestionError::EmptyOption { id, index });
            };
            if letters.contains(&letter) {
                return Err(QuestionError::DuplicateOption { id, letter });
            }
            letters.push(letter);
        }

        let correct = OptionLetter::new(self.correct_answer.trim());
        if !letters.contains(&correct) {
            return Err(QuestionError::CorrectAnswerMissing {
                id,
                letter: correct,
            });
        }

        Ok(Question {
            id,
            kind: self.kind,
            prompt: self.prompt,
            options: self.options,
            letters,
            correct_answer: correct,
            explanation: self.explanation,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated quiz question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    prompt: String,
    options: Vec<String>,
    letters: Vec<OptionLetter>,
    correct_answer: OptionLetter,
    explanation: String,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Option labels in authored order, letter prefix included.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Letter tokens, parallel to `options()`.
    #[must_use]
    pub fn option_letters(&self) -> &[OptionLetter] {
        &self.letters
    }

    #[must_use]
    pub fn correct_answer(&self) -> &OptionLetter {
        &self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn has_option(&self, letter: &OptionLetter) -> bool {
        self.letters.contains(letter)
    }

    #[must_use]
    pub fn is_correct(&self, letter: &OptionLetter) -> bool {
        &self.correct_answer == letter
    }

    /// Convert back into the authored shape, e.g. for storage.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            id: self.id.to_string(),
            kind: self.kind,
            prompt: self.prompt.clone(),
            options: self.options.clone(),
            correct_answer: self.correct_answer.to_string(),
            explanation: self.explanation.clone(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
