use std::collections::HashMap;

use crate::model::ids::QuestionId;
use crate::model::question::OptionLetter;

/// Selected option per question. At most one entry per question id.
///
/// The record itself does not know the question set; the session controller
/// checks ids and letters before inserting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerRecord {
    entries: HashMap<QuestionId, OptionLetter>,
}

impl AnswerRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the answer for a question, returning the previous one.
    pub(crate) fn upsert(
        &mut self,
        question_id: QuestionId,
        letter: OptionLetter,
    ) -> Option<OptionLetter> {
        self.entries.insert(question_id, letter)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<&OptionLetter> {
        self.entries.get(question_id)
    }

    #[must_use]
    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.entries.contains_key(question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &OptionLetter)> {
        self.entries.iter()
    }
}

impl FromIterator<(QuestionId, OptionLetter)> for AnswerRecord {
    fn from_iter<T: IntoIterator<Item = (QuestionId, OptionLetter)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
