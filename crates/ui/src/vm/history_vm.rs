use quiz_core::model::{AttemptId, AttemptRecord, display_percent};

use crate::vm::time_fmt::{format_datetime, format_minutes};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptCardVm {
    pub id: AttemptId,
    pub module: String,
    pub attempted_at_str: String,
    pub percent: u32,
    pub correct_line: String,
    pub time: String,
    pub passed: bool,
}

impl From<&AttemptRecord> for AttemptCardVm {
    fn from(record: &AttemptRecord) -> Self {
        Self {
            id: record.id,
            module: record.module_id.to_string(),
            attempted_at_str: format_datetime(record.attempted_at),
            percent: display_percent(record.score_percent),
            correct_line: format!("{}/{}", record.correct_answers, record.total_questions),
            time: format_minutes(record.time_taken_minutes),
            passed: record.passed,
        }
    }
}

#[must_use]
pub fn map_attempt_cards(records: &[AttemptRecord]) -> Vec<AttemptCardVm> {
    records.iter().map(AttemptCardVm::from).collect()
}
