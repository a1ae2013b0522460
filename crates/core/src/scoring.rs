use crate::model::{AnswerRecord, PassingThreshold, Question, QuestionOutcome};

//
// ─── SCORE REPORT ──────────────────────────────────────────────────────────────
//

/// Result of scoring an answer record against a question set.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::{AnswerRecord, PassingThreshold};
/// # use quiz_core::scoring::Scorer;
/// let report = Scorer::score(&[], &AnswerRecord::new());
/// assert_eq!(report.score_percent, 0.0);
/// assert!(!report.passed(PassingThreshold::default()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub correct_count: u32,
    pub total: u32,
    /// `correct_count / total * 100` at full precision, `0.0` for an empty set.
    pub score_percent: f64,
    pub outcomes: Vec<QuestionOutcome>,
}

impl ScoreReport {
    /// Whether this score passes. An empty question set never passes.
    #[must_use]
    pub fn passed(&self, threshold: PassingThreshold) -> bool {
        self.total > 0 && threshold.is_met_by(self.score_percent)
    }
}

//
// ─── SCORER ────────────────────────────────────────────────────────────────────
//

/// Pure scoring over a question set and an answer record.
pub struct Scorer;

impl Scorer {
    /// Score every question in order. A question counts as correct only when the
    /// recorded letter equals the stored correct letter exactly.
    #[must_use]
    pub fn score(questions: &[Question], answers: &AnswerRecord) -> ScoreReport {
        let outcomes: Vec<QuestionOutcome> = questions
            .iter()
            .map(|q| {
                let selected = answers.get(q.id()).cloned();
                let is_correct = selected.as_ref().is_some_and(|s| q.is_correct(s));
                QuestionOutcome {
                    question_id: q.id().clone(),
                    selected,
                    correct_answer: q.correct_answer().clone(),
                    is_correct,
                }
            })
            .collect();

        let total = u32::try_from(outcomes.len()).unwrap_or(u32::MAX);
        let correct_count = u32::try_from(outcomes.iter().filter(|o| o.is_correct).count())
            .unwrap_or(u32::MAX);

        let score_percent = if total == 0 {
            0.0
        } else {
            f64::from(correct_count) / f64::from(total) * 100.0
        };

        ScoreReport {
            correct_count,
            total,
            score_percent,
            outcomes,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
