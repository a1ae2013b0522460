use quiz_core::model::{AttemptResult, PassingThreshold};
use services::PersistenceOutcome;

use crate::vm::time_fmt::format_elapsed;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutcomeVm {
    pub number: usize,
    pub selected: String,
    pub correct: String,
    pub is_correct: bool,
}

/// Everything the results screen shows after a submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsVm {
    pub passed: bool,
    pub headline: &'static str,
    pub subline: &'static str,
    pub percent: u32,
    pub correct_line: String,
    pub time: String,
    pub passing_line: String,
    pub outcomes: Vec<OutcomeVm>,
    pub notice: Option<String>,
}

impl ResultsVm {
    #[must_use]
    pub fn new(result: &AttemptResult, threshold: PassingThreshold) -> Self {
        let percent = result.display_percent();
        let required = format_percent(threshold.percent());
        let (headline, subline, passing_line) = if result.passed {
            (
                "Congratulations!",
                "You've successfully passed this quiz!",
                format!("You passed! (Required: {required}%)"),
            )
        } else {
            (
                "Keep Practicing!",
                "You need more practice. Try again!",
                format!(
                    "Passing score: {required}% - You scored {}%",
                    failing_score(result.score_percent, percent, threshold)
                ),
            )
        };

        Self {
            passed: result.passed,
            headline,
            subline,
            percent,
            correct_line: format!("{}/{}", result.correct_answers, result.total_questions),
            time: format_elapsed(result.elapsed),
            passing_line,
            outcomes: result
                .outcomes
                .iter()
                .enumerate()
                .map(|(i, o)| OutcomeVm {
                    number: i + 1,
                    selected: o
                        .selected
                        .as_ref()
                        .map(|l| l.as_str().to_string())
                        .unwrap_or_default(),
                    correct: o.correct_answer.as_str().to_string(),
                    is_correct: o.is_correct,
                })
                .collect(),
            notice: None,
        }
    }

    /// Attach the learner-facing notice for how persistence went.
    pub fn set_persistence(&mut self, outcome: &PersistenceOutcome) {
        self.notice = persistence_notice(outcome);
    }
}

/// What the results screen says once persistence has finished.
#[must_use]
pub fn persistence_notice(outcome: &PersistenceOutcome) -> Option<String> {
    match outcome {
        PersistenceOutcome::Saved(_) => Some("Quiz results saved!".into()),
        other => other.notice(),
    }
}

/// Whole percents print bare; others keep two decimals, trailing zeros trimmed.
fn format_percent(value: f64) -> String {
    let hundredths = (value * 100.0).round();
    if hundredths % 100.0 == 0.0 {
        return format!("{}", hundredths / 100.0);
    }
    let text = format!("{:.2}", hundredths / 100.0);
    text.trim_end_matches('0').to_string()
}

/// The rounded score, unless rounding would lift it to the threshold it missed;
/// then the score truncated to hundredths.
fn failing_score(score: f64, rounded: u32, threshold: PassingThreshold) -> String {
    if f64::from(rounded) < threshold.percent() {
        return rounded.to_string();
    }
    // Nudge before flooring so 57.999... from 29/50 stays 58.
    let truncated = ((score * 100.0) + 1e-6).floor() / 100.0;
    format_percent(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::ElapsedTime;
    use quiz_core::model::{
        AttemptId, CourseId, ModuleId, OptionLetter, QuestionId, QuestionOutcome, QuizId,
    };
    use quiz_core::time::fixed_now;
    use services::PersistenceError;

    fn result(correct: u32, total: u32, passed: bool) -> AttemptResult {
        AttemptResult {
            user_id: None,
            course_id: CourseId::new("c"),
            module_id: ModuleId::new("m"),
            quiz_id: QuizId::new("m-quiz"),
            total_questions: total,
            correct_answers: correct,
            score_percent: f64::from(correct) / f64::from(total) * 100.0,
            elapsed: ElapsedTime::from_secs(247),
            passed,
            outcomes: vec![QuestionOutcome {
                question_id: QuestionId::new("q1"),
                selected: Some(OptionLetter::new("C")),
                correct_answer: OptionLetter::new("A"),
                is_correct: false,
            }],
            submitted_at: fixed_now(),
        }
    }

    #[test]
    fn failing_result_shows_required_score() {
        let threshold = PassingThreshold::new(70.0).unwrap();
        let vm = ResultsVm::new(&result(2, 3, false), threshold);
        assert_eq!(vm.headline, "Keep Practicing!");
        assert_eq!(vm.percent, 67);
        assert_eq!(vm.correct_line, "2/3");
        assert_eq!(vm.time, "4:07");
        assert_eq!(vm.passing_line, "Passing score: 70% - You scored 67%");
        assert_eq!(vm.outcomes[0].selected, "C");
    }

    #[test]
    fn failing_line_never_rounds_up_to_the_threshold() {
        let threshold = PassingThreshold::new(66.67).unwrap();
        let vm = ResultsVm::new(&result(2, 3, false), threshold);
        assert_eq!(vm.percent, 67);
        assert_eq!(
            vm.passing_line,
            "Passing score: 66.67% - You scored 66.66%"
        );

        let threshold = PassingThreshold::new(70.0).unwrap();
        let mut nearly = result(2, 3, false);
        nearly.score_percent = 69.6;
        let vm = ResultsVm::new(&nearly, threshold);
        assert_eq!(vm.passing_line, "Passing score: 70% - You scored 69.6%");
    }

    #[test]
    fn threshold_percent_formatting() {
        assert_eq!(format_percent(70.0), "70");
        assert_eq!(format_percent(66.666), "66.67");
        assert_eq!(format_percent(72.5), "72.5");
    }

    #[test]
    fn passing_result_congratulates() {
        let threshold = PassingThreshold::new(70.0).unwrap();
        let vm = ResultsVm::new(&result(4, 4, true), threshold);
        assert_eq!(vm.headline, "Congratulations!");
        assert_eq!(vm.passing_line, "You passed! (Required: 70%)");
    }

    #[test]
    fn persistence_notice_follows_outcome() {
        let threshold = PassingThreshold::new(70.0).unwrap();
        let mut vm = ResultsVm::new(&result(4, 4, true), threshold);

        vm.set_persistence(&PersistenceOutcome::Saved(AttemptId::generate()));
        assert_eq!(vm.notice.as_deref(), Some("Quiz results saved!"));

        vm.set_persistence(&PersistenceOutcome::Failed(PersistenceError::Timeout));
        assert!(vm.notice.as_deref().is_some_and(|n| n.contains("timed out")));
    }
}
