use quiz_core::model::{CourseId, ModuleId, OptionLetter, Question};
use quiz_core::session::{Learner, QuizEvent, QuizIntent, QuizSession};
use services::{PersistenceTask, QuizLoopService, QuizTimer};

use crate::state::ViewError;
use crate::vm::results_vm::ResultsVm;
use crate::vm::time_fmt::format_elapsed;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub letter: String,
    pub label: String,
    pub selected: bool,
}

/// Snapshot of the quiz screen for the current question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizScreenVm {
    pub title: String,
    pub heading: String,
    pub progress_percent: u32,
    pub timer: String,
    pub prompt: String,
    pub options: Vec<OptionVm>,
    pub answered_line: String,
    /// Offered only once the current question has an answer.
    pub can_toggle_explanation: bool,
    pub explanation: Option<ExplanationVm>,
    pub can_go_back: bool,
    pub is_last: bool,
    pub submit_enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplanationVm {
    pub correct_answer: String,
    pub text: String,
}

pub enum QuizVmOutcome {
    Continue,
    Submitted {
        results: Box<ResultsVm>,
        persistence: PersistenceTask,
    },
    Restarted,
}

/// Presentation state around a `QuizSession`.
///
/// A timed view-model owns the session's `QuizTimer`: it stops on submit and
/// starts fresh on retake.
pub struct QuizVm {
    session: QuizSession,
    show_explanation: bool,
    timed: bool,
    timer: Option<QuizTimer>,
}

impl QuizVm {
    /// Untimed view-model; ticks only arrive through `apply`.
    #[must_use]
    pub fn new(session: QuizSession) -> Self {
        Self {
            session,
            show_explanation: false,
            timed: false,
            timer: None,
        }
    }

    /// View-model with a running one-second timer.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn timed(session: QuizSession) -> Self {
        Self {
            timed: true,
            timer: Some(QuizTimer::start()),
            ..Self::new(session)
        }
    }

    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(QuizTimer::is_running)
    }

    /// Wait for the next timer tick. Never resolves while no timer is running.
    pub async fn next_tick(&mut self) -> QuizIntent {
        if let Some(timer) = self.timer.as_mut() {
            if let Some(tick) = timer.next_tick().await {
                return tick;
            }
        }
        std::future::pending().await
    }

    fn stop_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn toggle_explanation(&mut self) {
        let answered = self
            .session
            .current_question()
            .is_some_and(|q| self.session.answer_for(q.id()).is_some());
        self.show_explanation = answered && !self.show_explanation;
    }

    /// Apply an intent through the quiz loop.
    ///
    /// Must be called from within a tokio runtime, since submitting starts persistence.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Incomplete` when submitting with unanswered questions and
    /// `ViewError::InvalidChoice` for letters the current question does not offer.
    pub fn apply(
        &mut self,
        quiz_loop: &QuizLoopService,
        intent: QuizIntent,
    ) -> Result<QuizVmOutcome, ViewError> {
        let step = quiz_loop.handle(&mut self.session, intent)?;
        match step.event {
            QuizEvent::AnswerRecorded { .. } | QuizEvent::Moved { .. } => {
                self.show_explanation = false;
                Ok(QuizVmOutcome::Continue)
            }
            QuizEvent::Submitted(result) => {
                self.show_explanation = false;
                self.stop_timer();
                let results = ResultsVm::new(&result, self.session.quiz().passing_threshold());
                Ok(QuizVmOutcome::Submitted {
                    results: Box::new(results),
                    persistence: step.persistence.unwrap_or_else(PersistenceTask::skipped),
                })
            }
            QuizEvent::Restarted => {
                self.show_explanation = false;
                if self.timed {
                    self.stop_timer();
                    self.timer = Some(QuizTimer::start());
                }
                Ok(QuizVmOutcome::Restarted)
            }
            QuizEvent::Ticked { .. } | QuizEvent::Ignored => Ok(QuizVmOutcome::Continue),
        }
    }

    /// Select the option at `letter` on the current question.
    ///
    /// # Errors
    ///
    /// See [`QuizVm::apply`].
    pub fn select(
        &mut self,
        quiz_loop: &QuizLoopService,
        letter: &str,
    ) -> Result<QuizVmOutcome, ViewError> {
        self.apply(
            quiz_loop,
            QuizIntent::SelectCurrent(OptionLetter::new(letter)),
        )
    }

    /// Returns `None` for a quiz without questions.
    #[must_use]
    pub fn screen(&self) -> Option<QuizScreenVm> {
        let session = &self.session;
        let question = session.current_question()?;
        let progress = session.progress();
        let total = progress.total;
        let selected = session.answer_for(question.id());

        Some(QuizScreenVm {
            title: session.quiz().title().to_string(),
            heading: format!("Question {} of {total}", progress.index + 1),
            progress_percent: progress_percent(progress.index, total),
            timer: format_elapsed(session.elapsed()),
            prompt: question.prompt().to_string(),
            options: options(question, selected),
            answered_line: format!("{} of {total} questions answered", progress.answered),
            can_toggle_explanation: selected.is_some(),
            explanation: (self.show_explanation && selected.is_some()).then(|| ExplanationVm {
                correct_answer: question.correct_answer().as_str().to_string(),
                text: question.explanation().to_string(),
            }),
            can_go_back: progress.index > 0,
            is_last: session.is_last_question(),
            submit_enabled: session.is_last_question() && session.all_answered(),
        })
    }
}

fn options(question: &Question, selected: Option<&OptionLetter>) -> Vec<OptionVm> {
    question
        .options()
        .iter()
        .zip(question.option_letters())
        .map(|(label, letter)| OptionVm {
            letter: letter.as_str().to_string(),
            label: label.clone(),
            selected: selected == Some(letter),
        })
        .collect()
}

/// `(index + 1) / total` as a whole percent.
#[must_use]
pub fn progress_percent(index: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let position = (index + 1).min(total);
    let percent = (position * 200 + total) / (total * 2);
    u32::try_from(percent).unwrap_or(100)
}

/// Load the module's quiz and wrap it for display with a running timer.
///
/// # Errors
///
/// Returns `ViewError::QuizNotFound` when the module has no quiz.
/// Returns `ViewError::Unknown` for other failures.
pub async fn start_quiz(
    quiz_loop: &QuizLoopService,
    course_id: &CourseId,
    module_id: &ModuleId,
    learner: Learner,
) -> Result<QuizVm, ViewError> {
    let session = quiz_loop.start_quiz(course_id, module_id, learner).await?;
    Ok(QuizVm::timed(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_counts_current_question() {
        assert_eq!(progress_percent(0, 4), 25);
        assert_eq!(progress_percent(3, 4), 100);
        assert_eq!(progress_percent(0, 3), 33);
        assert_eq!(progress_percent(1, 3), 67);
        assert_eq!(progress_percent(0, 0), 0);
    }
}
