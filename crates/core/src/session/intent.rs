use chrono::{DateTime, Utc};

use crate::model::{AttemptResult, OptionLetter, QuestionId};
use crate::time::ElapsedTime;

use super::controller::{QuizSession, QuizSessionError};

/// Something the learner (or the timer) asked the quiz to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizIntent {
    Select {
        question_id: QuestionId,
        letter: OptionLetter,
    },
    SelectCurrent(OptionLetter),
    Next,
    Previous,
    Tick,
    Submit,
    Retake,
}

/// The transition a dispatched intent produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    AnswerRecorded {
        question_id: QuestionId,
        letter: OptionLetter,
        replaced: Option<OptionLetter>,
    },
    Moved {
        index: usize,
    },
    Ticked {
        elapsed: ElapsedTime,
    },
    /// The intent was valid but changed nothing (tick after completion).
    Ignored,
    Submitted(Box<AttemptResult>),
    Restarted,
}

impl QuizSession {
    /// Apply one intent. `now` stamps submissions and restarts.
    ///
    /// # Errors
    ///
    /// Propagates the `QuizSessionError` of the underlying transition; the session
    /// is left unchanged when an error is returned.
    pub fn dispatch(
        &mut self,
        intent: QuizIntent,
        now: DateTime<Utc>,
    ) -> Result<QuizEvent, QuizSessionError> {
        match intent {
            QuizIntent::Select {
                question_id,
                letter,
            } => {
                let replaced = self.select_answer(&question_id, letter.clone())?;
                Ok(QuizEvent::AnswerRecorded {
                    question_id,
                    letter,
                    replaced,
                })
            }
            QuizIntent::SelectCurrent(letter) => {
                let question_id = self
                    .current_question()
                    .map(|q| q.id().clone())
                    .ok_or(QuizSessionError::NoQuestions)?;
                self.dispatch(
                    QuizIntent::Select {
                        question_id,
                        letter,
                    },
                    now,
                )
            }
            QuizIntent::Next => Ok(QuizEvent::Moved {
                index: self.advance(),
            }),
            QuizIntent::Previous => Ok(QuizEvent::Moved {
                index: self.retreat(),
            }),
            QuizIntent::Tick => {
                if self.tick() {
                    Ok(QuizEvent::Ticked {
                        elapsed: self.elapsed(),
                    })
                } else {
                    Ok(QuizEvent::Ignored)
                }
            }
            QuizIntent::Submit => self
                .submit(now)
                .map(|result| QuizEvent::Submitted(Box::new(result))),
            QuizIntent::Retake => {
                self.retake(now)?;
                Ok(QuizEvent::Restarted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseId, ModuleId, Quiz, QuestionDraft, QuestionKind};
    use crate::session::Learner;
    use crate::time::fixed_now;

    fn session() -> QuizSession {
        let drafts = ["B", "A"].iter().enumerate().map(|(i, c)| QuestionDraft {
            id: format!("q{}", i + 1),
            kind: QuestionKind::MultipleChoice,
            prompt: "Prompt".into(),
            options: vec!["A) a".into(), "B) b".into(), "C) c".into()],
            correct_answer: (*c).into(),
            explanation: String::new(),
        });
        let quiz = Quiz::from_drafts(CourseId::new("c"), ModuleId::new("m"), drafts).unwrap();
        QuizSession::new(quiz, Learner::anonymous(), fixed_now())
    }

    #[test]
    fn dispatch_drives_full_attempt() {
        let mut s = session();
        let now = fixed_now();

        let ev = s
            .dispatch(QuizIntent::SelectCurrent(OptionLetter::new("B")), now)
            .unwrap();
        assert!(matches!(ev, QuizEvent::AnswerRecorded { replaced: None, .. }));

        assert_eq!(
            s.dispatch(QuizIntent::Next, now).unwrap(),
            QuizEvent::Moved { index: 1 }
        );
        s.dispatch(QuizIntent::SelectCurrent(OptionLetter::new("C")), now)
            .unwrap();
        assert_eq!(
            s.dispatch(QuizIntent::Tick, now).unwrap(),
            QuizEvent::Ticked {
                elapsed: ElapsedTime::from_secs(1)
            }
        );

        let QuizEvent::Submitted(result) = s.dispatch(QuizIntent::Submit, now).unwrap() else {
            panic!("expected submission");
        };
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.score_percent, 50.0);
        assert!(!result.passed);

        assert_eq!(s.dispatch(QuizIntent::Tick, now).unwrap(), QuizEvent::Ignored);
        assert_eq!(s.dispatch(QuizIntent::Retake, now).unwrap(), QuizEvent::Restarted);
        assert_eq!(s.answered_count(), 0);
    }

    #[test]
    fn dispatch_submit_with_gaps_is_rejected() {
        let mut s = session();
        let err = s.dispatch(QuizIntent::Submit, fixed_now()).unwrap_err();
        assert!(err.is_validation());
        assert!(!s.is_complete());
    }
}
