use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::{
    AnswerRecord, AttemptResult, OptionLetter, Question, QuestionId, Quiz, UserId,
};
use crate::scoring::{ScoreReport, Scorer};
use crate::time::ElapsedTime;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("{} of {total} questions are unanswered", .missing.len())]
    Validation {
        missing: Vec<QuestionId>,
        total: usize,
    },

    #[error("unknown question: {0}")]
    UnknownQuestion(QuestionId),

    #[error("option {letter} is not valid for question {question_id}")]
    UnknownOption {
        question_id: QuestionId,
        letter: OptionLetter,
    },

    #[error("quiz has no questions")]
    NoQuestions,

    #[error("quiz already submitted")]
    Completed,

    #[error("quiz has not been submitted yet")]
    NotCompleted,
}

impl QuizSessionError {
    /// Submit was attempted with unanswered questions.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// A selection referenced a question or option outside the loaded set.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::UnknownQuestion(_) | Self::UnknownOption { .. } | Self::NoQuestions
        )
    }
}

//
// ─── LEARNER ───────────────────────────────────────────────────────────────────
//

/// Who is taking the quiz, as supplied by the authentication context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Learner {
    user_id: Option<UserId>,
}

impl Learner {
    #[must_use]
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    #[must_use]
    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }
}

/// Snapshot of navigation and answering progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub index: usize,
    pub total: usize,
    pub answered: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one quiz attempt.
///
/// All transitions go through `&mut self`; the session performs no I/O.
/// Once submitted, the answer record is frozen until `retake`.
pub struct QuizSession {
    quiz: Quiz,
    learner: Learner,
    current: usize,
    answers: AnswerRecord,
    elapsed: ElapsedTime,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    report: Option<ScoreReport>,
}

impl QuizSession {
    #[must_use]
    pub fn new(quiz: Quiz, learner: Learner, started_at: DateTime<Utc>) -> Self {
        Self {
            quiz,
            learner,
            current: 0,
            answers: AnswerRecord::new(),
            elapsed: ElapsedTime::ZERO,
            started_at,
            completed_at: None,
            report: None,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn learner(&self) -> &Learner {
        &self.learner
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions().get(self.current)
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 >= self.quiz.len()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question_id: &QuestionId) -> Option<&OptionLetter> {
        self.answers.get(question_id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Questions still lacking an answer, in quiz order.
    #[must_use]
    pub fn unanswered(&self) -> Vec<&QuestionId> {
        self.quiz
            .questions()
            .iter()
            .map(Question::id)
            .filter(|id| !self.answers.contains(id))
            .collect()
    }

    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.answers.len() == self.quiz.len()
    }

    #[must_use]
    pub fn elapsed(&self) -> ElapsedTime {
        self.elapsed
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Scoring output; present only once submitted.
    #[must_use]
    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn score_percent(&self) -> Option<f64> {
        self.report.as_ref().map(|r| r.score_percent)
    }

    #[must_use]
    pub fn passed(&self) -> Option<bool> {
        self.report
            .as_ref()
            .map(|r| r.passed(self.quiz.passing_threshold()))
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            index: self.current,
            total: self.quiz.len(),
            answered: self.answers.len(),
            is_complete: self.is_complete(),
        }
    }

    /// Record the selected option for a question, replacing any earlier choice.
    ///
    /// Returns the previously selected letter, if any. Does not move the index.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Completed` after submission,
    /// `QuizSessionError::UnknownQuestion` for an id outside the quiz, and
    /// `QuizSessionError::UnknownOption` for a letter the question does not offer.
    pub fn select_answer(
        &mut self,
        question_id: &QuestionId,
        letter: OptionLetter,
    ) -> Result<Option<OptionLetter>, QuizSessionError> {
        if self.is_complete() {
            return Err(QuizSessionError::Completed);
        }

        let question = self
            .quiz
            .question(question_id)
            .ok_or_else(|| QuizSessionError::UnknownQuestion(question_id.clone()))?;

        if !question.has_option(&letter) {
            return Err(QuizSessionError::UnknownOption {
                question_id: question_id.clone(),
                letter,
            });
        }

        Ok(self.answers.upsert(question_id.clone(), letter))
    }

    /// Select an option for the question under the cursor.
    ///
    /// # Errors
    ///
    /// Same as `select_answer`; an empty quiz yields `QuizSessionError::NoQuestions`.
    pub fn select_current(
        &mut self,
        letter: OptionLetter,
    ) -> Result<Option<OptionLetter>, QuizSessionError> {
        let Some(question_id) = self.current_question().map(|q| q.id().clone()) else {
            if self.is_complete() {
                return Err(QuizSessionError::Completed);
            }
            return Err(QuizSessionError::NoQuestions);
        };
        self.select_answer(&question_id, letter)
    }

    /// Move to the next question; stays put on the last one.
    pub fn advance(&mut self) -> usize {
        if self.current + 1 < self.quiz.len() {
            self.current += 1;
        }
        self.current
    }

    /// Move to the previous question; stays put on the first one.
    pub fn retreat(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// Add one second of elapsed time. Returns `false` once the session is complete.
    pub fn tick(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.elapsed = self.elapsed.tick();
        true
    }

    /// Catch elapsed time up to a wall-clock measurement. Never moves backwards.
    pub fn sync_elapsed(&mut self, measured: ElapsedTime) -> bool {
        if self.is_complete() || measured <= self.elapsed {
            return false;
        }
        self.elapsed = measured;
        true
    }

    /// Score the attempt and freeze the session.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Validation` listing unanswered questions, or
    /// `QuizSessionError::Completed` if already submitted.
    pub fn submit(&mut self, submitted_at: DateTime<Utc>) -> Result<AttemptResult, QuizSessionError> {
        if self.is_complete() {
            return Err(QuizSessionError::Completed);
        }

        let missing: Vec<QuestionId> = self.unanswered().into_iter().cloned().collect();
        if !missing.is_empty() {
            return Err(QuizSessionError::Validation {
                missing,
                total: self.quiz.len(),
            });
        }

        let report = Scorer::score(self.quiz.questions(), &self.answers);
        let result = self.build_result(&report, submitted_at);

        self.report = Some(report);
        self.completed_at = Some(submitted_at);

        Ok(result)
    }

    /// Rebuild the attempt result of a submitted session.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::NotCompleted` before submission.
    pub fn attempt_result(&self) -> Result<AttemptResult, QuizSessionError> {
        let (Some(report), Some(completed_at)) = (self.report.as_ref(), self.completed_at) else {
            return Err(QuizSessionError::NotCompleted);
        };
        Ok(self.build_result(report, completed_at))
    }

    /// Start over with the same questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::NotCompleted` if the attempt was never submitted.
    pub fn retake(&mut self, started_at: DateTime<Utc>) -> Result<(), QuizSessionError> {
        if !self.is_complete() {
            return Err(QuizSessionError::NotCompleted);
        }
        self.current = 0;
        self.answers.clear();
        self.elapsed = ElapsedTime::ZERO;
        self.started_at = started_at;
        self.completed_at = None;
        self.report = None;
        Ok(())
    }

    fn build_result(&self, report: &ScoreReport, submitted_at: DateTime<Utc>) -> AttemptResult {
        AttemptResult {
            user_id: self.learner.user_id().cloned(),
            course_id: self.quiz.course_id().clone(),
            module_id: self.quiz.module_id().clone(),
            quiz_id: self.quiz.id().clone(),
            total_questions: report.total,
            correct_answers: report.correct_count,
            score_percent: report.score_percent,
            elapsed: self.elapsed,
            passed: report.passed(self.quiz.passing_threshold()),
            outcomes: report.outcomes.clone(),
            submitted_at,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", self.quiz.id())
            .field("questions_len", &self.quiz.len())
            .field("current", &self.current)
            .field("answered", &self.answers.len())
            .field("elapsed", &self.elapsed)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseId, ModuleId, QuestionDraft, QuestionKind};
    use crate::time::fixed_now;

    fn draft(id: &str, correct: &str) -> QuestionDraft {
        QuestionDraft {
            id: id.into(),
            kind: QuestionKind::MultipleChoice,
            prompt: format!("Prompt {id}"),
            options: vec!["A) a".into(), "B) b".into(), "C) c".into(), "D) d".into()],
            correct_answer: correct.into(),
            explanation: format!("Explanation {id}"),
        }
    }

    fn build_quiz(correct: &[&str]) -> Quiz {
        let drafts = correct
            .iter()
            .enumerate()
            .map(|(i, c)| draft(&format!("q{}", i + 1), c));
        Quiz::from_drafts(CourseId::new("ftce"), ModuleId::new("m1"), drafts).unwrap()
    }

    fn session(correct: &[&str]) -> QuizSession {
        QuizSession::new(
            build_quiz(correct),
            Learner::authenticated(UserId::new("u1")),
            fixed_now(),
        )
    }

    fn q(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    fn l(letter: &str) -> OptionLetter {
        OptionLetter::new(letter)
    }

    #[test]
    fn new_session_starts_zeroed() {
        let s = session(&["A", "B"]);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.answered_count(), 0);
        assert_eq!(s.elapsed(), ElapsedTime::ZERO);
        assert!(!s.is_complete());
        assert!(s.score_percent().is_none());
    }

    #[test]
    fn select_answer_overwrites_and_keeps_index() {
        let mut s = session(&["A", "B"]);
        assert_eq!(s.select_answer(&q("q2"), l("A")).unwrap(), None);
        assert_eq!(s.select_answer(&q("q2"), l("A")).unwrap(), Some(l("A")));
        assert_eq!(s.select_answer(&q("q2"), l("C")).unwrap(), Some(l("A")));
        assert_eq!(s.answer_for(&q("q2")), Some(&l("C")));
        assert_eq!(s.answered_count(), 1);
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn select_answer_rejects_unknown_question_and_option() {
        let mut s = session(&["A"]);
        let err = s.select_answer(&q("q9"), l("A")).unwrap_err();
        assert!(err.is_out_of_range());
        let err = s.select_answer(&q("q1"), l("E")).unwrap_err();
        assert!(matches!(err, QuizSessionError::UnknownOption { .. }));
        assert_eq!(s.answered_count(), 0);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut s = session(&["A", "B", "C"]);
        assert_eq!(s.retreat(), 0);
        assert_eq!(s.advance(), 1);
        assert_eq!(s.advance(), 2);
        assert!(s.is_last_question());
        assert_eq!(s.advance(), 2);
        assert_eq!(s.retreat(), 1);
    }

    #[test]
    fn navigation_on_empty_quiz_stays_at_zero() {
        let mut s = session(&[]);
        assert_eq!(s.advance(), 0);
        assert_eq!(s.retreat(), 0);
        assert!(s.current_question().is_none());
    }

    #[test]
    fn submit_requires_all_answers() {
        let mut s = session(&["B", "A"]);
        s.select_answer(&q("q1"), l("B")).unwrap();
        let err = s.submit(fixed_now()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err,
            QuizSessionError::Validation {
                missing: vec![q("q2")],
                total: 2
            }
        );
        assert!(!s.is_complete());
    }

    #[test]
    fn submit_scores_half_correct_attempt() {
        let mut s = session(&["B", "A"]);
        s.select_answer(&q("q1"), l("B")).unwrap();
        s.select_answer(&q("q2"), l("C")).unwrap();
        let result = s.submit(fixed_now()).unwrap();

        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.total_questions, 2);
        assert_eq!(result.score_percent, 50.0);
        assert!(!result.passed);
        assert_eq!(result.user_id, Some(UserId::new("u1")));
        assert_eq!(result.quiz_id.as_str(), "m1-quiz");
        assert!(s.is_complete());
        assert_eq!(s.score_percent(), Some(50.0));
        assert_eq!(s.passed(), Some(false));
    }

    #[test]
    fn submit_all_correct_passes() {
        let mut s = session(&["A", "B", "C", "D"]);
        for (id, letter) in [("q1", "A"), ("q2", "B"), ("q3", "C"), ("q4", "D")] {
            s.select_answer(&q(id), l(letter)).unwrap();
        }
        let result = s.submit(fixed_now()).unwrap();
        assert_eq!(result.score_percent, 100.0);
        assert!(result.passed);
    }

    #[test]
    fn submit_empty_quiz_scores_zero() {
        let mut s = session(&[]);
        let result = s.submit(fixed_now()).unwrap();
        assert_eq!(result.score_percent, 0.0);
        assert!(!result.passed);
    }

    #[test]
    fn completion_freezes_answers_and_time() {
        let mut s = session(&["A"]);
        s.select_answer(&q("q1"), l("A")).unwrap();
        assert!(s.tick());
        s.submit(fixed_now()).unwrap();

        let err = s.select_answer(&q("q1"), l("B")).unwrap_err();
        assert_eq!(err, QuizSessionError::Completed);
        assert!(!s.tick());
        assert!(!s.sync_elapsed(ElapsedTime::from_secs(500)));
        assert_eq!(s.elapsed(), ElapsedTime::from_secs(1));
        assert_eq!(s.submit(fixed_now()).unwrap_err(), QuizSessionError::Completed);
    }

    #[test]
    fn elapsed_is_monotonic() {
        let mut s = session(&["A"]);
        assert!(s.sync_elapsed(ElapsedTime::from_secs(10)));
        assert!(!s.sync_elapsed(ElapsedTime::from_secs(4)));
        assert!(s.tick());
        assert_eq!(s.elapsed(), ElapsedTime::from_secs(11));
    }

    #[test]
    fn retake_requires_completion_and_resets_state() {
        let mut s = session(&["A", "B"]);
        assert_eq!(s.retake(fixed_now()).unwrap_err(), QuizSessionError::NotCompleted);

        s.select_answer(&q("q1"), l("A")).unwrap();
        s.select_answer(&q("q2"), l("B")).unwrap();
        s.advance();
        s.tick();
        s.submit(fixed_now()).unwrap();

        s.retake(fixed_now()).unwrap();
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.answered_count(), 0);
        assert_eq!(s.elapsed(), ElapsedTime::ZERO);
        assert!(!s.is_complete());
        assert!(s.score_percent().is_none());
        assert_eq!(s.quiz().len(), 2);
    }

    #[test]
    fn attempt_result_available_only_after_submit() {
        let mut s = session(&["A"]);
        assert_eq!(s.attempt_result().unwrap_err(), QuizSessionError::NotCompleted);
        s.select_current(l("A")).unwrap();
        let submitted = s.submit(fixed_now()).unwrap();
        assert_eq!(s.attempt_result().unwrap(), submitted);
    }

    #[test]
    fn anonymous_learner_produces_anonymous_result() {
        let mut s = QuizSession::new(build_quiz(&["A"]), Learner::anonymous(), fixed_now());
        s.select_current(l("A")).unwrap();
        let result = s.submit(fixed_now()).unwrap();
        assert!(result.is_anonymous());
    }
}
