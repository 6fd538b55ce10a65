//! One run through a quiz, one question at a time.
//!
//! Each question moves through three states:
//!
//! ```text
//! Unanswered ──select──▶ Selected ──submit──▶ Answered ──advance──▶ next question
//!                 ▲   │                                      └──▶ Complete (last)
//!                 └───┘ select again
//! ```
//!
//! Navigation only goes forward. Rejected operations return a
//! [`TransitionError`] and leave the session untouched.

use crate::error::TransitionError;
use crate::model::{AnswerRecord, Question, QuizDocument, QuizResult};
use std::sync::Arc;
use tracing::debug;

/// Per-question answer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerState {
    #[default]
    Unanswered,
    Selected(usize),
    Answered { index: usize, correct: bool },
}

/// What [`QuizSession::advance`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to the question at this 0-based index.
    Next(usize),
    /// The last question was finished; the session is now terminal.
    Complete(QuizResult),
}

/// State of a quiz in progress.
#[derive(Debug, Clone)]
pub struct QuizSession {
    document: Arc<QuizDocument>,
    current: usize,
    state: AnswerState,
    answers: Vec<AnswerRecord>,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// Start at the first question.
    ///
    /// A [`QuizDocument`] always holds at least one question, so there is
    /// always a current question.
    pub fn new(document: Arc<QuizDocument>) -> Self {
        Self {
            document,
            current: 0,
            state: AnswerState::Unanswered,
            answers: Vec::new(),
            result: None,
        }
    }

    pub fn document(&self) -> &QuizDocument {
        &self.document
    }

    pub fn total(&self) -> usize {
        self.document.len()
    }

    /// 0-based index of the current question.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// 1-based number for "Question X of N".
    pub fn current_number(&self) -> usize {
        self.current + 1
    }

    pub fn current_question(&self) -> &Question {
        &self.document.questions()[self.current]
    }

    pub fn state(&self) -> AnswerState {
        self.state
    }

    /// The option currently chosen (selected or committed).
    pub fn selected(&self) -> Option<usize> {
        match self.state {
            AnswerState::Unanswered => None,
            AnswerState::Selected(i) | AnswerState::Answered { index: i, .. } => Some(i),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self.state, AnswerState::Answered { .. })
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.total()
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Fraction of questions started before the current one (0.0 at the start).
    pub fn progress(&self) -> f64 {
        self.current as f64 / self.total() as f64
    }

    /// Answers committed so far, in question order.
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// The record for the current question once it has been committed.
    pub fn last_answer(&self) -> Option<&AnswerRecord> {
        if self.is_answered() {
            self.answers.last()
        } else {
            None
        }
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// Choose an option for the current question. Re-selecting is allowed
    /// until the answer is committed.
    pub fn select(&mut self, index: usize) -> Result<(), TransitionError> {
        if self.is_complete() {
            return Err(TransitionError::SessionComplete);
        }
        if self.is_answered() {
            return Err(TransitionError::AlreadyAnswered);
        }
        let len = self.current_question().options().len();
        if index >= len {
            return Err(TransitionError::OptionOutOfRange { index, len });
        }
        self.state = AnswerState::Selected(index);
        Ok(())
    }

    /// Commit the selected option and record whether it was correct.
    pub fn submit(&mut self) -> Result<&AnswerRecord, TransitionError> {
        if self.is_complete() {
            return Err(TransitionError::SessionComplete);
        }
        let index = match self.state {
            AnswerState::Unanswered => return Err(TransitionError::NoSelection),
            AnswerState::Answered { .. } => return Err(TransitionError::AlreadyAnswered),
            AnswerState::Selected(i) => i,
        };

        let question = self.current_question();
        let correct = index == question.correct_answer_index();
        let record = AnswerRecord {
            question_id: question.id().to_string(),
            user_answer_index: index,
            is_correct: correct,
        };
        debug!(
            "Question {}/{} answered with {} ({})",
            self.current_number(),
            self.total(),
            index,
            if correct { "correct" } else { "incorrect" }
        );

        self.state = AnswerState::Answered { index, correct };
        self.answers.push(record);
        Ok(&self.answers[self.answers.len() - 1])
    }

    /// Move past an answered question, finishing the session after the last.
    pub fn advance(&mut self) -> Result<Advance, TransitionError> {
        if self.is_complete() {
            return Err(TransitionError::SessionComplete);
        }
        if !self.is_answered() {
            return Err(TransitionError::NotAnswered);
        }

        if !self.is_last() {
            self.current += 1;
            self.state = AnswerState::Unanswered;
            return Ok(Advance::Next(self.current));
        }

        // One record per question: answers only grow on submit, once per question.
        let result = QuizResult::tally(self.answers.clone(), self.total());
        debug!("Session complete: {}/{}", result.score(), result.total());
        self.result = Some(result.clone());
        Ok(Advance::Complete(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(correct: &[usize]) -> Arc<QuizDocument> {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Question::new(
                    format!("q-t-{i}"),
                    format!("Question {i}"),
                    ["w".into(), "x".into(), "y".into(), "z".into()],
                    c,
                    "",
                )
                .unwrap()
            })
            .collect();
        Arc::new(QuizDocument::new("Test", questions).unwrap())
    }

    fn answer(session: &mut QuizSession, index: usize) -> Advance {
        session.select(index).unwrap();
        session.submit().unwrap();
        session.advance().unwrap()
    }

    #[test]
    fn submit_without_selection_records_nothing() {
        let mut s = QuizSession::new(document(&[0, 1]));
        assert_eq!(s.submit().unwrap_err(), TransitionError::NoSelection);
        assert!(s.answers().is_empty());
        assert_eq!(s.state(), AnswerState::Unanswered);
    }

    #[test]
    fn reselect_before_commit_then_lock() {
        let mut s = QuizSession::new(document(&[2]));
        s.select(0).unwrap();
        s.select(2).unwrap();
        assert_eq!(s.state(), AnswerState::Selected(2));

        let record = s.submit().unwrap().clone();
        assert!(record.is_correct);
        assert_eq!(record.user_answer_index, 2);

        assert_eq!(s.select(1).unwrap_err(), TransitionError::AlreadyAnswered);
        assert_eq!(s.selected(), Some(2));
        assert_eq!(s.submit().unwrap_err(), TransitionError::AlreadyAnswered);
        assert_eq!(s.answers().len(), 1);
    }

    #[test]
    fn select_out_of_range_is_rejected() {
        let mut s = QuizSession::new(document(&[0]));
        assert_eq!(
            s.select(4).unwrap_err(),
            TransitionError::OptionOutOfRange { index: 4, len: 4 }
        );
        assert_eq!(s.state(), AnswerState::Unanswered);
    }

    #[test]
    fn advance_requires_commit() {
        let mut s = QuizSession::new(document(&[0, 0]));
        assert_eq!(s.advance().unwrap_err(), TransitionError::NotAnswered);
        s.select(1).unwrap();
        assert_eq!(s.advance().unwrap_err(), TransitionError::NotAnswered);
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn single_question_completes_on_first_advance() {
        let mut s = QuizSession::new(document(&[3]));
        match answer(&mut s, 3) {
            Advance::Complete(r) => {
                assert_eq!((r.score(), r.total()), (1, 1));
                assert_eq!(r.details().len(), 1);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(s.is_complete());
    }

    #[test]
    fn mixed_answers_score_in_order() {
        let mut s = QuizSession::new(document(&[0, 1, 2]));
        assert_eq!(s.progress(), 0.0);
        assert_eq!(answer(&mut s, 0), Advance::Next(1));
        assert_eq!(s.state(), AnswerState::Unanswered);
        assert!((s.progress() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(answer(&mut s, 3), Advance::Next(2));
        assert!(s.is_last());

        let Advance::Complete(result) = answer(&mut s, 2) else {
            panic!("expected completion");
        };
        assert_eq!(result.score(), 2);
        assert_eq!(result.total(), 3);
        assert_eq!(result.percentage(), 67);
        let flags: Vec<bool> = result.details().iter().map(|d| d.is_correct).collect();
        assert_eq!(flags, vec![true, false, true]);
        let ids: Vec<&str> = result.details().iter().map(|d| d.question_id.as_str()).collect();
        assert_eq!(ids, vec!["q-t-0", "q-t-1", "q-t-2"]);
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let correct = [1, 3, 0, 2, 2];
        let mut s = QuizSession::new(document(&correct));
        let mut last = None;
        for &c in &correct {
            last = Some(answer(&mut s, c));
        }
        let Some(Advance::Complete(r)) = last else {
            panic!("expected completion");
        };
        assert_eq!(r.score(), correct.len());
        assert_eq!(r.total(), correct.len());
        assert!(r.score() <= r.total());
        assert_eq!(r.details().len(), r.total());
    }

    #[test]
    fn terminal_session_ignores_further_operations() {
        let mut s = QuizSession::new(document(&[0]));
        answer(&mut s, 1);
        let before = s.result().cloned();

        for _ in 0..3 {
            assert_eq!(s.advance().unwrap_err(), TransitionError::SessionComplete);
        }
        assert_eq!(s.select(0).unwrap_err(), TransitionError::SessionComplete);
        assert_eq!(s.submit().unwrap_err(), TransitionError::SessionComplete);
        assert_eq!(s.result().cloned(), before);
        assert_eq!(s.answers().len(), 1);
    }

    #[test]
    fn last_answer_only_after_commit() {
        let mut s = QuizSession::new(document(&[1, 1]));
        s.select(0).unwrap();
        assert!(s.last_answer().is_none());
        s.submit().unwrap();
        assert!(!s.last_answer().unwrap().is_correct);
        s.advance().unwrap();
        assert!(s.last_answer().is_none());
    }
}
