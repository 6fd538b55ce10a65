//! Quiz data types: questions, the extracted document, and scoring output.
//!
//! [`Question`] and [`QuizDocument`] are only built through their validating
//! constructors (normally by [`crate::pipeline::parse`]) and never mutated
//! afterwards: every question has a valid answer index and every document
//! has at least one question. [`AnswerRecord`]s are appended by
//! [`crate::session::QuizSession`]; [`QuizResult`] is derived from them when
//! the last question is finished.

use crate::error::QuizError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Number of options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Title used when the extraction service does not provide one.
pub const DEFAULT_TITLE: &str = "Generated Quiz";

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: String,
    text: String,
    options: [String; OPTION_COUNT],
    correct_answer_index: usize,
    explanation: String,
}

impl Question {
    /// Build a question.
    ///
    /// # Errors
    /// [`QuizError::InvalidQuiz`] when `id` is blank or
    /// `correct_answer_index` does not address one of the options.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_answer_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuizError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(QuizError::InvalidQuiz("question id must not be empty".into()));
        }
        if correct_answer_index >= OPTION_COUNT {
            return Err(QuizError::InvalidQuiz(format!(
                "question {id}: correct answer index {correct_answer_index} is not in 0..{OPTION_COUNT}"
            )));
        }
        Ok(Self {
            id,
            text: text.into(),
            options,
            correct_answer_index,
            explanation: explanation.into(),
        })
    }

    /// Unique within its [`QuizDocument`]; joins answers to questions.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// Always a valid index into [`options`](Self::options).
    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Text of the correct option.
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer_index]
    }

    /// Text of the option at `index`, if it exists.
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}

/// A successfully extracted quiz. Never empty; question ids are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDocument {
    title: String,
    questions: Vec<Question>,
}

impl QuizDocument {
    /// Build a document from validated questions.
    ///
    /// # Errors
    /// - [`QuizError::EmptyResult`] when `questions` is empty
    /// - [`QuizError::InvalidQuiz`] when two questions share an id
    pub fn new(title: impl Into<String>, questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyResult);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        if let Some(dup) = questions.iter().find(|q| !seen.insert(q.id.as_str())) {
            return Err(QuizError::InvalidQuiz(format!("duplicate question id {}", dup.id)));
        }
        Ok(Self {
            title: title.into(),
            questions,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// A committed answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    pub user_answer_index: usize,
    pub is_correct: bool,
}

/// Outcome of a finished session. `score <= total` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    score: usize,
    total: usize,
    details: Vec<AnswerRecord>,
}

impl QuizResult {
    /// Score the answers of a session with `total` questions.
    ///
    /// # Errors
    /// [`QuizError::InvalidQuiz`] when there are more records than questions.
    pub fn from_answers(details: Vec<AnswerRecord>, total: usize) -> Result<Self, QuizError> {
        if details.len() > total {
            return Err(QuizError::InvalidQuiz(format!(
                "{} answers recorded for {} questions",
                details.len(),
                total
            )));
        }
        Ok(Self::tally(details, total))
    }

    /// Score without the length check; `details.len() <= total` must hold.
    pub(crate) fn tally(details: Vec<AnswerRecord>, total: usize) -> Self {
        let score = details.iter().filter(|a| a.is_correct).count();
        Self {
            score,
            total,
            details,
        }
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// One record per answered question, in question order.
    pub fn details(&self) -> &[AnswerRecord] {
        &self.details
    }

    pub fn incorrect(&self) -> usize {
        self.total.saturating_sub(self.score)
    }

    /// Score as a whole percentage, rounding halves up.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.score * 200 + self.total) / (self.total * 2)) as u32
    }

    /// Join every question of `document` with its recorded answer, in order.
    pub fn review<'a>(&'a self, document: &'a QuizDocument) -> Vec<ReviewItem<'a>> {
        document
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| ReviewItem {
                number: i + 1,
                question,
                answer: self.details.iter().find(|d| d.question_id == question.id),
            })
            .collect()
    }
}

/// One row of the results screen's detailed review.
#[derive(Debug, Clone, Copy)]
pub struct ReviewItem<'a> {
    /// 1-based position in the quiz.
    pub number: usize,
    pub question: &'a Question,
    pub answer: Option<&'a AnswerRecord>,
}

impl<'a> ReviewItem<'a> {
    pub fn is_correct(&self) -> bool {
        self.answer.is_some_and(|a| a.is_correct)
    }

    /// Text of the option the user committed to.
    pub fn user_answer(&self) -> Option<&'a str> {
        self.answer
            .and_then(|a| self.question.option(a.user_answer_index))
    }

    pub fn correct_answer(&self) -> &'a str {
        self.question.correct_option()
    }

    /// Explanation worth showing on review: only for missed questions.
    pub fn explanation(&self) -> Option<&'a str> {
        let text = self.question.explanation.as_str();
        (!self.is_correct() && !text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; OPTION_COUNT] {
        ["A".into(), "B".into(), "C".into(), "D".into()]
    }

    fn question(id: &str, correct: usize) -> Question {
        Question::new(id, format!("Question {id}?"), options(), correct, format!("Because {id}"))
            .unwrap()
    }

    fn record(id: &str, answer: usize, correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: id.into(),
            user_answer_index: answer,
            is_correct: correct,
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        let r = QuizResult::from_answers(
            vec![record("a", 0, true), record("b", 0, false), record("c", 0, true)],
            3,
        )
        .unwrap();
        assert_eq!(r.score(), 2);
        assert_eq!(r.percentage(), 67);

        let r = QuizResult::from_answers(vec![record("a", 0, true), record("b", 1, false)], 2)
            .unwrap();
        assert_eq!(r.percentage(), 50);

        let r = QuizResult::from_answers(
            (0..8).map(|i| record(&i.to_string(), 0, i == 0)).collect(),
            8,
        )
        .unwrap();
        // 12.5 rounds up
        assert_eq!(r.percentage(), 13);
        assert_eq!(r.incorrect(), 7);
    }

    #[test]
    fn more_answers_than_questions_is_rejected() {
        let err = QuizResult::from_answers(vec![record("a", 0, true), record("b", 0, true)], 1)
            .unwrap_err();
        assert!(matches!(err, QuizError::InvalidQuiz(_)), "got {err:?}");

        let r = QuizResult::from_answers(Vec::new(), 0).unwrap();
        assert_eq!(r.incorrect(), 0);
        assert_eq!(r.percentage(), 0);
    }

    #[test]
    fn answer_index_must_address_an_option() {
        let err = Question::new("q-1-0", "Pick one", options(), 9, "").unwrap_err();
        assert!(matches!(err, QuizError::InvalidQuiz(_)), "got {err:?}");
        assert!(Question::new("q-1-0", "Pick one", options(), 3, "").is_ok());
        assert!(Question::new("  ", "Pick one", options(), 0, "").is_err());
    }

    #[test]
    fn document_needs_distinct_questions() {
        assert!(matches!(QuizDocument::new("T", Vec::new()), Err(QuizError::EmptyResult)));

        let err = QuizDocument::new("T", vec![question("q1", 0), question("q1", 1)]).unwrap_err();
        assert!(matches!(err, QuizError::InvalidQuiz(_)), "got {err:?}");

        let doc = QuizDocument::new("T", vec![question("q1", 0), question("q2", 1)]).unwrap();
        assert_eq!(doc.len(), 2);
        assert!(!doc.is_empty());
        assert_eq!(doc.questions()[1].correct_option(), "B");
    }

    #[test]
    fn review_joins_in_question_order() {
        let doc = QuizDocument::new("T", vec![question("q1", 2), question("q2", 0)]).unwrap();
        let r = QuizResult::from_answers(vec![record("q1", 2, true), record("q2", 3, false)], 2)
            .unwrap();

        let items = r.review(&doc);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].number, 1);
        assert!(items[0].is_correct());
        assert_eq!(items[0].user_answer(), Some("C"));
        assert_eq!(items[0].explanation(), None);

        assert!(!items[1].is_correct());
        assert_eq!(items[1].user_answer(), Some("D"));
        assert_eq!(items[1].correct_answer(), "A");
        assert_eq!(items[1].explanation(), Some("Because q2"));
    }

    #[test]
    fn serialises_with_camel_case_fields() {
        let json = serde_json::to_value(question("q-1-0", 1)).unwrap();
        assert_eq!(json["correctAnswerIndex"], 1);
        assert_eq!(json["options"].as_array().unwrap().len(), OPTION_COUNT);
    }
}
