//! Reply parsing: validate the service payload and build a [`QuizDocument`].
//!
//! The payload is external input. Even with a declared response schema the
//! model can wrap its JSON in Markdown fences, drop a field, or emit three
//! options instead of four. Every such deviation fails the whole extraction
//! with [`QuizError::MalformedResponse`]; a partial quiz is never produced.
//!
//! ## Steps
//!
//! 1. Strip an outer ```` ```json ```` fence if present
//! 2. Deserialise into a loose shape (all fields optional)
//! 3. Check required fields, option count, and answer index per question
//! 4. Reject an empty question list ([`QuizError::EmptyResult`])
//! 5. Default a missing or blank title to [`DEFAULT_TITLE`]
//! 6. Assign ids that are unique across every extraction in the process

use crate::error::QuizError;
use crate::model::{Question, QuizDocument, DEFAULT_TITLE, OPTION_COUNT};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static EXTRACTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Issue the id prefix for one extraction. Monotonic for the process lifetime.
fn next_extraction_id() -> u64 {
    EXTRACTION_SEQ.fetch_add(1, Ordering::Relaxed)
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*(.*?)\s*```\s*$").unwrap());

fn strip_json_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => trimmed,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuiz {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    correct_answer_index: Option<Value>,
    #[serde(default)]
    explanation: Option<String>,
}

fn malformed(detail: impl Into<String>) -> QuizError {
    QuizError::MalformedResponse {
        detail: detail.into(),
    }
}

/// Parse a reply payload into a quiz.
pub fn parse_quiz(payload: &str) -> Result<QuizDocument, QuizError> {
    let body = strip_json_fences(payload);
    if body.is_empty() {
        return Err(QuizError::EmptyResponse);
    }

    let raw: RawQuiz =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

    let raw_questions = raw
        .questions
        .ok_or_else(|| malformed("missing required field `questions`"))?;
    if raw_questions.is_empty() {
        return Err(QuizError::EmptyResult);
    }

    let extraction = next_extraction_id();
    let questions = raw_questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| validate_question(q, i, extraction))
        .collect::<Result<Vec<_>, _>>()?;

    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    debug!("Parsed quiz '{}' with {} questions", title, questions.len());
    QuizDocument::new(title, questions).map_err(|e| match e {
        QuizError::InvalidQuiz(detail) => malformed(detail),
        other => other,
    })
}

fn validate_question(raw: RawQuestion, index: usize, extraction: u64) -> Result<Question, QuizError> {
    let number = index + 1;
    let field = |name: &str| malformed(format!("question {number}: missing required field `{name}`"));

    let text = raw.text.ok_or_else(|| field("text"))?.trim().to_string();
    let options = raw.options.ok_or_else(|| field("options"))?;
    let answer = raw
        .correct_answer_index
        .ok_or_else(|| field("correctAnswerIndex"))?;
    let explanation = raw
        .explanation
        .ok_or_else(|| field("explanation"))?
        .trim()
        .to_string();

    let options: [String; OPTION_COUNT] = options
        .into_iter()
        .map(|o| o.trim().to_string())
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|v: Vec<String>| {
            malformed(format!(
                "question {number}: expected {OPTION_COUNT} options, got {}",
                v.len()
            ))
        })?;

    let correct_answer_index = answer
        .as_u64()
        .map(|i| i as usize)
        .filter(|&i| i < OPTION_COUNT)
        .ok_or_else(|| {
            malformed(format!(
                "question {number}: correctAnswerIndex must be an integer in 0..{OPTION_COUNT}, got {answer}"
            ))
        })?;

    Question::new(
        format!("q-{extraction}-{index}"),
        text,
        options,
        correct_answer_index,
        explanation,
    )
    .map_err(|e| malformed(format!("question {number}: {e}")))
}
