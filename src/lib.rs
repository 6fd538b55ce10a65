//! # flashquiz
//!
//! Turn PDF exam papers into interactive multiple-choice quizzes.
//!
//! The PDFs are sent, as one batch, to Gemini with a fixed response schema.
//! The model extracts every MCQ (using the document's answer key when there
//! is one, solving the question itself otherwise) and the reply becomes a
//! [`QuizDocument`]. A [`QuizSession`] then walks the user through it one
//! question at a time and scores the result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs
//!  │
//!  ├─ 1. Select  ordered, PDF-only file list (removable before submit)
//!  ├─ 2. Encode  file bytes → base64 inline parts
//!  ├─ 3. Extract one generateContent call with schema + instruction
//!  ├─ 4. Parse   validate reply, default title, assign question ids
//!  ├─ 5. Quiz    select → check → next, strictly forward
//!  └─ 6. Results score, percentage, per-question review
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flashquiz::{extract_quiz, ExtractionConfig, QuizSession};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GEMINI_API_KEY (or API_KEY)
//!     let config = ExtractionConfig::from_env();
//!     let quiz = extract_quiz(&["exam.pdf"], &config).await?;
//!
//!     let mut session = QuizSession::new(Arc::new(quiz));
//!     session.select(0)?;
//!     let record = session.submit()?;
//!     println!("correct: {}", record.is_correct);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `flashquiz` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use app::{QuizApp, Screen};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{QuizError, TransitionError, PROCESSING_FAILED_MESSAGE};
pub use extract::{extract_quiz, extract_quiz_to_file, write_quiz_json, Extractor};
pub use model::{AnswerRecord, Question, QuizDocument, QuizResult, ReviewItem};
pub use pipeline::input::{FileSelection, SourceDocument};
pub use pipeline::llm::{ExtractionService, GeminiClient, GenerateContentRequest};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{Advance, AnswerState, QuizSession};
