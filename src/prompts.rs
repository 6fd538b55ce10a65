//! Prompts and the declared output structure sent to the extraction service.
//!
//! Callers can override the system instruction via
//! [`crate::config::ExtractionConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

use serde_json::{json, Value};

/// System-level role instruction framing the model as an extraction expert.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert educational assistant. \
Your task is to convert PDF exam papers into interactive quizzes. \
You have deep knowledge in all academic subjects and can solve unanswered questions accurately.";

/// Instruction text appended after the document parts.
pub const EXTRACTION_INSTRUCTION: &str = r#"Analyze the attached PDF documents which contain Multiple Choice Questions (MCQs).
Extract all valid MCQs found in the documents.

Rules:
1. Extract the question text clearly.
2. Extract exactly 4 options for each question.
3. Identify the correct answer.
   - CRITICAL: Check if the document provides an answer key or marked answers.
   - If an answer key is present, use it to determine the correct answer.
   - If NO answer key is present, you MUST solve the question yourself acting as a subject matter expert.
4. Provide a short explanation for the correct answer, especially if you had to solve it yourself.
5. Return the output in strict JSON format matching the schema."#;

/// MIME type requested for the reply payload.
pub const RESPONSE_MIME_TYPE: &str = "application/json";

/// The declared output structure (Gemini `responseSchema` dialect).
///
/// Every field is required; `options` is pinned to exactly four items.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "A short title for the quiz generated from the documents."
            },
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "text": {
                            "type": "STRING",
                            "description": "The question text."
                        },
                        "options": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "minItems": 4,
                            "maxItems": 4,
                            "description": "A list of 4 possible answers."
                        },
                        "correctAnswerIndex": {
                            "type": "INTEGER",
                            "description": "The zero-based index of the correct option (0, 1, 2, or 3)."
                        },
                        "explanation": {
                            "type": "STRING",
                            "description": "A brief explanation of why the answer is correct."
                        }
                    },
                    "required": ["text", "options", "correctAnswerIndex", "explanation"]
                }
            }
        },
        "required": ["title", "questions"]
    })
}
