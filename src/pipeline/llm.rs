//! Extraction-service interaction: build the request and call the model.
//!
//! This module owns the wire contract with Gemini's `generateContent`
//! endpoint. The prompts and schema live in
//! [`crate::prompts`], and interpreting the reply lives in
//! [`crate::pipeline::parse`].
//!
//! ## Request Layout
//!
//! One request per batch, containing (in order):
//! 1. **User content**: every document as an `inlineData` part, in selection
//!    order, followed by one text part with the extraction instruction
//! 2. **System instruction**: the role prompt (or user-supplied override)
//! 3. **Generation config**: JSON response MIME type, the declared response
//!    schema, and a low temperature
//!
//! No retries are attempted: a failed call surfaces immediately.

use crate::config::ExtractionConfig;
use crate::error::QuizError;
use crate::pipeline::encode::InlineDocument;
use crate::prompts::{response_schema, DEFAULT_SYSTEM_PROMPT, EXTRACTION_INSTRUCTION, RESPONSE_MIME_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ── Wire types ───────────────────────────────────────────────────────────

/// Body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Number of document parts across all contents.
    pub fn document_count(&self) -> usize {
        self.contents
            .iter()
            .flat_map(|c| &c.parts)
            .filter(|p| p.inline_data.is_some())
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One part of a content: either text or an inline document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineDocument>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn document(doc: InlineDocument) -> Self {
        Self {
            text: None,
            inline_data: Some(doc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
    pub temperature: f32,
}

/// Reply of a `generateContent` call. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, or `None` when there is no
    /// non-blank text at all.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Build the single request for a batch of encoded documents.
pub fn build_request(documents: Vec<InlineDocument>, config: &ExtractionConfig) -> GenerateContentRequest {
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let mut parts: Vec<Part> = documents.into_iter().map(Part::document).collect();
    parts.push(Part::text(EXTRACTION_INSTRUCTION));

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::text(system_prompt)],
        }),
        generation_config: GenerationConfig {
            response_mime_type: RESPONSE_MIME_TYPE.to_string(),
            response_schema: response_schema(),
            temperature: config.temperature,
        },
    }
}

// ── Service seam ─────────────────────────────────────────────────────────

/// The external extraction service.
///
/// Returns the reply's payload text, or `Ok(None)` when the service answered
/// without any. [`GeminiClient`] is the production implementation; tests
/// substitute scripted services.
pub trait ExtractionService {
    fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> impl Future<Output = Result<Option<String>, QuizError>> + Send;
}

/// HTTP client for Gemini's `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base_url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client from `config`.
    ///
    /// # Errors
    /// [`QuizError::MissingApiKey`] when no key is configured. No request is
    /// ever attempted in that case.
    pub fn new(config: &ExtractionConfig) -> Result<Self, QuizError> {
        let api_key = config.require_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| QuizError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Full URL of the `generateContent` endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base_url, self.model)
    }
}

impl ExtractionService for GeminiClient {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<Option<String>, QuizError> {
        let start = Instant::now();
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| QuizError::Transport {
                reason: if e.is_timeout() {
                    format!("timed out: {e}")
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuizError::ApiError {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let body: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| QuizError::MalformedResponse {
                    detail: format!("reply envelope: {e}"),
                })?;

        if let Some(feedback) = &body.prompt_feedback {
            warn!("Extraction service prompt feedback: {}", feedback);
        }
        if let Some(reason) = body.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            debug!("Finish reason: {}", reason);
        }
        debug!(
            "Model {} replied in {:?} ({} candidates)",
            self.model,
            start.elapsed(),
            body.candidates.len()
        );

        Ok(body.text())
    }
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
