//! Extraction entry points: documents in, quiz out.
//!
//! [`Extractor`] is the extraction client. It encodes every selected file,
//! sends them to the service as **one** request, and turns the reply into a
//! validated [`QuizDocument`]. Any failure aborts the whole batch; there is no
//! partial extraction and no automatic retry.

use crate::config::ExtractionConfig;
use crate::error::QuizError;
use crate::model::QuizDocument;
use crate::pipeline::encode::encode_document;
use crate::pipeline::input::SourceDocument;
use crate::pipeline::llm::{build_request, ExtractionService, GeminiClient};
use crate::pipeline::parse::parse_quiz;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extraction client bound to one service implementation.
#[derive(Debug)]
pub struct Extractor<S> {
    service: S,
    config: ExtractionConfig,
}

impl Extractor<GeminiClient> {
    /// Extractor backed by the Gemini REST API.
    ///
    /// # Errors
    /// [`QuizError::MissingApiKey`] when `config` carries no key.
    pub fn gemini(config: ExtractionConfig) -> Result<Self, QuizError> {
        let client = GeminiClient::new(&config)?;
        Ok(Self::new(client, config))
    }
}

impl<S: ExtractionService + Sync> Extractor<S> {
    pub fn new(service: S, config: ExtractionConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Turn a non-empty batch of documents into a quiz.
    ///
    /// # Errors
    /// - [`QuizError::NoDocuments`] for an empty batch
    /// - [`QuizError::Encoding`] when any file cannot be read
    /// - service errors from [`ExtractionService::generate`]
    /// - [`QuizError::EmptyResponse`], [`QuizError::MalformedResponse`],
    ///   [`QuizError::EmptyResult`] for unusable replies
    pub async fn extract(&self, files: &[SourceDocument]) -> Result<QuizDocument, QuizError> {
        let result = self.run(files).await;
        if let Some(ref cb) = self.config.progress_callback {
            match &result {
                Ok(doc) => cb.on_extraction_complete(doc.len()),
                Err(e) => cb.on_extraction_error(&e.to_string()),
            }
        }
        result
    }

    async fn run(&self, files: &[SourceDocument]) -> Result<QuizDocument, QuizError> {
        if files.is_empty() {
            return Err(QuizError::NoDocuments);
        }
        let start = Instant::now();
        let total = files.len();
        info!("Starting extraction of {} document(s)", total);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_start(total);
        }

        // ── Step 1: Encode every document, in order ─────────────────────
        let mut encoded = Vec::with_capacity(total);
        for (i, file) in files.iter().enumerate() {
            let (inline, size) = encode_document(file).await?;
            debug!("Encoded {} ({} bytes)", file.name(), size);
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_document_encoded(i, total, &file.name(), size);
            }
            encoded.push(inline);
        }

        // ── Step 2: One request for the whole batch ─────────────────────
        let request = build_request(encoded, &self.config);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_request_sent(total);
        }
        let payload = self
            .service
            .generate(&request)
            .await?
            .filter(|text| !text.trim().is_empty())
            .ok_or(QuizError::EmptyResponse)?;
        debug!("Received {} bytes of payload", payload.len());

        // ── Step 3: Validate the reply ──────────────────────────────────
        let document = parse_quiz(&payload)?;
        info!(
            "Extracted '{}' with {} questions in {}ms",
            document.title(),
            document.len(),
            start.elapsed().as_millis()
        );
        Ok(document)
    }
}

/// Extract a quiz from local PDF paths using Gemini.
///
/// Convenience wrapper: non-PDF paths are skipped, the rest are sent as one
/// batch.
pub async fn extract_quiz<P: AsRef<Path>>(
    paths: &[P],
    config: &ExtractionConfig,
) -> Result<QuizDocument, QuizError> {
    let extractor = Extractor::gemini(config.clone())?;
    let mut selection = crate::pipeline::input::FileSelection::new();
    for path in paths {
        selection.add(path)?;
    }
    extractor.extract(selection.files()).await
}

/// Extract a quiz and write it as pretty-printed JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_quiz_to_file<P: AsRef<Path>>(
    paths: &[P],
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<QuizDocument, QuizError> {
    let document = extract_quiz(paths, config).await?;
    write_quiz_json(&document, output_path).await?;
    Ok(document)
}

/// Write `document` as pretty-printed JSON, atomically.
///
/// # Errors
/// [`QuizError::OutputWriteFailed`] when the directory, the temp file, or
/// the final rename cannot be written.
pub async fn write_quiz_json(
    document: &QuizDocument,
    output_path: impl AsRef<Path>,
) -> Result<(), QuizError> {
    let path = output_path.as_ref();
    let json = serde_json::to_string_pretty(document)
        .map_err(|e| QuizError::Internal(format!("Failed to serialise quiz: {e}")))?;
    let write_failed = |source| QuizError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;

    debug!("Wrote quiz '{}' to {}", document.title(), path.display());
    Ok(())
}
