//! Document encoding: file bytes → base64 inline part.
//!
//! The Gemini API accepts documents inline in the JSON request body as
//! `{ inlineData: { mimeType, data } }` with standard base64 data. The encoder
//! is type-agnostic: it forwards whatever media type the selection declared.

use crate::error::QuizError;
use crate::pipeline::input::SourceDocument;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A document ready to be embedded in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineDocument {
    pub mime_type: String,
    /// Standard (padded) base64 of the file contents.
    pub data: String,
}

/// Encode raw bytes with their declared media type.
pub fn encode_bytes(bytes: &[u8], mime_type: &str) -> InlineDocument {
    let data = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), data.len());
    InlineDocument {
        mime_type: mime_type.to_string(),
        data,
    }
}

/// Read `doc` from disk and encode it.
///
/// # Errors
/// [`QuizError::Encoding`] when the file cannot be read.
pub async fn encode_document(doc: &SourceDocument) -> Result<(InlineDocument, usize), QuizError> {
    let bytes = tokio::fs::read(&doc.path)
        .await
        .map_err(|source| QuizError::Encoding {
            path: doc.path.clone(),
            source,
        })?;
    Ok((encode_bytes(&bytes, &doc.mime_type), bytes.len()))
}
