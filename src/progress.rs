//! Progress-callback trait for extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events while a batch is encoded and sent. The terminal front end uses it
//! to drive the busy indicator shown on the processing screen.
//!
//! # Example
//!
//! ```rust
//! use flashquiz::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     encoded: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_document_encoded(&self, index: usize, total: usize, name: &str, _bytes: usize) {
//!         self.encoded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {}", index + 1, total, name);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { encoded: AtomicUsize::new(0) });
//! let config = ExtractionConfig::builder()
//!     .progress_callback(cb as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::extract::Extractor`] as an extraction progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any document is read.
    fn on_extraction_start(&self, documents: usize) {
        let _ = documents;
    }

    /// Called after each document has been read and base64-encoded.
    ///
    /// # Arguments
    /// * `index`: 0-based position in the batch
    /// * `total`: batch size
    /// * `name` : display name of the document
    /// * `bytes`: raw (pre-encoding) size
    fn on_document_encoded(&self, index: usize, total: usize, name: &str, bytes: usize) {
        let _ = (index, total, name, bytes);
    }

    /// Called just before the single request is sent to the service.
    fn on_request_sent(&self, documents: usize) {
        let _ = documents;
    }

    /// Called when a quiz was produced.
    fn on_extraction_complete(&self, questions: usize) {
        let _ = questions;
    }

    /// Called when the extraction failed. `error` is the full diagnostic text.
    fn on_extraction_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
