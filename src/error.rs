//! Error types for the flashquiz library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`QuizError`]: **Fatal** for one extraction. The batch of documents
//!   could not be turned into a quiz (credential missing, unreadable file,
//!   service failure, unusable reply). Returned as `Err(QuizError)` from
//!   [`crate::extract::Extractor::extract`] and caught by
//!   [`crate::app::QuizApp`], which logs the detail and shows the user a
//!   single generic message instead.
//!
//! * [`TransitionError`]: **Non-fatal**. An operation was attempted in a
//!   state that forbids it (checking an answer with nothing selected,
//!   advancing a finished session). The operation is a no-op; the error
//!   only tells the caller *why* nothing happened.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown to the user whenever an extraction fails for any reason
/// other than missing configuration.
pub const PROCESSING_FAILED_MESSAGE: &str =
    "Failed to process the documents. Please try again with a clearer PDF or fewer files.";

/// All fatal errors on the document → quiz path.
#[derive(Debug, Error)]
pub enum QuizError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key was configured for the extraction service.
    #[error("API key is missing. Please check your environment configuration.\n{hint}")]
    MissingApiKey { hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// `extract` was called with an empty document list.
    #[error("No documents were supplied for extraction")]
    NoDocuments,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// A file could not be read while encoding the batch.
    #[error("Failed to read '{path}': {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Service errors ────────────────────────────────────────────────────
    /// The HTTP request never produced a response (DNS, TLS, timeout …).
    #[error("Request to the extraction service failed: {reason}")]
    Transport { reason: String },

    /// The service answered with a non-success status.
    #[error("Extraction service returned HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The service answered but the reply carried no payload text.
    #[error("No response received from the extraction service")]
    EmptyResponse,

    /// The payload text did not match the declared output structure.
    #[error("Malformed response from the extraction service: {detail}")]
    MalformedResponse { detail: String },

    /// The payload parsed but contained zero questions.
    #[error("The extraction service found no questions in the documents")]
    EmptyResult,

    /// A question or quiz was built with values outside its invariants.
    #[error("Invalid quiz: {0}")]
    InvalidQuiz(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an exported quiz file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuizError {
    /// `true` for errors caused by local configuration rather than by the
    /// documents or the service.
    pub fn is_configuration(&self) -> bool {
        matches!(self, QuizError::MissingApiKey { .. } | QuizError::InvalidConfig(_))
    }

    /// The text to show an end user for this error.
    ///
    /// Configuration problems are shown verbatim because the user can fix
    /// them; everything else collapses into [`PROCESSING_FAILED_MESSAGE`].
    pub fn user_message(&self) -> String {
        if self.is_configuration() {
            self.to_string()
        } else {
            PROCESSING_FAILED_MESSAGE.to_string()
        }
    }
}

/// A rejected state-machine operation. State is unchanged when returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// `submit` was called before any option was selected.
    #[error("no option selected")]
    NoSelection,

    /// The current question is already answered; its answer is locked.
    #[error("question already answered")]
    AlreadyAnswered,

    /// `advance` was called before the current answer was committed.
    #[error("current question has not been answered")]
    NotAnswered,

    /// The selected index does not address one of the question's options.
    #[error("option {index} is out of range (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    /// The session already produced its result.
    #[error("quiz session is complete")]
    SessionComplete,

    /// Upload was submitted with no files selected.
    #[error("no files selected")]
    NoFiles,

    /// The operation is not available on the current screen.
    #[error("operation not available on the {0} screen")]
    WrongScreen(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_collapse_to_generic_message() {
        let errors = [
            QuizError::EmptyResponse,
            QuizError::EmptyResult,
            QuizError::InvalidQuiz("duplicate question id q-1-0".into()),
            QuizError::MalformedResponse {
                detail: "expected value at line 1".into(),
            },
            QuizError::ApiError {
                status: 500,
                message: "backend exploded".into(),
            },
        ];
        for e in errors {
            let msg = e.user_message();
            assert_eq!(msg, PROCESSING_FAILED_MESSAGE, "for {e:?}");
            assert!(!msg.contains("backend"));
        }
    }

    #[test]
    fn missing_key_is_shown_verbatim() {
        let e = QuizError::MissingApiKey {
            hint: "Set GEMINI_API_KEY.".into(),
        };
        assert!(e.is_configuration());
        let msg = e.user_message();
        assert!(msg.contains("API key is missing"), "got: {msg}");
        assert!(msg.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn encoding_error_display_names_path() {
        let e = QuizError::Encoding {
            path: PathBuf::from("/tmp/exam.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(e.to_string().contains("/tmp/exam.pdf"));
        assert!(!e.is_configuration());
    }

    #[test]
    fn api_error_display() {
        let e = QuizError::ApiError {
            status: 403,
            message: "API key not valid".into(),
        };
        assert!(e.to_string().contains("403"));
        assert!(e.to_string().contains("API key not valid"));
    }

    #[test]
    fn transition_error_display() {
        let e = TransitionError::OptionOutOfRange { index: 7, len: 4 };
        assert_eq!(e.to_string(), "option 7 is out of range (question has 4 options)");
        assert_eq!(
            TransitionError::WrongScreen("results").to_string(),
            "operation not available on the results screen"
        );
    }
}
