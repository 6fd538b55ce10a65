//! Application controller: the upload → processing → quiz → results screens.
//!
//! [`QuizApp`] is the single owned context for a run of the program. It holds
//! the file selection, the extracted document, the live [`QuizSession`], the
//! final [`QuizResult`], and the last error message. Each is created on one
//! well-defined transition and dropped on reset or exit.
//!
//! ```text
//!            submit files            extraction ok            session complete
//!  Upload ───────────────▶ Processing ─────────────▶ Quiz ────────────────────▶ Results
//!    ▲  ▲                      │                      │                           │
//!    │  └──── extraction fails ┘                      │ exit                      │ reset
//!    └────────────────────────────────────────────────┴───────────────────────────┘
//! ```

use crate::error::{QuizError, TransitionError};
use crate::extract::Extractor;
use crate::model::{AnswerRecord, QuizDocument, QuizResult};
use crate::pipeline::input::{FileSelection, SourceDocument};
use crate::pipeline::llm::ExtractionService;
use crate::session::{Advance, QuizSession};
use std::sync::Arc;
use tracing::{error, info};

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Upload,
    Processing,
    Quiz,
    Results,
}

impl Screen {
    pub fn name(self) -> &'static str {
        match self {
            Screen::Upload => "upload",
            Screen::Processing => "processing",
            Screen::Quiz => "quiz",
            Screen::Results => "results",
        }
    }
}

/// The application controller.
#[derive(Debug)]
pub struct QuizApp<S> {
    extractor: Extractor<S>,
    screen: Screen,
    selection: FileSelection,
    document: Option<Arc<QuizDocument>>,
    session: Option<QuizSession>,
    result: Option<QuizResult>,
    error: Option<String>,
}

impl<S: ExtractionService + Sync> QuizApp<S> {
    pub fn new(extractor: Extractor<S>) -> Self {
        Self {
            extractor,
            screen: Screen::Upload,
            selection: FileSelection::new(),
            document: None,
            session: None,
            result: None,
            error: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Message from the last failed extraction, shown on the upload screen.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selection(&self) -> &FileSelection {
        &self.selection
    }

    /// Mutable access to the file selection; only on the upload screen.
    pub fn selection_mut(&mut self) -> Result<&mut FileSelection, TransitionError> {
        self.require(Screen::Upload)?;
        Ok(&mut self.selection)
    }

    pub fn document(&self) -> Option<&QuizDocument> {
        self.document.as_deref()
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn extractor(&self) -> &Extractor<S> {
        &self.extractor
    }

    fn require(&self, screen: Screen) -> Result<(), TransitionError> {
        if self.screen == screen {
            Ok(())
        } else {
            Err(TransitionError::WrongScreen(self.screen.name()))
        }
    }

    // ── Upload / processing ──────────────────────────────────────────────

    /// Leave the upload screen with the current selection.
    ///
    /// Clears any previous error and returns the files to extract. The
    /// selection itself is kept until the extraction succeeds so a failed
    /// batch can be resubmitted unchanged.
    pub fn begin_processing(&mut self) -> Result<Vec<SourceDocument>, TransitionError> {
        self.require(Screen::Upload)?;
        if self.selection.is_empty() {
            return Err(TransitionError::NoFiles);
        }
        self.error = None;
        self.screen = Screen::Processing;
        Ok(self.selection.files().to_vec())
    }

    /// Apply the outcome of an extraction started by [`begin_processing`].
    ///
    /// Ignored unless the controller is still processing.
    ///
    /// [`begin_processing`]: Self::begin_processing
    pub fn finish_processing(
        &mut self,
        outcome: Result<QuizDocument, QuizError>,
    ) -> Result<(), TransitionError> {
        self.require(Screen::Processing)?;
        match outcome {
            Ok(document) => {
                info!("Quiz '{}' ready with {} questions", document.title(), document.len());
                let document = Arc::new(document);
                self.session = Some(QuizSession::new(Arc::clone(&document)));
                self.document = Some(document);
                self.result = None;
                self.selection.clear();
                self.screen = Screen::Quiz;
            }
            Err(e) => {
                error!("Extraction failed: {e}");
                self.error = Some(e.user_message());
                self.document = None;
                self.session = None;
                self.result = None;
                self.screen = Screen::Upload;
            }
        }
        Ok(())
    }

    /// Submit the selection and wait for the extraction to finish.
    ///
    /// On return the controller is either on the quiz screen or back on the
    /// upload screen with [`error`](Self::error) set.
    pub async fn submit(&mut self) -> Result<Screen, TransitionError> {
        let files = self.begin_processing()?;
        let outcome = self.extractor.extract(&files).await;
        self.finish_processing(outcome)?;
        Ok(self.screen)
    }

    // ── Quiz ─────────────────────────────────────────────────────────────

    fn session_mut(&mut self) -> Result<&mut QuizSession, TransitionError> {
        self.require(Screen::Quiz)?;
        self.session
            .as_mut()
            .ok_or(TransitionError::WrongScreen(Screen::Quiz.name()))
    }

    pub fn select(&mut self, index: usize) -> Result<(), TransitionError> {
        self.session_mut()?.select(index)
    }

    /// Commit the selected answer ("Check Answer").
    pub fn submit_answer(&mut self) -> Result<AnswerRecord, TransitionError> {
        self.session_mut()?.submit().cloned()
    }

    /// Go to the next question, or to the results screen after the last one.
    pub fn advance(&mut self) -> Result<Screen, TransitionError> {
        let step = self.session_mut()?.advance()?;
        match step {
            Advance::Next(_) => {}
            Advance::Complete(result) => {
                info!(
                    "Quiz finished: {}/{} ({}%)",
                    result.score(),
                    result.total(),
                    result.percentage()
                );
                self.result = Some(result);
                self.session = None;
                self.screen = Screen::Results;
            }
        }
        Ok(self.screen)
    }

    /// Abandon the quiz in progress.
    pub fn exit(&mut self) -> Result<(), TransitionError> {
        self.require(Screen::Quiz)?;
        self.clear();
        Ok(())
    }

    // ── Results ──────────────────────────────────────────────────────────

    /// Start over from the upload screen.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.require(Screen::Results)?;
        self.clear();
        Ok(())
    }

    fn clear(&mut self) {
        self.document = None;
        self.session = None;
        self.result = None;
        self.error = None;
        self.screen = Screen::Upload;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::error::PROCESSING_FAILED_MESSAGE;
    use crate::pipeline::llm::GenerateContentRequest;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::io;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Collects formatted log output.
    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Service stand-in that replays a scripted payload.
    struct Replay {
        reply: Result<Option<String>, u16>,
        requests: Mutex<Vec<GenerateContentRequest>>,
    }

    impl Replay {
        fn text(payload: &str) -> Self {
            Self {
                reply: Ok(Some(payload.to_string())),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn nothing() -> Self {
            Self {
                reply: Ok(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn status(code: u16) -> Self {
            Self {
                reply: Err(code),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ExtractionService for Replay {
        async fn generate(&self, request: &GenerateContentRequest) -> Result<Option<String>, QuizError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(QuizError::ApiError {
                    status: *status,
                    message: "quota exceeded for project 1234".into(),
                }),
            }
        }
    }

    const THREE: &str = r#"{"title": "Geography", "questions": [
        {"text": "Capital of France?", "options": ["Paris", "Rome", "Madrid", "Berlin"], "correctAnswerIndex": 0, "explanation": "Paris."},
        {"text": "Largest ocean?", "options": ["Atlantic", "Pacific", "Indian", "Arctic"], "correctAnswerIndex": 1, "explanation": "Pacific."},
        {"text": "Longest river?", "options": ["Amazon", "Yangtze", "Nile", "Danube"], "correctAnswerIndex": 2, "explanation": "Nile, by most measures."}
    ]}"#;

    fn app(service: Replay) -> QuizApp<Replay> {
        QuizApp::new(Extractor::new(service, ExtractionConfig::default()))
    }

    fn add_pdfs(app: &mut QuizApp<Replay>, dir: &TempDir, names: &[&str]) {
        for name in names {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("%PDF-1.4 {name}")).unwrap();
            assert!(app.selection_mut().unwrap().add(&path).unwrap());
        }
    }

    fn play(app: &mut QuizApp<Replay>, choice: usize) -> Screen {
        app.select(choice).unwrap();
        app.submit_answer().unwrap();
        app.advance().unwrap()
    }

    #[test]
    fn full_run_scores_and_resets() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::text(THREE));
        add_pdfs(&mut app, &dir, &["geo.pdf"]);

        let screen = tokio_test::block_on(app.submit()).unwrap();
        assert_eq!(screen, Screen::Quiz);
        assert_eq!(app.document().unwrap().title(), "Geography");
        assert!(app.selection().is_empty());

        assert_eq!(play(&mut app, 0), Screen::Quiz);
        assert_eq!(play(&mut app, 3), Screen::Quiz);
        assert_eq!(play(&mut app, 2), Screen::Results);

        let result = app.result().unwrap();
        assert_eq!((result.score(), result.total()), (2, 3));
        assert_eq!(result.percentage(), 67);
        let flags: Vec<bool> = result.details().iter().map(|d| d.is_correct).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert!(app.session().is_none());
        assert!(app.document().is_some(), "results screen keeps the document for review");

        app.reset().unwrap();
        assert_eq!(app.screen(), Screen::Upload);
        assert!(app.document().is_none());
        assert!(app.result().is_none());
        assert!(app.error().is_none());
    }

    #[test]
    fn empty_questions_returns_to_upload_with_message() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::text(r#"{"title": "Nothing", "questions": []}"#));
        add_pdfs(&mut app, &dir, &["blank.pdf"]);

        let screen = tokio_test::block_on(app.submit()).unwrap();
        assert_eq!(screen, Screen::Upload);
        assert_eq!(app.error(), Some(PROCESSING_FAILED_MESSAGE));
        assert!(app.document().is_none());
        assert!(app.session().is_none());
        assert_eq!(app.selection().len(), 1, "selection kept for resubmission");
    }

    #[test]
    fn missing_payload_returns_to_upload_with_message() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::nothing());
        add_pdfs(&mut app, &dir, &["a.pdf"]);

        tokio_test::block_on(app.submit()).unwrap();
        assert_eq!(app.screen(), Screen::Upload);
        assert_eq!(app.error(), Some(PROCESSING_FAILED_MESSAGE));
        assert!(app.document().is_none());
    }

    #[test]
    fn service_error_detail_is_not_shown() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::status(429));
        add_pdfs(&mut app, &dir, &["a.pdf"]);

        tokio_test::block_on(app.submit()).unwrap();
        let msg = app.error().unwrap();
        assert!(!msg.contains("quota"), "raw service error leaked: {msg}");
    }

    #[test]
    fn removed_file_is_not_sent() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::text(THREE));
        add_pdfs(&mut app, &dir, &["keep.pdf", "drop.pdf"]);
        let removed = app.selection_mut().unwrap().remove(1).unwrap();
        assert_eq!(removed.name(), "drop.pdf");

        tokio_test::block_on(app.submit()).unwrap();
        let requests = app.extractor().service().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].document_count(), 1);

        let sent = requests[0].contents[0].parts[0]
            .inline_data
            .as_ref()
            .expect("first part is the document");
        assert_eq!(STANDARD.decode(&sent.data).unwrap(), b"%PDF-1.4 keep.pdf");
    }

    #[test]
    fn failure_detail_is_logged_at_the_boundary() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::status(429));
        add_pdfs(&mut app, &dir, &["a.pdf"]);

        let logs = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink = Arc::clone(&logs);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .with_writer(move || LogSink(Arc::clone(&sink)))
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(app.submit()).unwrap();
        });

        let logged = String::from_utf8(logs.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("ERROR"), "got {logged:?}");
        assert!(logged.contains("HTTP 429"), "got {logged:?}");
        assert!(logged.contains("quota exceeded for project 1234"), "got {logged:?}");
        assert_eq!(app.error(), Some(PROCESSING_FAILED_MESSAGE));
    }

    #[test]
    fn submit_with_no_files_is_rejected() {
        let mut app = app(Replay::text(THREE));
        let err = tokio_test::block_on(app.submit()).unwrap_err();
        assert_eq!(err, TransitionError::NoFiles);
        assert_eq!(app.screen(), Screen::Upload);
        assert!(app.extractor().service().requests.lock().unwrap().is_empty());
    }

    #[test]
    fn processing_blocks_resubmission_and_selection() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::text(THREE));
        add_pdfs(&mut app, &dir, &["a.pdf"]);

        let files = app.begin_processing().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(app.screen(), Screen::Processing);
        assert_eq!(
            app.begin_processing().unwrap_err(),
            TransitionError::WrongScreen("processing")
        );
        assert!(app.selection_mut().is_err());
        assert_eq!(app.selection().len(), 1, "selection still visible while busy");

        app.finish_processing(Err(QuizError::EmptyResult)).unwrap();
        assert_eq!(app.screen(), Screen::Upload);
        // A late outcome is dropped once processing is over.
        assert!(app.finish_processing(Err(QuizError::EmptyResponse)).is_err());
    }

    #[test]
    fn retry_clears_previous_error() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::text(THREE));
        add_pdfs(&mut app, &dir, &["a.pdf"]);
        app.begin_processing().unwrap();
        app.finish_processing(Err(QuizError::EmptyResponse)).unwrap();
        assert!(app.error().is_some());

        app.begin_processing().unwrap();
        assert!(app.error().is_none());
    }

    #[test]
    fn exit_discards_session() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::text(THREE));
        add_pdfs(&mut app, &dir, &["a.pdf"]);
        tokio_test::block_on(app.submit()).unwrap();
        play(&mut app, 0);

        app.exit().unwrap();
        assert_eq!(app.screen(), Screen::Upload);
        assert!(app.session().is_none());
        assert!(app.document().is_none());
        assert!(app.result().is_none());
        assert_eq!(app.select(0).unwrap_err(), TransitionError::WrongScreen("upload"));
    }

    #[test]
    fn quiz_operations_only_on_quiz_screen() {
        let mut app = app(Replay::text(THREE));
        assert!(app.select(0).is_err());
        assert!(app.submit_answer().is_err());
        assert!(app.advance().is_err());
        assert!(app.exit().is_err());
        assert!(app.reset().is_err());
    }

    #[test]
    fn submit_answer_without_selection_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut app = app(Replay::text(THREE));
        add_pdfs(&mut app, &dir, &["a.pdf"]);
        tokio_test::block_on(app.submit()).unwrap();

        assert_eq!(app.submit_answer().unwrap_err(), TransitionError::NoSelection);
        assert!(app.session().unwrap().answers().is_empty());
    }
}
