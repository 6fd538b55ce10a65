//! CLI binary for flashquiz.
//!
//! A terminal front end over the library crate: the upload, quiz and results
//! screens are driven by [`QuizApp`] and rendered as plain text prompts.

use anyhow::{Context, Result};
use clap::Parser;
use flashquiz::config::{api_key_from_env, DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use flashquiz::{
    AnswerState, ExtractionConfig, ExtractionProgressCallback, ExtractionService, Extractor,
    ProgressCallback, QuizApp, QuizSession, Screen, TransitionError, write_quiz_json,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

// ── Busy indicator ───────────────────────────────────────────────────────────

/// Spinner shown on the processing screen. A fresh bar is created for every
/// extraction so the callback can be reused across resubmissions.
struct SpinnerCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    /// The slot holding the current bar. A poisoned lock only means a
    /// previous callback panicked; the bar itself is still usable.
    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(bar) = self.slot().as_ref() {
            f(bar);
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.slot().take() {
            bar.finish_and_clear();
        }
    }
}

impl ExtractionProgressCallback for SpinnerCallback {
    fn on_extraction_start(&self, documents: usize) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Processing");
        bar.set_message(format!("reading {documents} document(s)…"));
        bar.enable_steady_tick(Duration::from_millis(80));
        *self.slot() = Some(bar);
    }

    fn on_document_encoded(&self, index: usize, total: usize, name: &str, bytes: usize) {
        self.with_bar(|bar| {
            bar.println(format!(
                "  {} {:<32} {}",
                green("✓"),
                name,
                dim(&format!("{}/{}  {} KB", index + 1, total, bytes / 1024))
            ));
        });
    }

    fn on_request_sent(&self, _documents: usize) {
        self.with_bar(|bar| bar.set_message("analyzing documents and generating quiz…"));
    }

    fn on_extraction_complete(&self, _questions: usize) {
        self.finish();
    }

    fn on_extraction_error(&self, _error: &str) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Quiz yourself on one exam paper
  flashquiz exam.pdf

  # Several papers in one quiz
  flashquiz chapter1.pdf chapter2.pdf

  # Start empty and add files at the upload prompt
  flashquiz

  # Extract only, print the quiz as JSON
  flashquiz --extract-only exam.pdf > quiz.json

  # Extract only, write the quiz to a file
  flashquiz --extract-only exam.pdf -o quiz.json

UPLOAD SCREEN:
  add <path>...   add PDF files (non-PDF files are skipped)
  rm <n>          remove file number n
  list            show the selection
  go              generate the quiz
  quit            leave

QUIZ SCREEN:
  a-d / 1-4       select an option
  c / <enter>     check the selected answer
  n / <enter>     next question (after checking)
  x               exit the quiz and return to upload

RESULTS SCREEN:
  r               upload new files
  q               quit

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (API_KEY is also accepted)
  FLASHQUIZ_MODEL         Override model ID
  FLASHQUIZ_API_BASE_URL  Override the Gemini REST base URL
"#;

/// Turn PDF exam papers into interactive multiple-choice quizzes.
#[derive(Parser, Debug)]
#[command(
    name = "flashquiz",
    version,
    about = "Turn PDF exam papers into interactive multiple-choice quizzes using Gemini",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to start with.
    files: Vec<PathBuf>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "FLASHQUIZ_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Gemini REST base URL.
    #[arg(long, env = "FLASHQUIZ_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "FLASHQUIZ_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Path to a text file containing a custom system instruction.
    #[arg(long, env = "FLASHQUIZ_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// HTTP timeout for the extraction request, in seconds.
    #[arg(long, env = "FLASHQUIZ_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Print the extracted quiz as JSON instead of playing it.
    #[arg(long)]
    extract_only: bool,

    /// With --extract-only: write the JSON to this file instead of stdout.
    #[arg(short, long, requires = "extract_only")]
    output: Option<PathBuf>,

    /// Disable the busy spinner.
    #[arg(long, env = "FLASHQUIZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FLASHQUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors (extract-only mode).
    #[arg(short, long)]
    quiet: bool,
}

/// Interactive screens keep stderr to errors, so the full detail of a
/// failed extraction is printed above the generic message.
fn default_log_filter(cli: &Cli) -> &'static str {
    if cli.verbose {
        "debug"
    } else if !cli.extract_only || cli.quiet {
        "error"
    } else {
        "info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter(&cli))),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress;
    let progress: Option<ProgressCallback> = if show_progress {
        Some(SpinnerCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress).await?;

    // Fails here, before any request, when no key is configured.
    let extractor = Extractor::gemini(config).context("Configuration error")?;

    if cli.extract_only {
        return extract_only(&cli, extractor).await;
    }

    let mut app = QuizApp::new(extractor);
    for path in &cli.files {
        add_file(&mut app, path);
    }
    run_interactive(&mut app).await
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .api_base_url(&cli.api_base_url)
        .temperature(cli.temperature)
        .request_timeout_secs(cli.timeout);

    if let Some(key) = cli.api_key.clone().or_else(api_key_from_env) {
        builder = builder.api_key(key);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

// ── Extract-only mode ────────────────────────────────────────────────────────

async fn extract_only<S: ExtractionService + Sync>(cli: &Cli, extractor: Extractor<S>) -> Result<()> {
    let mut selection = flashquiz::FileSelection::new();
    for path in &cli.files {
        if !selection.add(path)? && !cli.quiet {
            eprintln!("{} skipping non-PDF file {}", cyan("⚠"), path.display());
        }
    }
    if selection.is_empty() {
        anyhow::bail!("No PDF files given");
    }

    let quiz = extractor
        .extract(selection.files())
        .await
        .context("Failed to process the documents")?;
    match cli.output {
        Some(ref path) => {
            write_quiz_json(&quiz, path).await?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} questions  →  {}",
                    green("✔"),
                    quiz.len(),
                    bold(&path.display().to_string())
                );
            }
        }
        None => println!(
            "{}",
            serde_json::to_string_pretty(&quiz).context("Failed to serialise quiz")?
        ),
    }
    Ok(())
}

// ── Interactive screens ──────────────────────────────────────────────────────

/// Line reader over stdin. `None` means end of input.
struct Prompt {
    lines: io::Lines<io::StdinLock<'static>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt} ");
        io::stdout().flush().context("Failed to flush stdout")?;
        match self.lines.next() {
            Some(line) => Ok(Some(line.context("Failed to read stdin")?.trim().to_string())),
            None => Ok(None),
        }
    }
}

async fn run_interactive<S: ExtractionService + Sync>(app: &mut QuizApp<S>) -> Result<()> {
    let mut prompt = Prompt::new();
    loop {
        let keep_going = match app.screen() {
            Screen::Upload => upload_screen(app, &mut prompt).await?,
            // `submit` only returns once processing is over.
            Screen::Processing => true,
            Screen::Quiz => quiz_screen(app, &mut prompt)?,
            Screen::Results => results_screen(app, &mut prompt)?,
        };
        if !keep_going {
            return Ok(());
        }
    }
}

fn add_file<S: ExtractionService + Sync>(app: &mut QuizApp<S>, path: &Path) {
    let Ok(selection) = app.selection_mut() else {
        return;
    };
    match selection.add(path) {
        Ok(true) => println!("  {} {}", green("+"), path.display()),
        Ok(false) => println!("  {} {} is not a PDF, skipped", cyan("⚠"), path.display()),
        Err(e) => println!("  {} {}", red("✗"), e),
    }
}

fn print_selection<S: ExtractionService + Sync>(app: &QuizApp<S>) {
    let files = app.selection().files();
    if files.is_empty() {
        println!("  {}", dim("No files selected. Use `add <path>` to add PDFs."));
        return;
    }
    println!("  {} file(s) selected:", files.len());
    for (i, f) in files.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, f.name());
    }
}

/// Returns `false` when the user wants to quit.
async fn upload_screen<S: ExtractionService + Sync>(app: &mut QuizApp<S>, prompt: &mut Prompt) -> Result<bool> {
    println!();
    println!("{}", bold("Upload exam papers"));
    if let Some(err) = app.error() {
        println!("{} {}", red("✗"), red(err));
    }
    print_selection(app);

    loop {
        let Some(line) = prompt.ask(&cyan("upload>"))? else {
            return Ok(false);
        };
        let (cmd, rest) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        match cmd.to_lowercase().as_str() {
            "add" => {
                for p in rest.split_whitespace() {
                    add_file(app, Path::new(p));
                }
            }
            "rm" | "remove" => match rest.trim().parse::<usize>() {
                Ok(n) if n >= 1 => match app.selection_mut().ok().and_then(|s| s.remove(n - 1)) {
                    Some(doc) => println!("  {} {}", red("-"), doc.name()),
                    None => println!("  {}", dim(&format!("No file number {n}"))),
                },
                _ => println!("  {}", dim("Usage: rm <n>")),
            },
            "list" | "ls" => print_selection(app),
            "go" | "" => {
                match app.submit().await {
                    Ok(_) => return Ok(true),
                    Err(TransitionError::NoFiles) if cmd.is_empty() => {}
                    Err(TransitionError::NoFiles) => {
                        println!("  {}", dim("Add at least one PDF first."))
                    }
                    Err(e) => println!("  {}", dim(&e.to_string())),
                }
            }
            "quit" | "q" | "exit" => return Ok(false),
            // A bare path is treated as `add`.
            _ if Path::new(&line).exists() => add_file(app, Path::new(&line)),
            _ => println!("  {}", dim("Commands: add <path>, rm <n>, list, go, quit")),
        }
    }
}

fn render_question(session: &QuizSession, title: &str) {
    let width = 30;
    let filled = (session.progress() * width as f64).round() as usize;
    println!();
    println!("{}", bold(title));
    println!(
        "Question {} of {}  [{}{}]",
        session.current_number(),
        session.total(),
        "█".repeat(filled),
        dim(&"░".repeat(width - filled))
    );
    println!();

    let question = session.current_question();
    println!("{}", bold(question.text()));
    println!();

    let state = session.state();
    for (i, option) in question.options().iter().enumerate() {
        let letter = OPTION_LETTERS[i];
        let line = format!("{letter}) {option}");
        let rendered = match state {
            AnswerState::Answered { index, .. } => {
                if i == question.correct_answer_index() {
                    format!("{} {}", green("✓"), green(&line))
                } else if i == index {
                    format!("{} {}", red("✗"), red(&line))
                } else {
                    format!("  {}", dim(&line))
                }
            }
            AnswerState::Selected(index) if index == i => format!("{} {}", cyan("›"), cyan(&line)),
            _ => format!("  {line}"),
        };
        println!("  {rendered}");
    }

    if let AnswerState::Answered { correct, .. } = state {
        println!();
        if correct {
            println!("{}", green("Correct!"));
        } else {
            println!(
                "{} The answer is {}) {}",
                red("Incorrect."),
                OPTION_LETTERS[question.correct_answer_index()],
                question.correct_option()
            );
        }
        if !question.explanation().is_empty() {
            println!("{} {}", bold("Explanation:"), question.explanation());
        }
    }
}

fn parse_option(input: &str) -> Option<usize> {
    let mut chars = input.chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() {
        return None;
    }
    OPTION_LETTERS
        .iter()
        .position(|&l| l == c)
        .or_else(|| c.to_digit(10).and_then(|d| (1..=4).contains(&d).then(|| d as usize - 1)))
}

/// Returns `false` when the user wants to quit.
fn quiz_screen<S: ExtractionService + Sync>(app: &mut QuizApp<S>, prompt: &mut Prompt) -> Result<bool> {
    let Some(session) = app.session() else {
        return Ok(true);
    };
    let title = app.document().map(|d| d.title().to_string()).unwrap_or_default();
    render_question(session, &title);

    let hint = if session.is_answered() {
        if session.is_last() {
            "[n] finish quiz"
        } else {
            "[n] next question"
        }
    } else {
        "[a-d] select  [c] check answer  [x] exit"
    };
    let Some(line) = prompt.ask(&format!("{} {}", dim(hint), cyan("quiz>")))? else {
        return Ok(false);
    };

    let answered = session.is_answered();
    let outcome = match line.to_lowercase().as_str() {
        "x" | "exit" => app.exit(),
        "q" | "quit" => return Ok(false),
        "n" | "next" => app.advance().map(|_| ()),
        "" if answered => app.advance().map(|_| ()),
        "c" | "check" | "" => app.submit_answer().map(|_| ()),
        other => match parse_option(other) {
            Some(i) => app.select(i),
            None => {
                println!("  {}", dim("Choose a–d, then c to check."));
                Ok(())
            }
        },
    };

    if let Err(e) = outcome {
        let msg = match e {
            TransitionError::NoSelection => "Select an option first.".to_string(),
            TransitionError::AlreadyAnswered => "Answer already locked in. Press n to continue.".to_string(),
            TransitionError::NotAnswered => "Check your answer before moving on.".to_string(),
            other => other.to_string(),
        };
        println!("  {}", dim(&msg));
    }
    Ok(true)
}

/// Returns `false` when the user wants to quit.
fn results_screen<S: ExtractionService + Sync>(app: &mut QuizApp<S>, prompt: &mut Prompt) -> Result<bool> {
    if let (Some(result), Some(doc)) = (app.result(), app.document()) {
        println!();
        println!("{}", bold("Quiz Completed!"));
        println!("You scored {}", bold(&format!("{}%", result.percentage())));
        println!(
            "  {} {}   {} {}   {} {}",
            green("Correct"),
            result.score(),
            red("Incorrect"),
            result.incorrect(),
            dim("Total Questions"),
            result.total()
        );
        println!();
        println!("{}", bold("Detailed Review"));
        for item in result.review(doc) {
            let mark = if item.is_correct() { green("✓") } else { red("✗") };
            println!("{} {} {}", mark, dim(&format!("#{}", item.number)), item.question.text());
            println!("    Your answer:    {}", item.user_answer().unwrap_or("-"));
            println!("    Correct answer: {}", item.correct_answer());
            if let Some(explanation) = item.explanation() {
                println!("    {}", dim(&format!("Explanation: {explanation}")));
            }
        }
    }

    loop {
        let Some(line) = prompt.ask(&format!("{} {}", dim("[r] upload new files  [q] quit"), cyan("results>")))? else {
            return Ok(false);
        };
        match line.to_lowercase().as_str() {
            "r" | "reset" => {
                app.reset()?;
                return Ok(true);
            }
            "q" | "quit" => return Ok(false),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_letters_and_digits() {
        assert_eq!(parse_option("a"), Some(0));
        assert_eq!(parse_option("D"), Some(3));
        assert_eq!(parse_option("2"), Some(1));
        assert_eq!(parse_option("5"), None);
        assert_eq!(parse_option("e"), None);
        assert_eq!(parse_option("ab"), None);
        assert_eq!(parse_option(""), None);
    }

    #[test]
    fn cli_parses_files_and_flags() {
        let cli = Cli::try_parse_from([
            "flashquiz",
            "--extract-only",
            "-o",
            "quiz.json",
            "--temperature",
            "0.1",
            "a.pdf",
            "b.pdf",
        ])
        .unwrap();
        assert_eq!(cli.files.len(), 2);
        assert!(cli.extract_only);
        assert_eq!(cli.output.as_deref(), Some(Path::new("quiz.json")));
    }

    #[test]
    fn output_requires_extract_only() {
        assert!(Cli::try_parse_from(["flashquiz", "-o", "quiz.json", "a.pdf"]).is_err());
    }

    #[test]
    fn interactive_logging_keeps_errors() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap();
        assert_eq!(default_log_filter(&parse(&["flashquiz", "a.pdf"])), "error");
        assert_eq!(default_log_filter(&parse(&["flashquiz", "-v", "a.pdf"])), "debug");
        assert_eq!(
            default_log_filter(&parse(&["flashquiz", "--extract-only", "a.pdf"])),
            "info"
        );
    }

    #[test]
    fn spinner_survives_a_poisoned_lock() {
        let spinner = SpinnerCallback::new();
        *spinner.slot() = Some(ProgressBar::hidden());

        let held = Arc::clone(&spinner);
        let panicked = std::thread::spawn(move || {
            let _guard = held.bar.lock().unwrap();
            panic!("callback panicked");
        })
        .join()
        .is_err();
        assert!(panicked);
        assert!(spinner.bar.is_poisoned());

        spinner.on_extraction_complete(1);
        assert!(spinner.slot().is_none());
    }
}
