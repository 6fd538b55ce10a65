//! Configuration for document → quiz extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The only value without a usable
//! default is the API key, which normally comes from the environment through
//! [`ExtractionConfig::from_env`].

use crate::error::QuizError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Default Gemini model used for extraction.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default base URL of the Gemini REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Configuration for an extraction.
///
/// # Example
/// ```rust
/// use flashquiz::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("test-key")
///     .model("gemini-2.5-flash")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-flash");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Credential for the extraction service. `None` fails fast in
    /// [`ExtractionConfig::require_api_key`].
    pub api_key: Option<String>,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// REST base URL, without a trailing slash. Default: [`DEFAULT_API_BASE_URL`].
    pub api_base_url: String,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Extraction should be near-deterministic; the model only reasons freely
    /// when a document has no answer key.
    pub temperature: f32,

    /// Custom system instruction. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// HTTP timeout for the single extraction request, in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Receives busy-indicator events while an extraction runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            temperature: 0.2,
            system_prompt: None,
            request_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("temperature", &self.temperature)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the API key taken from the environment.
    ///
    /// A missing key is not an error here; it surfaces from
    /// [`require_api_key`](Self::require_api_key) before any request is built.
    pub fn from_env() -> Self {
        Self {
            api_key: api_key_from_env(),
            ..Self::default()
        }
    }

    /// Return the API key or fail with [`QuizError::MissingApiKey`].
    pub fn require_api_key(&self) -> Result<&str, QuizError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(QuizError::MissingApiKey {
                hint: format!("Set {} (or pass --api-key).", API_KEY_ENV_VARS.join(" or ")),
            }),
        }
    }
}

/// First non-empty value among [`API_KEY_ENV_VARS`].
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The API key is deliberately not checked here so that configs can be
    /// built for offline use (tests, `--help`).
    pub fn build(self) -> Result<ExtractionConfig, QuizError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(QuizError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(QuizError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}
