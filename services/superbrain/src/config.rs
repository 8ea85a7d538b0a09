//! services/superbrain/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use tracing::Level;

/// The default persona preamble sent to the generation API as configuration
/// data, not control flow.
const DEFAULT_PERSONA_PREAMBLE: &str = r#"You are a helpful AI Teaching Assistant for "Student Hub".

INSTRUCTIONS:
1. Answer the student's question based strictly on the context above.
2. If the answer isn't in the document, say "I couldn't find that in this specific note."
3. Keep answers concise and encouraging."#;

/// The user-visible message returned when the generation API fails.
const DEFAULT_FALLBACK_MESSAGE: &str =
    "I'm having trouble connecting to the AI right now. Please try again in a moment.";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Natural-language instructions and canned replies for the chat surface.
///
/// Kept as data so the persona can be tuned without touching the adapters.
#[derive(Clone, Debug)]
pub struct Persona {
    pub preamble: String,
    pub fallback_message: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PERSONA_PREAMBLE.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    /// Character budget for the aggregated library context.
    pub aggregate_char_budget: usize,
    /// Character budget for grounding text per generation request. Distinct
    /// from and generally smaller than the aggregate budget.
    pub model_input_budget: usize,
    /// How many extractions may run simultaneously during a build.
    pub extraction_concurrency: usize,
    /// Deadline for one blob fetch + extraction, in seconds.
    pub extraction_timeout_secs: u64,
    /// Extractions yielding at most this many characters are marked too short.
    pub min_extracted_chars: usize,
    /// Seconds without activity before a chat session is flagged idle. The
    /// original implementation disagreed with itself about this value, so it
    /// is a parameter rather than a constant.
    pub idle_threshold_secs: u64,
    pub persona: Persona,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Database and Logging Settings ---
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Adapter and Budget Settings ---
        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let aggregate_char_budget = parse_var("AGGREGATE_CHAR_BUDGET", 400_000)?;
        let model_input_budget = parse_var("MODEL_INPUT_BUDGET", 30_000)?;
        let extraction_concurrency = parse_var("EXTRACTION_CONCURRENCY", 8)?;
        let extraction_timeout_secs = parse_var("EXTRACTION_TIMEOUT_SECS", 60)?;
        let min_extracted_chars = parse_var("MIN_EXTRACTED_CHARS", 50)?;
        let idle_threshold_secs = parse_var("IDLE_THRESHOLD_SECS", 300)?;

        // --- Load Persona Overrides ---
        let mut persona = Persona::default();
        if let Ok(preamble) = std::env::var("PERSONA_PREAMBLE") {
            persona.preamble = preamble;
        }
        if let Ok(fallback) = std::env::var("FALLBACK_MESSAGE") {
            persona.fallback_message = fallback;
        }

        Ok(Self {
            database_url,
            log_level,
            openai_api_key,
            chat_model,
            aggregate_char_budget,
            model_input_budget,
            extraction_concurrency,
            extraction_timeout_secs,
            min_extracted_chars,
            idle_threshold_secs,
            persona,
        })
    }
}

/// Parses an optional numeric environment variable, falling back to a default.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}
