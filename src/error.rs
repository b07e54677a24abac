//! Error types for the fantasy advisor.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Errors that can occur while building recommendations.
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Missing or malformed configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No team in the league carries the configured name.
    #[error("No team named '{name}' in league (found: {available})")]
    TeamNotFound { name: String, available: String },

    /// Prompt template does not match its kind's placeholders.
    #[error("Template error in {kind} prompt: {message}")]
    Template { kind: String, message: String },

    /// ESPN fantasy API error.
    #[error("League API error: {0}")]
    LeagueApi(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Response body could not be parsed.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl AdvisorError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a template error for the given prompt kind.
    pub fn template(kind: impl ToString, message: impl Into<String>) -> Self {
        Self::Template {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AdvisorError {
    fn from(err: reqwest::Error) -> Self {
        AdvisorError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        AdvisorError::Parse(err.to_string())
    }
}
