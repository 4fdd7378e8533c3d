//! Error types for the response evaluator.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur while evaluating a response.
#[derive(Error, Debug)]
pub enum EvalError {
    /// The transcript matches none of the recognized shapes.
    #[error("Unsupported transcript format, top-level keys: [{}]", .keys.join(", "))]
    UnsupportedFormat { keys: Vec<String> },

    /// The transcript shape was recognized but one of its turns is invalid.
    #[error("Malformed transcript: {0}")]
    MalformedTranscript(String),

    /// Relevance needs at least one context passage.
    #[error("Cannot score relevance against an empty context set")]
    EmptyContext,

    /// A context passage is unusable (e.g. empty text).
    #[error("Invalid context passage: {0}")]
    InvalidContext(String),

    /// The generator failed to produce a response.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The generator did not answer within the configured bound.
    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    /// The embedding capability failed or returned an unexpected shape.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an `UnsupportedFormat` error from the keys of a JSON object.
    pub fn unsupported_format<'a>(keys: impl IntoIterator<Item = &'a String>) -> Self {
        let mut keys: Vec<String> = keys.into_iter().cloned().collect();
        keys.sort();
        Self::UnsupportedFormat { keys }
    }
}

impl From<reqwest::Error> for EvalError {
    fn from(err: reqwest::Error) -> Self {
        EvalError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::LlmParse(err.to_string())
    }
}
