//! Error types for the builders

use docket_llm::LlmError;
use thiserror::Error;

/// Errors that can occur while building graphs
///
/// Malformed model output is not an error: the builders fall back to the keyword
/// pass. Only a failed backend call is surfaced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// The backend call itself failed
    #[error("Backend error: {0}")]
    Backend(#[from] LlmError),

    /// Model output could not be interpreted
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
