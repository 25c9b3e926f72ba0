//! Matcher error types

use thiserror::Error;

/// Errors that can occur in the matcher
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatcherError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
