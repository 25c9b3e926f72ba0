//! Denoiser error types

use thiserror::Error;

/// Errors that can occur in the denoiser
///
/// Answers that cannot be applied are not errors: they come back as empty diffs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DenoiserError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
