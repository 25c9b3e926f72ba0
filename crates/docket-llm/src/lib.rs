//! Docket LLM Backend Layer
//!
//! Implementations of the [`Backend`](docket_domain::traits::Backend) trait from
//! `docket-domain`. A backend is a blocking text-in/text-out function; the
//! pipeline never retries a failed call, it surfaces the [`LlmError`] unchanged.
//!
//! # Backends
//!
//! - [`MockBackend`]: scripted, deterministic responses for tests and offline runs
//! - [`OllamaBackend`]: local Ollama HTTP API
//!
//! # Examples
//!
//! ```
//! use docket_llm::MockBackend;
//! use docket_domain::traits::Backend;
//!
//! let backend = MockBackend::new("[]");
//! assert_eq!(backend.invoke("extract entities").unwrap(), "[]");
//! ```

#![warn(missing_docs)]

pub mod mock;
pub mod ollama;

use thiserror::Error;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;

/// Errors that can occur while invoking a backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The backend answered with something that is not a completion
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available on the backend
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Local runtime could not be created
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}
