//! Ollama backend
//!
//! Talks to a local Ollama instance over HTTP. The request itself is async
//! ([`OllamaBackend::generate`]); the [`Backend`] impl drives it to completion on
//! a private runtime, so it must not be called from inside another tokio runtime.
//!
//! A single attempt is made per call. Retry and backoff belong to the caller.
//!
//! # Examples
//!
//! ```no_run
//! use docket_llm::OllamaBackend;
//! use docket_domain::traits::Backend;
//!
//! let backend = OllamaBackend::new("http://localhost:11434", "llama3");
//! let text = backend.invoke("Summarize: ...")?;
//! # Ok::<(), docket_llm::LlmError>(())
//! ```

use crate::LlmError;
use docket_domain::traits::Backend;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for a generate request
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Ollama API backend for local inference
pub struct OllamaBackend {
    endpoint: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

impl OllamaBackend {
    /// Create a backend for `model` served at `endpoint`
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
            client: build_client(timeout),
        }
    }

    /// Create a backend on [`DEFAULT_ENDPOINT`]
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }

    /// Endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion
    ///
    /// # Errors
    ///
    /// - [`LlmError::ModelNotAvailable`] when Ollama answers 404
    /// - [`LlmError::Communication`] for transport failures and other HTTP errors
    /// - [`LlmError::InvalidResponse`] when the body is not a generate response
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending Ollama generate request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, text)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        debug!(response_len = parsed.response.len(), "Ollama response received");
        Ok(parsed.response)
    }
}

impl Backend for OllamaBackend {
    type Error = LlmError;

    fn invoke(&self, prompt: &str) -> Result<String, Self::Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Runtime(e.to_string()))?;
        runtime.block_on(self.generate(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_backend_creation() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3");
        assert_eq!(backend.endpoint(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3");
        assert_eq!(backend.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_ollama_backend_default_endpoint() {
        let backend = OllamaBackend::default_endpoint("mistral").with_timeout(Duration::from_secs(5));
        assert_eq!(backend.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(backend.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unreachable_endpoint_is_communication_error() {
        // Port 9 (discard) is closed on any sane test host
        let backend = OllamaBackend::new("http://127.0.0.1:9", "llama3")
            .with_timeout(Duration::from_secs(2));
        let result = backend.invoke("test");
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }

    #[tokio::test]
    #[ignore] // Only run when Ollama is available
    async fn test_ollama_generate_integration() {
        let backend = OllamaBackend::default_endpoint("llama3");
        if let Ok(response) = backend.generate("Say 'hello' and nothing else").await {
            assert!(!response.is_empty());
        }
    }
}
