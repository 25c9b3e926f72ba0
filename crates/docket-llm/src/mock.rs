//! Scripted backend for deterministic tests

use crate::LlmError;
use docket_domain::traits::Backend;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Marker response that makes the mock fail instead of answering
const ERROR_MARKER: &str = "ERROR";

#[derive(Debug, Default)]
struct Script {
    exact: HashMap<String, String>,
    containing: Vec<(String, String)>,
    prompts: Vec<String>,
}

/// Mock backend returning pre-configured responses without any network calls
///
/// Lookup order for a prompt: an exact match, then the first registered fragment
/// contained in the prompt, then the default response. Clones share the same
/// script and call log.
///
/// # Examples
///
/// ```
/// use docket_llm::MockBackend;
/// use docket_domain::traits::Backend;
///
/// let mut backend = MockBackend::default();
/// backend.add_response("ping", "pong");
/// backend.add_response_containing("unequal pay", r#"[{"type": "claim"}]"#);
/// backend.add_error("boom");
///
/// assert_eq!(backend.invoke("ping").unwrap(), "pong");
/// assert!(backend.invoke("...complained about unequal pay...").unwrap().contains("claim"));
/// assert!(backend.invoke("boom").is_err());
/// assert_eq!(backend.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    default_response: String,
    script: Arc<Mutex<Script>>,
}

impl MockBackend {
    /// Create a mock with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// Create a mock that fails on every prompt
    pub fn failing() -> Self {
        Self::new(ERROR_MARKER)
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not take every other clone down with it
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Respond to an exact prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.script().exact.insert(prompt.into(), response.into());
    }

    /// Respond to any prompt containing `fragment`
    pub fn add_response_containing(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        self.script().containing.push((fragment.into(), response.into()));
    }

    /// Fail on an exact prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.add_response(prompt, ERROR_MARKER);
    }

    /// Fail on any prompt containing `fragment`
    pub fn add_error_containing(&mut self, fragment: impl Into<String>) {
        self.add_response_containing(fragment, ERROR_MARKER);
    }

    /// Number of times `invoke` was called
    pub fn call_count(&self) -> usize {
        self.script().prompts.len()
    }

    /// Every prompt received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.script().prompts.clone()
    }

    /// Forget the call log
    pub fn reset_call_count(&self) {
        self.script().prompts.clear();
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl Backend for MockBackend {
    type Error = LlmError;

    fn invoke(&self, prompt: &str) -> Result<String, Self::Error> {
        let mut script = self.script();
        script.prompts.push(prompt.to_string());

        let response = script
            .exact
            .get(prompt)
            .or_else(|| {
                script
                    .containing
                    .iter()
                    .find(|(fragment, _)| prompt.contains(fragment.as_str()))
                    .map(|(_, response)| response)
            })
            .unwrap_or(&self.default_response);

        if response == ERROR_MARKER {
            return Err(LlmError::Other("Mock error".to_string()));
        }
        Ok(response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_default() {
        let backend = MockBackend::new("Test response");
        assert_eq!(backend.invoke("any prompt").unwrap(), "Test response");
    }

    #[test]
    fn test_mock_backend_specific_responses() {
        let mut backend = MockBackend::default();
        backend.add_response("hello", "world");
        backend.add_response("foo", "bar");

        assert_eq!(backend.invoke("hello").unwrap(), "world");
        assert_eq!(backend.invoke("foo").unwrap(), "bar");
        assert_eq!(backend.invoke("unknown").unwrap(), "Default mock response");
    }

    #[test]
    fn test_exact_match_wins_over_fragment() {
        let mut backend = MockBackend::default();
        backend.add_response_containing("hel", "fragment");
        backend.add_response("hello", "exact");

        assert_eq!(backend.invoke("hello").unwrap(), "exact");
        assert_eq!(backend.invoke("help me").unwrap(), "fragment");
    }

    #[test]
    fn test_mock_backend_call_log() {
        let backend = MockBackend::new("test");
        assert_eq!(backend.call_count(), 0);

        backend.invoke("prompt1").unwrap();
        backend.invoke("prompt2").unwrap();
        assert_eq!(backend.call_count(), 2);
        assert_eq!(backend.prompts(), vec!["prompt1", "prompt2"]);

        backend.reset_call_count();
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_mock_backend_errors() {
        let mut backend = MockBackend::default();
        backend.add_error("bad prompt");
        backend.add_error_containing("explode");

        assert!(matches!(backend.invoke("bad prompt"), Err(LlmError::Other(_))));
        assert!(backend.invoke("please explode now").is_err());
        assert!(MockBackend::failing().invoke("anything").is_err());
    }

    #[test]
    fn test_clones_share_script() {
        let mut backend1 = MockBackend::new("test");
        let backend2 = backend1.clone();
        backend1.add_response("late", "added");

        assert_eq!(backend2.invoke("late").unwrap(), "added");
        assert_eq!(backend1.call_count(), 1);
    }

    #[test]
    fn test_boxed_backend() {
        let boxed: Box<dyn Backend<Error = LlmError>> = Box::new(MockBackend::new("boxed"));
        assert_eq!(boxed.invoke("x").unwrap(), "boxed");
    }
}
