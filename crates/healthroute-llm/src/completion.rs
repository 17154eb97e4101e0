//! Completion source seam.
//!
//! The assistant never talks to a model directly; it asks a
//! [`CompletionSource`] for one opaque string per prompt.

use std::sync::Mutex;

use thiserror::Error;

/// Token budget for meal plan requests.
pub const MEAL_PLAN_MAX_TOKENS: u32 = 800;
/// Token budget for ordinary chat turns.
pub const CHAT_MAX_TOKENS: u32 = 300;

/// Completion errors.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion source failed: {0}")]
    Source(String),

    #[error("Completion was empty")]
    Empty,
}

pub type CompletionResult<T> = Result<T, CompletionError>;

/// Anything that turns a prompt into generated text.
pub trait CompletionSource {
    fn complete(&self, prompt: &str, max_tokens: u32) -> CompletionResult<String>;
}

impl<F> CompletionSource for F
where
    F: Fn(&str, u32) -> CompletionResult<String>,
{
    fn complete(&self, prompt: &str, max_tokens: u32) -> CompletionResult<String> {
        self(prompt, max_tokens)
    }
}

/// Canned completion source for testing without a model.
pub struct MockCompletion {
    response: Result<String, String>,
    requests: Mutex<Vec<(String, u32)>>,
}

impl MockCompletion {
    /// Always answer with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Prompts and token budgets seen so far.
    pub fn requests(&self) -> Vec<(String, u32)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl CompletionSource for MockCompletion {
    fn complete(&self, prompt: &str, max_tokens: u32) -> CompletionResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((prompt.to_string(), max_tokens));
        }
        self.response.clone().map_err(CompletionError::Source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_requests() {
        let mock = MockCompletion::new("hello");
        assert_eq!(mock.complete("prompt", CHAT_MAX_TOKENS).unwrap(), "hello");
        assert_eq!(mock.requests(), vec![("prompt".to_string(), 300)]);
    }

    #[test]
    fn test_mock_failure() {
        let mock = MockCompletion::failing("HTTP 503");
        let err = mock.complete("prompt", MEAL_PLAN_MAX_TOKENS).unwrap_err();
        assert!(matches!(err, CompletionError::Source(ref m) if m == "HTTP 503"));
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn test_closure_source() {
        let source = |prompt: &str, max_tokens: u32| -> CompletionResult<String> {
            Ok(format!("{}:{}", prompt.len(), max_tokens))
        };
        assert_eq!(source.complete("abc", 10).unwrap(), "3:10");
    }
}
