//! Mock LLM provider for testing

use crate::client::{LLMClient, LLMRequest, LLMResponse};
use crate::error::{LLMError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock LLM provider for testing
pub struct MockProvider {
    name: String,
    default_response: String,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            default_response: "Mock LLM response".to_string(),
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create with custom default response
    pub fn with_response(response: String) -> Self {
        Self {
            default_response: response,
            ..Self::new()
        }
    }

    /// Create a provider whose every call fails with `ApiCallFailed`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Sleep before answering, to exercise caller timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for MockProvider {
    async fn call(&self, request: LLMRequest) -> Result<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(LLMError::ApiCallFailed(message.clone()));
        }

        Ok(LLMResponse::new(self.default_response.clone(), request.model)
            .with_tokens(10)
            .with_finish_reason("stop".to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockProvider::new();
        let request = LLMRequest::new("Test".to_string(), "mock-model".to_string());

        let response = provider.call(request).await.unwrap();
        assert_eq!(response.content, "Mock LLM response");
        assert_eq!(response.model, "mock-model");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_failing() {
        let provider = MockProvider::failing("connection reset");
        let request = LLMRequest::new("Test".to_string(), "mock-model".to_string());

        let err = provider.call(request).await.unwrap_err();
        assert!(matches!(err, LLMError::ApiCallFailed(ref msg) if msg == "connection reset"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_provider_delay() {
        let provider = MockProvider::with_response("{}".to_string())
            .with_delay(Duration::from_secs(5));
        let request = LLMRequest::new("Test".to_string(), "mock-model".to_string());

        let started = tokio::time::Instant::now();
        let response = provider.call(request).await.unwrap();
        assert_eq!(response.content, "{}");
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
