//! Mock LLM Provider for testing
//!
//! Responses are served from a FIFO queue first, then from an optional
//! handler closure, then a fixed `"mock response"` text.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use crate::provider::LlmProvider;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync;

/// A mock LLM provider that returns scripted responses.
#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    handler: Option<Arc<Handler>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Option<Duration>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("has_handler", &self.handler.is_some())
            .field("delay", &self.delay)
            .finish()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            handler: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Answer every request not covered by the queue with `handler`.
    #[must_use]
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sleep before answering, to exercise timeouts and cancellation.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response.
    pub fn push_response(&self, content: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(content.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: crate::error::Error) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Snapshot of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let content = match (queued, &self.handler) {
            (Some(response), _) => response?,
            (None, Some(handler)) => handler(&request)?,
            (None, None) => "mock response".to_string(),
        };

        Ok(CompletionResponse::text(content, "mock-model"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::message::Message;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new("mock-model").with_message(Message::user(text))
    }

    #[tokio::test]
    async fn test_queue_then_handler_then_default() {
        let provider = MockProvider::new();
        provider.push_response("first");
        provider.push_error(Error::Api("boom".to_string()));

        let first = provider.complete(request("a")).await.unwrap();
        assert_eq!(first.content, "first");
        assert!(provider.complete(request("b")).await.is_err());
        assert_eq!(
            provider.complete(request("c")).await.unwrap().content,
            "mock response"
        );
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_handler_sees_request() {
        let provider = MockProvider::new().with_handler(|req| {
            Ok(format!("echo:{}", req.messages.last().map(|m| m.content.as_str()).unwrap_or("")))
        });

        let response = provider.complete(request("ping")).await.unwrap();
        assert_eq!(response.content, "echo:ping");
        assert_eq!(provider.requests()[0].messages[0].content, "ping");
    }

    #[test]
    fn test_clones_share_queue() {
        let provider = MockProvider::new();
        let clone = provider.clone();
        clone.push_response("shared");

        let response = tokio_test::block_on(provider.complete(request("x"))).unwrap();
        assert_eq!(response.content, "shared");
        assert_eq!(clone.request_count(), 1);
    }
}
