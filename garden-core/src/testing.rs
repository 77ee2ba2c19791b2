//! Testing utilities.
//!
//! [`MockBackend`] stands in for the language model so gateway and session
//! flows can be tested without network access.

use crate::gateway::{ChatRequest, CompletionBackend, GatewayError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// A scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Whole completion text.
    Text(String),
    /// Completion delivered in pieces when streamed.
    Chunks(Vec<String>),
    /// Backend failure with a message.
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockReply>,
    requests: Vec<ChatRequest>,
}

/// A completion backend that returns scripted replies in order and records
/// every request it receives.
///
/// Clones share the same script and request log. Once the script runs out
/// every call fails.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text reply.
    pub fn respond(self, text: impl Into<String>) -> Self {
        self.push(MockReply::Text(text.into()));
        self
    }

    /// Queue a reply that streams as the given chunks.
    pub fn respond_in_chunks(self, chunks: &[&str]) -> Self {
        self.push(MockReply::Chunks(chunks.iter().map(|c| c.to_string()).collect()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(MockReply::Fail(message.into()));
        self
    }

    /// Queue a reply on a shared handle.
    pub fn push(&self, reply: MockReply) {
        self.state().script.push_back(reply);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.state().requests.clone()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.state().script.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self, request: ChatRequest) -> MockReply {
        let mut state = self.state();
        state.requests.push(request);
        state
            .script
            .pop_front()
            .unwrap_or_else(|| MockReply::Fail("no scripted response".to_string()))
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, request: ChatRequest) -> Result<String, GatewayError> {
        match self.next_reply(request) {
            MockReply::Text(text) => Ok(text),
            MockReply::Chunks(chunks) => Ok(chunks.concat()),
            MockReply::Fail(message) => Err(GatewayError::Backend(message)),
        }
    }

    async fn stream(
        &self,
        request: ChatRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<String, GatewayError> {
        match self.next_reply(request) {
            MockReply::Text(text) => {
                on_chunk(&text);
                Ok(text)
            }
            MockReply::Chunks(chunks) => {
                for chunk in &chunks {
                    on_chunk(chunk);
                }
                Ok(chunks.concat())
            }
            MockReply::Fail(message) => Err(GatewayError::Backend(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_fails() {
        let backend = MockBackend::new().respond("one").fail("boom");
        let request = ChatRequest::new("system", "user");
        assert_eq!(backend.complete(request.clone()).await.unwrap(), "one");
        assert!(matches!(
            backend.complete(request.clone()).await,
            Err(GatewayError::Backend(m)) if m == "boom"
        ));
        assert!(backend.complete(request).await.is_err());
        assert_eq!(backend.requests().len(), 3);
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_script() {
        let backend = MockBackend::new();
        let other = backend.clone();
        other.push(MockReply::Text("shared".to_string()));
        assert_eq!(
            backend.complete(ChatRequest::new("s", "u")).await.unwrap(),
            "shared"
        );
        assert_eq!(other.requests()[0].user, "u");
    }
}
