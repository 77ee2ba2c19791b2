//! AI Gateway: sentiment tagging, text completion and relatedness.
//!
//! Every public operation is total. Failures are logged and replaced by a
//! safe default, so callers never handle errors from the language model.

mod pending;
pub mod prompts;

pub use pending::PendingRequest;

use crate::config::GardenConfig;
use crate::memory::{Memory, MemoryId};
use crate::zone::Emotion;
use async_trait::async_trait;
use chat::{ChatClient, StreamEvent};
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from a completion backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Chat API error: {0}")]
    Chat(#[from] chat::Error),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Backend error: {0}")]
    Backend(String),
}

/// A single system + user prompt with sampling settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            max_tokens: 200,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Return the first choice's text.
    async fn complete(&self, request: ChatRequest) -> Result<String, GatewayError>;

    /// Deliver text as it is generated and return all of it.
    ///
    /// The default delivers the whole completion as one chunk.
    async fn stream(
        &self,
        request: ChatRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<String, GatewayError> {
        let text = self.complete(request).await?;
        on_chunk(&text);
        Ok(text)
    }
}

/// Backend that talks to an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct ChatBackend {
    client: ChatClient,
}

impl ChatBackend {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &GardenConfig) -> Result<Self, GatewayError> {
        let key = config.api_key.clone().ok_or(chat::Error::NoApiKey)?;
        let client = ChatClient::builder(key)
            .base_url(config.api_base.clone())
            .model(config.model.clone())
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::new(client))
    }

    fn to_chat_request(request: ChatRequest) -> chat::Request {
        chat::Request::system_user(request.system, request.user)
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens)
    }
}

#[async_trait]
impl CompletionBackend for ChatBackend {
    async fn complete(&self, request: ChatRequest) -> Result<String, GatewayError> {
        let response = self.client.complete(Self::to_chat_request(request)).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or(GatewayError::EmptyResponse)
    }

    async fn stream(
        &self,
        request: ChatRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<String, GatewayError> {
        let mut stream = self.client.stream(Self::to_chat_request(request)).await?;
        let mut text = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::TextDelta { index: 0, text: delta } => {
                    on_chunk(&delta);
                    text.push_str(&delta);
                }
                StreamEvent::Done => break,
                _ => {}
            }
        }

        Ok(text)
    }
}

/// The three language-model operations the garden uses.
#[derive(Clone)]
pub struct AiGateway {
    backend: Arc<dyn CompletionBackend>,
}

impl std::fmt::Debug for AiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiGateway").finish_non_exhaustive()
    }
}

impl AiGateway {
    pub fn new(backend: impl CompletionBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Gateway over the chat API. Fails when no API key is configured.
    pub fn from_config(config: &GardenConfig) -> Result<Self, GatewayError> {
        Ok(Self::new(ChatBackend::from_config(config)?))
    }

    /// Tag `text` with one of the eight emotions. Peace on any failure.
    pub async fn classify_sentiment(&self, text: &str) -> Emotion {
        match self.backend.complete(prompts::sentiment(text)).await {
            Ok(raw) => {
                let emotion = parse_emotion(&raw);
                debug!(raw = %raw.trim(), %emotion, "classified sentiment");
                emotion
            }
            Err(e) => {
                warn!("Sentiment analysis failed: {}", e);
                Emotion::default()
            }
        }
    }

    /// Continue a journal entry. Empty on any failure.
    pub async fn complete_text(&self, partial: &str) -> String {
        match self.backend.complete(prompts::completion(partial)).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Auto-completion failed: {}", e);
                String::new()
            }
        }
    }

    /// Like [`complete_text`](Self::complete_text), delivering text as it arrives.
    ///
    /// Chunks already delivered stay delivered when a failure occurs
    /// mid-stream; the return value is then empty.
    pub async fn complete_text_streaming(
        &self,
        partial: &str,
        mut on_chunk: impl FnMut(&str) + Send,
    ) -> String {
        match self
            .backend
            .stream(prompts::completion(partial), &mut on_chunk)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Streaming auto-completion failed: {}", e);
                String::new()
            }
        }
    }

    /// Ids of memories thematically related to `subject`.
    ///
    /// The subject is never a candidate and never part of the result.
    pub async fn find_related(&self, memories: &[Memory], subject: &Memory) -> Vec<MemoryId> {
        let candidates: Vec<&Memory> = memories.iter().filter(|m| m.id != subject.id).collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let request = prompts::related(subject, candidates.iter().copied());
        match self.backend.complete(request).await {
            Ok(raw) => {
                let ids = parse_related_ids(&raw, subject.id);
                debug!(subject = %subject.id, found = ids.len(), "found related memories");
                ids
            }
            Err(e) => {
                warn!("Finding related memories failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Map model output to an emotion. Anything unrecognised is peace.
pub fn parse_emotion(raw: &str) -> Emotion {
    Emotion::from_key_or_default(raw.trim().trim_matches(|c: char| !c.is_ascii_alphabetic()))
}

/// Parse a comma-separated id list.
///
/// Entries are read leniently (`"#3"`, `"id 3"` and `"3."` all give 3).
/// Entries without a number, duplicates and `subject` are dropped.
pub fn parse_related_ids(raw: &str, subject: MemoryId) -> Vec<MemoryId> {
    let mut ids = Vec::new();
    for entry in raw.split([',', '\n', ';']) {
        let digits: String = entry
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let Ok(raw_id) = digits.parse::<u64>() else {
            continue;
        };
        let id = MemoryId::new(raw_id);
        if id != subject && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
