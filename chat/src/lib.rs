//! Minimal client for OpenAI-compatible chat completion APIs.
//!
//! This crate provides a focused client for the `/chat/completions` endpoint with:
//! - Non-streaming completions
//! - Streaming completions with buffered SSE parsing
//! - A configurable base URL, so any compatible server works

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio_stream::Stream;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when using the chat client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Builder for [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatClientBuilder {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl ChatClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ChatClient, Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(ChatClient {
            client,
            api_key: self.api_key,
            base_url: self.base_url,
            model: self.model,
        })
    }
}

/// Chat completions API client.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Start building a client for the given API key.
    pub fn builder(api_key: impl Into<String>) -> ChatClientBuilder {
        ChatClientBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Create a client with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::builder(api_key).build()
    }

    /// Create a client from the OPENAI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::NoApiKey)?;
        Self::new(api_key)
    }

    /// The model used when a request does not name one.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a completion request and return the full response.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        let api_request = self.build_api_request(&request, false);
        let response = self.send(&api_request).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parse_response(api_response))
    }

    /// Send a completion request and stream the response.
    pub async fn stream(
        &self,
        request: Request,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>, Error> {
        let api_request = self.build_api_request(&request, true);
        let response = self.send(&api_request).await?;

        // Use scan to keep partial SSE lines across chunks
        let stream = response
            .bytes_stream()
            .scan(Vec::new(), |buffer, result| {
                let events = match result {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);
                        parse_sse_events_buffered(buffer)
                    }
                    Err(e) => vec![Err(Error::Network(e.to_string()))],
                };
                futures::future::ready(Some(events))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(stream))
    }

    async fn send(&self, api_request: &ApiRequest) -> Result<reqwest::Response, Error> {
        let headers = self.build_headers()?;
        debug!(
            model = %api_request.model,
            stream = api_request.stream,
            messages = api_request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(headers)
            .json(api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        Ok(response)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    fn build_api_request(&self, request: &Request, stream: bool) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }
}

fn parse_response(api_response: ApiResponse) -> Response {
    let choices = api_response
        .choices
        .into_iter()
        .map(|c| Choice {
            index: c.index,
            content: c.message.content,
            finish_reason: c.finish_reason.as_deref().map(FinishReason::parse),
        })
        .collect();

    Response {
        id: api_response.id,
        model: api_response.model,
        choices,
        usage: api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A chat completion request.
#[derive(Debug, Clone)]
pub struct Request {
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl Request {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Shorthand for the common system + user prompt pair.
    pub fn system_user(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self::new(vec![Message::system(system), Message::user(user)])
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

impl Response {
    /// Text of the first choice, if the model produced any.
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.content.as_deref())
    }
}

/// One generated alternative.
#[derive(Debug, Clone)]
pub struct Choice {
    pub index: usize,
    pub content: Option<String>,
    pub finish_reason: Option<FinishReason>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    fn parse(s: &str) -> Self {
        match s {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

// ============================================================================
// Streaming types
// ============================================================================

/// Events from a streaming response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A piece of generated text for a choice.
    TextDelta { index: usize, text: String },
    /// A choice finished.
    Finish { index: usize, reason: FinishReason },
    /// The server sent `[DONE]`.
    Done,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    index: usize,
    message: ApiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ApiStreamChunk {
    #[serde(default)]
    choices: Vec<ApiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiStreamChoice {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    delta: ApiDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Parse complete SSE lines out of `buffer`, leaving any partial line behind.
///
/// The buffer holds raw bytes so a multi-byte character split across network
/// chunks is only decoded once its line is complete.
fn parse_sse_events_buffered(buffer: &mut Vec<u8>) -> Vec<Result<StreamEvent, Error>> {
    let mut events = Vec::new();

    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
        match std::str::from_utf8(&buffer[..newline_pos]) {
            Ok(line) => parse_sse_line(line.trim_end_matches('\r'), &mut events),
            Err(e) => events.push(Err(Error::Parse(format!("SSE line is not UTF-8: {e}")))),
        }
        buffer.drain(..=newline_pos);
    }

    events
}

fn parse_sse_line(line: &str, events: &mut Vec<Result<StreamEvent, Error>>) {
    // event:, id:, comments and blank separators carry nothing we need
    let Some(json_str) = line.strip_prefix("data:") else {
        return;
    };
    let json_str = json_str.trim_start();
    if json_str == "[DONE]" {
        events.push(Ok(StreamEvent::Done));
    } else if !json_str.is_empty() {
        // A newline-terminated line is complete, so a truncated payload is an error
        match serde_json::from_str::<ApiStreamChunk>(json_str) {
            Ok(chunk) => events.extend(convert_stream_chunk(chunk).into_iter().map(Ok)),
            Err(e) => events.push(Err(Error::Parse(format!("SSE parse error: {e}")))),
        }
    }
}

fn convert_stream_chunk(chunk: ApiStreamChunk) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    for choice in chunk.choices {
        if let Some(text) = choice.delta.content {
            if !text.is_empty() {
                events.push(StreamEvent::TextDelta {
                    index: choice.index,
                    text,
                });
            }
        }
        if let Some(reason) = choice.finish_reason {
            events.push(StreamEvent::Finish {
                index: choice.index,
                reason: FinishReason::parse(&reason),
            });
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ChatClient::new("test-key").unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_builder_overrides() {
        let client = ChatClient::builder("test-key")
            .model("local-model")
            .base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(client.model(), "local-model");
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(ChatClient::new("  "), Err(Error::NoApiKey)));
    }

    #[test]
    fn test_request_builder() {
        let request = Request::system_user("Be brief", "Hello")
            .with_max_tokens(50)
            .with_temperature(0.3);

        assert_eq!(request.max_tokens, Some(50));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1], Message::user("Hello"));
    }

    #[test]
    fn test_api_request_shape() {
        let client = ChatClient::new("test-key").unwrap();
        let request = Request::system_user("sys", "usr")
            .with_temperature(0.7)
            .with_max_tokens(200);
        let body = serde_json::to_value(client.build_api_request(&request, false)).unwrap();

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
        assert_eq!(body["max_tokens"], 200);
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_parse_response_first_choice() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "joy"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 1, "total_tokens": 13}
        }"#;
        let response = parse_response(serde_json::from_str(raw).unwrap());
        assert_eq!(response.first_text(), Some("joy"));
        assert_eq!(response.choices[0].finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().completion_tokens, 1);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let response = parse_response(serde_json::from_str(r#"{"choices": []}"#).unwrap());
        assert_eq!(response.first_text(), None);
    }

    #[test]
    fn test_sse_buffering_across_chunks() {
        let mut buffer = b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel".to_vec();
        assert!(parse_sse_events_buffered(&mut buffer).is_empty());

        buffer.extend_from_slice(b"lo\"}}]}\n\ndata: [DONE]\n");
        let events: Vec<_> = parse_sse_events_buffered(&mut buffer)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta {
                    index: 0,
                    text: "Hello".to_string()
                },
                StreamEvent::Done,
            ]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_sse_finish_reason() {
        let mut buffer =
            b"data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"length\"}]}\r\n".to_vec();
        let events = parse_sse_events_buffered(&mut buffer);
        assert!(matches!(
            events[0],
            Ok(StreamEvent::Finish {
                reason: FinishReason::Length,
                ..
            })
        ));
    }

    #[test]
    fn test_sse_character_split_across_chunks() {
        let line = "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"café\"}}]}\n";
        let bytes = line.as_bytes();
        // Split inside the two-byte 'é'
        let split = line.find('é').unwrap() + 1;

        let mut buffer = bytes[..split].to_vec();
        assert!(parse_sse_events_buffered(&mut buffer).is_empty());

        buffer.extend_from_slice(&bytes[split..]);
        let events = parse_sse_events_buffered(&mut buffer);
        assert_eq!(
            events.into_iter().map(Result::unwrap).collect::<Vec<_>>(),
            vec![StreamEvent::TextDelta {
                index: 0,
                text: "café".to_string()
            }]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_sse_truncated_line_does_not_stall() {
        let mut buffer = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"cut\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"next\"}}]}\n",
            "data: [DONE]\n",
        )
        .as_bytes()
        .to_vec();

        let events = parse_sse_events_buffered(&mut buffer);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Err(Error::Parse(_))));
        assert_eq!(
            events[1].as_ref().unwrap(),
            &StreamEvent::TextDelta {
                index: 0,
                text: "next".to_string()
            }
        );
        assert_eq!(events[2].as_ref().unwrap(), &StreamEvent::Done);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_sse_invalid_utf8_line_is_reported() {
        let mut buffer = b"data: \xff\xfe\ndata: [DONE]\n".to_vec();
        let events = parse_sse_events_buffered(&mut buffer);
        assert!(matches!(events[0], Err(Error::Parse(_))));
        assert_eq!(events[1].as_ref().unwrap(), &StreamEvent::Done);
    }
}
