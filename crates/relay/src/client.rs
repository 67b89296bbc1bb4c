//! Completion client abstraction and request/response types.
//!
//! This module defines the wire types shared by the relay, the upstream
//! provider client, and the chat consumer.

use futures::Stream;
use serde::{Deserialize, Serialize};
use sitechat_core::AppResult;
use std::pin::Pin;

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions and retrieved context
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
}

/// One conversation message. Immutable once appended to a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the message
    pub role: Role,

    /// Message text
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chat completion request in the provider wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,

    /// Ordered conversation messages
    pub messages: Vec<Message>,

    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Enable incremental output
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Create a new request with required fields.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            stream: false,
        }
    }

    /// Enable streaming for this request.
    pub fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Buffered chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Completion choices; the answer lives in the first one
    pub choices: Vec<ChatChoice>,

    /// Model that generated the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ChoiceMessage,
}

/// Message payload inside a completion choice.
///
/// `content` is optional because providers omit it on filtered or empty
/// completions; callers treat absence as a protocol error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Role of the generated message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Generated text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// The answer text, if the provider returned one.
    pub fn answer(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// Raw byte stream in the provider's line-delimited `data: {...}` framing,
/// terminated by `data: [DONE]`.
pub type ByteStream = Pin<Box<dyn Stream<Item = AppResult<Vec<u8>>> + Send>>;

/// Trait for completion providers.
///
/// This trait abstracts the upstream completion API behind the relay. Both
/// modes are stateless with respect to prior calls.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the provider name (e.g., "openai-compat").
    fn provider_name(&self) -> &str;

    /// Perform a buffered completion.
    ///
    /// # Errors
    /// `Config` if no credential is configured (no network call is made),
    /// `Upstream` on a non-success status, `UpstreamProtocol` when the
    /// response lacks the expected answer field.
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatCompletion>;

    /// Perform a streaming completion.
    ///
    /// Returns the provider's byte stream unchanged: bytes are relayed as
    /// they arrive, in provider order, with no whole-response buffering.
    async fn stream_bytes(&self, request: &ChatRequest) -> AppResult<ByteStream>;
}
