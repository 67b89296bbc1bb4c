//! Transport seam between the conversation controller and the relay.
//!
//! The controller only needs "open a byte stream for this message list";
//! production implementations go over HTTP to the relay surface or wrap a
//! completion client in-process, and tests substitute scripted fakes.

use futures::StreamExt;
use sitechat_core::{AppConfig, AppError, AppResult};
use sitechat_relay::{ByteStream, ChatRequest, ChatTurnRequest, CompletionClient, Message};
use std::sync::Arc;

/// Trait for opening a streaming completion for a conversation.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open a streaming completion over the given message list.
    ///
    /// The returned stream carries line-delimited `data: {...}` frames
    /// terminated by `data: [DONE]`.
    async fn open_stream(&self, messages: &[Message]) -> AppResult<ByteStream>;
}

/// HTTP transport calling a relay server's `POST /chat` endpoint.
pub struct RelayTransport {
    base_url: String,
    client: reqwest::Client,
}

impl RelayTransport {
    /// Create a transport against the relay at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for RelayTransport {
    async fn open_stream(&self, messages: &[Message]) -> AppResult<ByteStream> {
        let url = format!("{}/chat", self.base_url.trim_end_matches('/'));
        let body = ChatTurnRequest {
            messages: messages.to_vec(),
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Stream(format!("Failed to reach relay: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Upstream { status, message });
        }

        let stream = response.bytes_stream().map(|result| {
            result
                .map(|bytes| bytes.to_vec())
                .map_err(|e| AppError::Stream(format!("Relay read failed: {}", e)))
        });

        Ok(Box::pin(stream))
    }
}

/// In-process transport wrapping a completion client directly, skipping
/// the HTTP hop. Used by the CLI.
pub struct ClientTransport {
    client: Arc<dyn CompletionClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ClientTransport {
    /// Wrap a completion client with the request defaults from config.
    pub fn new(client: Arc<dyn CompletionClient>, config: &AppConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for ClientTransport {
    async fn open_stream(&self, messages: &[Message]) -> AppResult<ByteStream> {
        let request = ChatRequest::new(self.model.clone(), messages.to_vec())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_streaming();

        self.client.stream_bytes(&request).await
    }
}
