//! OpenAI-compatible completion provider.
//!
//! Talks to any endpoint implementing the chat-completions wire format:
//! `POST {base_url}/chat/completions` with a bearer credential, buffered
//! JSON response or line-delimited `data: {...}` stream.

use crate::client::{ByteStream, ChatCompletion, ChatRequest, CompletionClient};
use futures::StreamExt;
use sitechat_core::{AppConfig, AppError, AppResult};

/// OpenAI-compatible completion client.
pub struct OpenAiCompatClient {
    /// Base URL of the provider API
    base_url: String,

    /// Bearer credential; absence is a request-time configuration error
    api_key: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a client for the given endpoint and credential.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.endpoint.clone(), config.resolve_api_key())
    }

    /// Resolve the credential, failing fast before any network call.
    fn credential(&self) -> AppResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            AppError::Config("Completion provider credential is not configured".to_string())
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: &ChatRequest) -> AppResult<reqwest::Response> {
        let credential = self.credential()?;

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Stream(format!("Failed to reach provider: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Upstream { status, message });
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiCompatClient {
    fn provider_name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatCompletion> {
        tracing::info!("Sending buffered completion request");
        tracing::debug!("Request: {:?}", request);

        let mut request = request.clone();
        request.stream = false;

        let response = self.send(&request).await?;

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            AppError::UpstreamProtocol(format!("Failed to parse provider response: {}", e))
        })?;

        if completion.answer().is_none() {
            return Err(AppError::UpstreamProtocol(
                "Provider response is missing the answer content".to_string(),
            ));
        }

        tracing::info!("Received completion from provider");

        Ok(completion)
    }

    async fn stream_bytes(&self, request: &ChatRequest) -> AppResult<ByteStream> {
        tracing::info!("Opening streaming completion request");
        tracing::debug!("Request: {:?}", request);

        let mut request = request.clone();
        request.stream = true;

        let response = self.send(&request).await?;

        // Relay bytes exactly as they arrive; the provider already emits
        // line-delimited `data: {...}` frames ending with `data: [DONE]`
        let stream = response.bytes_stream().map(|result| {
            result
                .map(|bytes| bytes.to_vec())
                .map_err(|e| AppError::Stream(format!("Upstream read failed: {}", e)))
        });

        Ok(Box::pin(stream))
    }
}
