//! Knowledge document sources.
//!
//! The retriever fetches its documents exactly once, at index build time,
//! from a [`DocumentSource`]. The production source is an HTTP endpoint
//! serving a flat JSON array; an in-memory source exists for tests and
//! embedded deployments.

use crate::types::RawDocument;
use sitechat_core::{AppError, AppResult};

/// Trait for knowledge document sources.
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch all documents.
    ///
    /// Failure maps to [`AppError::SourceUnavailable`]; callers degrade to
    /// an empty retrieval context rather than aborting the turn.
    async fn fetch(&self) -> AppResult<Vec<RawDocument>>;
}

/// HTTP document source.
///
/// Fetches a JSON array of `{id, path, route, content}` objects from a
/// single URL.
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a new HTTP source for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self) -> AppResult<Vec<RawDocument>> {
        tracing::info!("Fetching knowledge documents from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::SourceUnavailable(format!(
                "Document source returned status {}",
                response.status()
            )));
        }

        let documents: Vec<RawDocument> = response
            .json()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Invalid document payload: {}", e)))?;

        tracing::debug!("Fetched {} documents", documents.len());

        Ok(documents)
    }
}

/// In-memory document source with a fixed document set.
pub struct StaticSource {
    documents: Vec<RawDocument>,
}

impl StaticSource {
    /// Create a source serving the given documents.
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self { documents }
    }
}

#[async_trait::async_trait]
impl DocumentSource for StaticSource {
    async fn fetch(&self) -> AppResult<Vec<RawDocument>> {
        Ok(self.documents.clone())
    }
}
