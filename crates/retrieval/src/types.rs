//! Retrieval system type definitions.

use serde::{Deserialize, Serialize};

/// A document as delivered by the knowledge source.
///
/// The source is a flat JSON array of these objects, fetched once at index
/// build time. The schema is fixed; there is no pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// Unique document identifier
    pub id: i64,

    /// Filesystem-style path of the document in the content repository
    pub path: String,

    /// Logical locator of the document on the site
    pub route: String,

    /// Full text content
    pub content: String,
}

/// A knowledge entry held by the vector index.
///
/// Created once at index build time and immutable afterward; owned
/// exclusively by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Unique entry identifier (carried over from the source document)
    pub id: i64,

    /// Logical document locator
    pub route: String,

    /// Text content
    pub content: String,

    /// Precomputed embedding vector (unit-normalized)
    pub embedding: Vec<f32>,
}
