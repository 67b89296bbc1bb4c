//! Knowledge retrieval for sitechat.
//!
//! Provides an in-memory semantic search engine over a static knowledge
//! base: a document source, an embedding provider seam, a build-once vector
//! index, and a caching retriever.
//!
//! # Example
//! ```no_run
//! use sitechat_retrieval::{HttpSource, Retriever, TrigramEmbedder};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retriever = Retriever::new(
//!     Arc::new(HttpSource::new("http://localhost:3000/api/knowledge")),
//!     Arc::new(TrigramEmbedder::default()),
//!     256,
//! );
//! let entries = retriever.query("opening hours", 3).await?;
//! for entry in entries.iter() {
//!     println!("{}: {}", entry.route, entry.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod embedding;
pub mod index;
pub mod retriever;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use embedding::{cosine_similarity, EmbeddingProvider, TrigramEmbedder};
pub use index::VectorIndex;
pub use retriever::Retriever;
pub use source::{DocumentSource, HttpSource, StaticSource};
pub use types::{KnowledgeEntry, RawDocument};
