//! In-memory vector index over the knowledge base.
//!
//! Holds every knowledge entry with its precomputed embedding. Built once
//! from the document source and never mutated afterward; lookups are pure.

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::types::{KnowledgeEntry, RawDocument};
use sitechat_core::AppResult;

/// Immutable index of knowledge entries and their embeddings.
pub struct VectorIndex {
    entries: Vec<KnowledgeEntry>,
}

impl VectorIndex {
    /// Build the index by embedding every document's content.
    ///
    /// Entries keep the order of the document source; ranking ties are
    /// broken by that order.
    pub async fn build(
        documents: &[RawDocument],
        embedder: &dyn EmbeddingProvider,
    ) -> AppResult<Self> {
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let entries = documents
            .iter()
            .zip(embeddings)
            .map(|(doc, embedding)| KnowledgeEntry {
                id: doc.id,
                route: doc.route.clone(),
                content: doc.content.clone(),
                embedding,
            })
            .collect::<Vec<_>>();

        tracing::info!("Built vector index with {} entries", entries.len());

        Ok(Self { entries })
    }

    /// All entries, in source order.
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score every entry against the query embedding and return the top
    /// `limit`, ordered by descending cosine similarity.
    ///
    /// The sort is stable, so equal scores keep source order.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<KnowledgeEntry> {
        let mut scored: Vec<(&KnowledgeEntry, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(limit)
            .map(|(entry, _score)| entry.clone())
            .collect()
    }

    /// Substring scan for short queries.
    ///
    /// An entry matches if any token longer than 3 characters is a
    /// case-insensitive substring of its content. Matches are returned in
    /// source order, truncated to `limit`. Tokens are expected to be
    /// lowercase already (the retriever normalizes the query first).
    pub fn scan_substring(&self, tokens: &[&str], limit: usize) -> Vec<KnowledgeEntry> {
        let needles: Vec<&str> = tokens.iter().copied().filter(|t| t.len() > 3).collect();

        if needles.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|entry| {
                let haystack = entry.content.to_lowercase();
                needles.iter().any(|needle| haystack.contains(needle))
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::TrigramEmbedder;

    fn doc(id: i64, route: &str, content: &str) -> RawDocument {
        RawDocument {
            id,
            path: format!("docs{}.md", route),
            route: route.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_build_preserves_source_order() {
        let docs = vec![
            doc(1, "/a", "first entry content"),
            doc(2, "/b", "second entry content"),
        ];
        let embedder = TrigramEmbedder::new(64);

        let index = VectorIndex::build(&docs, &embedder).await.unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[0].id, 1);
        assert_eq!(index.entries()[1].id, 2);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let docs = vec![
            doc(1, "/a", "completely unrelated text about gardening"),
            doc(2, "/b", "pension scheme membership and retirement advice"),
        ];
        let embedder = TrigramEmbedder::new(384);
        let index = VectorIndex::build(&docs, &embedder).await.unwrap();

        let query = embedder
            .embed("pension scheme membership retirement")
            .await
            .unwrap();
        let results = index.search(&query, 2);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 2);
    }

    #[tokio::test]
    async fn test_search_tie_break_keeps_source_order() {
        let docs = vec![
            doc(1, "/a", "identical content"),
            doc(2, "/b", "identical content"),
        ];
        let embedder = TrigramEmbedder::new(64);
        let index = VectorIndex::build(&docs, &embedder).await.unwrap();

        let query = embedder.embed("identical content").await.unwrap();
        let results = index.search(&query, 2);

        // Equal scores: first-seen wins
        assert_eq!(results[0].id, 1);
        assert_eq!(results[1].id, 2);
    }

    #[tokio::test]
    async fn test_scan_substring_matches_in_order() {
        let docs = vec![
            doc(1, "/a", "Nothing relevant here"),
            doc(2, "/b", "The Pension scheme covers all members"),
            doc(3, "/c", "Another pension reference"),
        ];
        let embedder = TrigramEmbedder::new(64);
        let index = VectorIndex::build(&docs, &embedder).await.unwrap();

        let results = index.scan_substring(&["pension"], 3);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 2);
        assert_eq!(results[1].id, 3);
    }

    #[tokio::test]
    async fn test_scan_substring_ignores_short_tokens() {
        let docs = vec![doc(1, "/a", "the cat sat")];
        let embedder = TrigramEmbedder::new(64);
        let index = VectorIndex::build(&docs, &embedder).await.unwrap();

        // Every token is 3 characters or fewer, so nothing matches
        let results = index.scan_substring(&["cat", "sat"], 3);
        assert!(results.is_empty());
    }
}
