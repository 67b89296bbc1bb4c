//! Knowledge retriever with lazy index build and query caching.
//!
//! Answers "which K knowledge entries are most relevant to this query" with
//! deterministic, cacheable results. The index is built exactly once, on
//! first use; every query after that runs against the in-memory index.

use crate::embedding::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::source::DocumentSource;
use crate::types::KnowledgeEntry;
use lru::LruCache;
use sitechat_core::AppResult;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Queries with fewer whitespace tokens than this take the substring fast
/// path before falling back to embedding similarity.
const FAST_PATH_MAX_TOKENS: usize = 4;

/// Cache key: normalized query text plus requested limit.
type QueryKey = (String, usize);

/// Knowledge retriever.
///
/// Owns the vector index (built lazily, exactly once) and a bounded LRU
/// cache of query results. Cached results are shared `Arc`s: identical
/// queries return the identical result object without recomputation.
pub struct Retriever {
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: OnceCell<VectorIndex>,
    cache: Mutex<LruCache<QueryKey, Arc<Vec<KnowledgeEntry>>>>,
}

impl Retriever {
    /// Create a retriever over the given source and embedder.
    ///
    /// `cache_capacity` bounds the query cache; the least recently used
    /// entry is evicted once the bound is reached.
    pub fn new(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        cache_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            source,
            embedder,
            index: OnceCell::new(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Ensure the vector index is built.
    ///
    /// Safe to call repeatedly and concurrently: the first caller fetches
    /// the document source and computes one embedding per document; every
    /// concurrent caller suspends until that build completes; later callers
    /// observe the built index and return immediately.
    pub async fn ensure_ready(&self) -> AppResult<&VectorIndex> {
        self.index
            .get_or_try_init(|| async {
                let documents = self.source.fetch().await?;
                VectorIndex::build(&documents, self.embedder.as_ref()).await
            })
            .await
    }

    /// Return the `limit` knowledge entries most relevant to `text`.
    ///
    /// Queries issued before the index build completes wait for it; partial
    /// results are never returned. Results are cached under the normalized
    /// query text and limit.
    pub async fn query(&self, text: &str, limit: usize) -> AppResult<Arc<Vec<KnowledgeEntry>>> {
        let index = self.ensure_ready().await?;

        let normalized = text.trim().to_lowercase();
        let key = (normalized.clone(), limit);

        if let Some(hit) = self.cache.lock().await.get(&key) {
            tracing::debug!("Query cache hit for {:?}", key);
            return Ok(Arc::clone(hit));
        }

        // Fast path: short queries are answered by substring containment,
        // trading recall for speed on the common single-keyword case
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        if tokens.len() < FAST_PATH_MAX_TOKENS {
            let matches = index.scan_substring(&tokens, limit);
            if !matches.is_empty() {
                tracing::debug!(
                    "Substring fast path matched {} entries for {:?}",
                    matches.len(),
                    normalized
                );
                return Ok(self.cache_and_return(key, matches).await);
            }
        }

        // Similarity path: embed the normalized query and rank every entry
        let query_embedding = self.embedder.embed(&normalized).await?;
        let results = index.search(&query_embedding, limit);

        tracing::debug!(
            "Similarity path returned {} entries for {:?}",
            results.len(),
            normalized
        );

        Ok(self.cache_and_return(key, results).await)
    }

    async fn cache_and_return(
        &self,
        key: QueryKey,
        results: Vec<KnowledgeEntry>,
    ) -> Arc<Vec<KnowledgeEntry>> {
        let shared = Arc::new(results);
        self.cache.lock().await.put(key, Arc::clone(&shared));
        shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::TrigramEmbedder;
    use crate::source::StaticSource;
    use crate::types::RawDocument;
    use sitechat_core::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc(id: i64, route: &str, content: &str) -> RawDocument {
        RawDocument {
            id,
            path: format!("docs{}.md", route),
            route: route.to_string(),
            content: content.to_string(),
        }
    }

    /// Source wrapper counting fetch calls.
    struct CountingSource {
        inner: StaticSource,
        fetches: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl crate::source::DocumentSource for CountingSource {
        async fn fetch(&self) -> AppResult<Vec<RawDocument>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent ensure_ready callers overlap the build
            tokio::task::yield_now().await;
            self.inner.fetch().await
        }
    }

    /// Embedder wrapper counting embed_batch calls.
    #[derive(Debug)]
    struct CountingEmbedder {
        inner: TrigramEmbedder,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn provider_name(&self) -> &str {
            "counting"
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }
    }

    /// Embedder returning fixed vectors per known text.
    #[derive(Debug)]
    struct FixedEmbedder {
        map: HashMap<String, Vec<f32>>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| self.map.get(t).cloned().unwrap_or_else(|| vec![0.0, 0.0]))
                .collect())
        }
    }

    fn failing_source() -> Arc<dyn DocumentSource> {
        struct FailingSource;

        #[async_trait::async_trait]
        impl DocumentSource for FailingSource {
            async fn fetch(&self) -> AppResult<Vec<RawDocument>> {
                Err(AppError::SourceUnavailable("unreachable".to_string()))
            }
        }

        Arc::new(FailingSource)
    }

    fn sample_docs() -> Vec<RawDocument> {
        vec![
            doc(1, "/events", "Upcoming events and opening hours for members"),
            doc(2, "/pension", "The pension scheme covers every member"),
            doc(3, "/blog", "Latest blog posts from the editorial team"),
        ]
    }

    #[tokio::test]
    async fn test_concurrent_ensure_ready_builds_once() {
        let source = Arc::new(CountingSource {
            inner: StaticSource::new(sample_docs()),
            fetches: AtomicUsize::new(0),
        });
        let retriever = Arc::new(Retriever::new(
            source.clone(),
            Arc::new(TrigramEmbedder::new(64)),
            16,
        ));

        let (a, b, c) = tokio::join!(
            retriever.ensure_ready(),
            retriever.ensure_ready(),
            retriever.ensure_ready()
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        // Later calls observe the built index without refetching
        retriever.ensure_ready().await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_before_build_waits_for_complete_index() {
        let retriever = Retriever::new(
            Arc::new(StaticSource::new(sample_docs())),
            Arc::new(TrigramEmbedder::new(64)),
            16,
        );

        // No explicit ensure_ready: the query itself triggers the build and
        // must see the full index
        let results = retriever.query("pension", 3).await.unwrap();
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn test_identical_queries_share_cached_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = Arc::new(CountingEmbedder {
            inner: TrigramEmbedder::new(64),
            calls: Arc::clone(&calls),
        });
        let retriever = Retriever::new(
            Arc::new(StaticSource::new(sample_docs())),
            embedder,
            16,
        );

        // Four tokens: forces the similarity path
        let first = retriever
            .query("when are the events happening", 2)
            .await
            .unwrap();
        let calls_after_first = calls.load(Ordering::SeqCst);

        let second = retriever
            .query("when are the events happening", 2)
            .await
            .unwrap();

        // Identical result object, and no further embedding computed
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn test_cache_keys_include_limit() {
        let retriever = Retriever::new(
            Arc::new(StaticSource::new(sample_docs())),
            Arc::new(TrigramEmbedder::new(64)),
            16,
        );

        let two = retriever.query("pension", 2).await.unwrap();
        let three = retriever.query("pension", 3).await.unwrap();

        assert!(!Arc::ptr_eq(&two, &three));
    }

    #[tokio::test]
    async fn test_normalization_folds_case_and_whitespace() {
        let retriever = Retriever::new(
            Arc::new(StaticSource::new(sample_docs())),
            Arc::new(TrigramEmbedder::new(64)),
            16,
        );

        let a = retriever.query("Pension", 3).await.unwrap();
        let b = retriever.query("  pension  ", 3).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_short_query_uses_substring_fast_path() {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = Arc::new(CountingEmbedder {
            inner: TrigramEmbedder::new(64),
            calls: Arc::clone(&calls),
        });
        let retriever = Retriever::new(
            Arc::new(StaticSource::new(sample_docs())),
            embedder,
            16,
        );

        let results = retriever.query("pension", 3).await.unwrap();

        assert_eq!(results[0].id, 2);
        // One embed_batch call for the index build, none for the query
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_query_without_match_falls_back_to_similarity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = Arc::new(CountingEmbedder {
            inner: TrigramEmbedder::new(64),
            calls: Arc::clone(&calls),
        });
        let retriever = Retriever::new(
            Arc::new(StaticSource::new(sample_docs())),
            embedder,
            16,
        );

        let results = retriever.query("zzzqqqxxx", 2).await.unwrap();

        // Substring scan found nothing; similarity still returns entries
        assert_eq!(results.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_similarity_path_orders_by_score() {
        let query_text = "what do i need to know";
        let high = "high relevance entry";
        let low = "low relevance entry";

        let mut map = HashMap::new();
        map.insert(query_text.to_string(), vec![1.0, 0.0]);
        // cos = 0.9 and cos = 0.4 against the query vector
        map.insert(high.to_string(), vec![0.9, 0.435_89]);
        map.insert(low.to_string(), vec![0.4, 0.916_515]);

        let retriever = Retriever::new(
            Arc::new(StaticSource::new(vec![
                doc(1, "/low", low),
                doc(2, "/high", high),
            ])),
            Arc::new(FixedEmbedder { map }),
            16,
        );

        let results = retriever.query(query_text, 2).await.unwrap();

        assert_eq!(results[0].id, 2);
        assert_eq!(results[1].id, 1);
    }

    #[tokio::test]
    async fn test_unreachable_source_fails_with_source_unavailable() {
        let retriever = Retriever::new(failing_source(), Arc::new(TrigramEmbedder::new(64)), 16);

        let err = retriever.query("pension", 3).await.unwrap_err();
        assert!(matches!(err, AppError::SourceUnavailable(_)));
    }
}
