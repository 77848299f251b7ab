//! Semantic retrieval over indexed chunks.

use std::sync::Arc;

use hotctx_llm::EmbeddingProvider;

use crate::error::Result;
use crate::store::{ChunkStore, SearchHit};

/// Candidates fetched per requested result, leaving room for deduplication.
pub const CANDIDATE_FACTOR: usize = 2;

/// Retrieval configuration.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity to accept.
    pub relevance_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.7,
        }
    }
}

/// Embeds queries and searches a [`ChunkStore`].
pub struct Retriever<P> {
    store: ChunkStore,
    provider: Arc<P>,
    config: RetrievalConfig,
}

impl<P: EmbeddingProvider> Retriever<P> {
    #[must_use]
    pub fn new(store: ChunkStore, provider: Arc<P>, config: RetrievalConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Up to `2 * k` hits for `query`, best first, none below the relevance threshold.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or searching the index fails.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let vector = self.provider.embed(query).await?;
        let threshold = self.config.relevance_threshold;

        let mut hits = self
            .store
            .search(vector, k.saturating_mul(CANDIDATE_FACTOR), Some(threshold))
            .await?;
        hits.retain(|h| h.score >= threshold);
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::debug!(query, found = hits.len(), "query searched");
        Ok(hits)
    }

    /// Run [`search`](Self::search) for each query in order and concatenate the hits.
    ///
    /// # Errors
    ///
    /// Fails on the first query whose search fails.
    pub async fn search_all(&self, queries: &[String], k: usize) -> Result<Vec<SearchHit>> {
        let mut all = Vec::new();
        for query in queries {
            let hits = self.search(query, k).await?;
            tracing::info!(query = %query, found = hits.len(), "query results");
            all.extend(hits);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use hotctx_llm::mock::MockEmbedder;
    use hotctx_memory::InMemoryVectorStore;

    use super::*;
    use crate::store::{ChunkPayload, IndexEntry, point_id};

    const COLLECTION: &str = "retrieval";

    fn entry(i: usize, source: &str, vector: Vec<f32>) -> IndexEntry {
        let text = format!("{source} body {i}");
        IndexEntry {
            id: point_id(source, i, &text),
            vector,
            payload: ChunkPayload {
                text,
                source: source.into(),
                kind: "markdown".into(),
                heading: String::new(),
                chunk_index: i,
                file_mtime: 0.0,
                indexed_at: String::new(),
            },
        }
    }

    async fn seeded(embedder: MockEmbedder, threshold: f32) -> Retriever<MockEmbedder> {
        let store = ChunkStore::new(Arc::new(InMemoryVectorStore::new()), COLLECTION);
        store.ensure_collection(2).await.unwrap();
        store
            .upsert_batch(vec![
                entry(0, "a.md", vec![1.0, 0.0]),
                entry(1, "b.md", vec![0.8, 0.6]),
                entry(2, "c.md", vec![0.6, 0.8]),
                entry(3, "d.md", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();
        Retriever::new(
            store,
            Arc::new(embedder),
            RetrievalConfig {
                relevance_threshold: threshold,
            },
        )
    }

    #[tokio::test]
    async fn search_filters_threshold_and_orders_by_score() {
        let embedder = MockEmbedder::new(2).with_vector("standards", vec![1.0, 0.0]);
        let retriever = seeded(embedder, 0.7).await;

        let hits = retriever.search("standards", 12).await.unwrap();

        let sources: Vec<&str> = hits.iter().map(|h| h.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "b.md"]);
        assert!(hits.iter().all(|h| h.score >= 0.7));
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn search_fetches_at_most_twice_k() {
        let embedder = MockEmbedder::new(2).with_vector("q", vec![1.0, 1.0]);
        let retriever = seeded(embedder, 0.0).await;

        let hits = retriever.search("q", 1).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn no_match_is_empty_not_error() {
        let embedder = MockEmbedder::new(2).with_vector("q", vec![-1.0, -1.0]);
        let retriever = seeded(embedder, 0.7).await;

        assert!(retriever.search("q", 12).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_all_concatenates_in_query_order() {
        let embedder = MockEmbedder::new(2)
            .with_vector("x", vec![1.0, 0.0])
            .with_vector("y", vec![0.0, 1.0]);
        let retriever = seeded(embedder, 0.95).await;

        let hits = retriever
            .search_all(&["x".to_owned(), "y".to_owned()], 12)
            .await
            .unwrap();

        let sources: Vec<&str> = hits.iter().map(|h| h.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "d.md"]);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let retriever = seeded(MockEmbedder::failing(), 0.7).await;
        let err = retriever.search("q", 3).await.unwrap_err();
        assert!(matches!(err, crate::IndexError::Llm(_)));
    }
}
