//! Collection access for documentation chunks: stable ids, payloads, batched upserts.

use std::collections::HashMap;
use std::sync::Arc;

use hotctx_memory::{ScoredVectorPoint, VectorPoint, VectorStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IndexError, Result};

/// Maximum number of points sent in one upsert request.
pub const UPSERT_BATCH_SIZE: usize = 100;

/// Characters of chunk text folded into the point id.
pub const ID_PREFIX_CHARS: usize = 100;

const POINT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_9a2e_4b7d_4e58_a3c1_2d9e_8f40_b715);

/// Stable point id for a chunk.
///
/// The same `(source, chunk_index, text prefix)` always maps to the same id, so
/// re-indexing unchanged content overwrites points instead of duplicating them.
#[must_use]
pub fn point_id(source: &str, chunk_index: usize, text: &str) -> String {
    let prefix: String = text.chars().take(ID_PREFIX_CHARS).collect();
    let key = format!("{source}:{chunk_index}:{prefix}");
    let digest = blake3::hash(key.as_bytes());
    Uuid::new_v5(&POINT_NAMESPACE, digest.as_bytes()).to_string()
}

/// Payload stored alongside every chunk vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub text: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub heading: String,
    pub chunk_index: usize,
    /// Source file modification time, seconds since the epoch.
    pub file_mtime: f64,
    /// RFC 3339 timestamp of the indexing run.
    pub indexed_at: String,
}

/// A chunk ready to be written: id, vector, payload.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl IndexEntry {
    fn into_point(self) -> Result<VectorPoint> {
        let payload: HashMap<String, serde_json::Value> =
            serde_json::from_value(serde_json::to_value(&self.payload)?)?;
        Ok(VectorPoint {
            id: self.id,
            vector: self.vector,
            payload,
        })
    }
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub source: String,
    pub heading: String,
    pub score: f32,
    pub indexed_at: String,
}

impl SearchHit {
    /// Decode a scored point; points missing `text` or `source` are skipped.
    #[must_use]
    pub fn from_scored_point(point: &ScoredVectorPoint) -> Option<Self> {
        let p = &point.payload;
        let get_str = |key: &str| {
            p.get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        };

        Some(Self {
            id: point.id.clone(),
            text: get_str("text")?,
            source: get_str("source")?,
            heading: get_str("heading").unwrap_or_default(),
            score: point.score,
            indexed_at: get_str("indexed_at").unwrap_or_default(),
        })
    }
}

/// One named collection on a [`VectorStore`].
#[derive(Clone)]
pub struct ChunkStore {
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl ChunkStore {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection at `dim` dimensions if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the index service cannot be reached or creation fails.
    pub async fn ensure_collection(&self, dim: usize) -> Result<()> {
        let size = u64::try_from(dim)?;
        self.store.ensure_collection(&self.collection, size).await?;
        Ok(())
    }

    /// Names of every collection on the index service.
    ///
    /// # Errors
    ///
    /// Returns an error if the index service cannot be reached.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.store.list_collections().await?)
    }

    /// Write entries in batches of [`UPSERT_BATCH_SIZE`], stopping at the first failed batch.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Batch`] naming the zero-based index of the failed batch.
    pub async fn upsert_batch(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        let points = entries
            .into_iter()
            .map(IndexEntry::into_point)
            .collect::<Result<Vec<_>>>()?;

        let mut written = 0usize;
        let mut pending = points.into_iter().peekable();
        let mut batch = 0usize;
        while pending.peek().is_some() {
            let chunk: Vec<VectorPoint> = pending.by_ref().take(UPSERT_BATCH_SIZE).collect();
            let len = chunk.len();
            self.store
                .upsert(&self.collection, chunk)
                .await
                .map_err(|source| IndexError::Batch { batch, source })?;
            tracing::debug!(collection = %self.collection, batch, points = len, "batch upserted");
            written += len;
            batch += 1;
        }
        Ok(written)
    }

    /// Nearest chunks to `vector`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>> {
        let limit = u64::try_from(limit)?;
        let points = self
            .store
            .search(&self.collection, vector, limit, score_threshold)
            .await?;
        Ok(points.iter().filter_map(SearchHit::from_scored_point).collect())
    }
}
