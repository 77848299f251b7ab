//! Error types for hotctx-index.

use std::num::TryFromIntError;
use std::path::PathBuf;

/// Errors that can occur while indexing or retrieving documentation chunks.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading sources or writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding service failure.
    #[error("embedding service error: {0}")]
    Llm(#[from] hotctx_llm::LlmError),

    /// Vector index service failure.
    #[error("index service error: {0}")]
    VectorStore(#[from] hotctx_memory::VectorStoreError),

    /// An upsert batch failed; later batches of the same call were not attempted.
    #[error("upsert batch {batch} failed: {source}")]
    Batch {
        batch: usize,
        #[source]
        source: hotctx_memory::VectorStoreError,
    },

    /// Embedding length differs from the collection dimension.
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A configured source path does not exist.
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Files were found but every one of them failed.
    #[error("no files indexed, {failed} failed")]
    NothingIndexed { failed: usize },

    /// JSON serialization error building a payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Integer conversion error.
    #[error("integer conversion failed: {0}")]
    IntConversion(#[from] TryFromIntError),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
