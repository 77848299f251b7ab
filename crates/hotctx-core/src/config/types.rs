use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

fn default_sources() -> Vec<String> {
    [
        "docs/standards",
        "docs/architecture",
        "docs/architecture/decisions",
        "README.md",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_output() -> String {
    ".cursor/rules/context-hot.mdc".into()
}

/// Which documents to index and where the generated file goes, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            output: default_output(),
        }
    }
}

fn default_embedding_url() -> String {
    "http://localhost:11434/api/embeddings".into()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}

fn default_embedding_dim() -> usize {
    768
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dim")]
    pub dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
            dim: default_embedding_dim(),
        }
    }
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection() -> String {
    "cursor_hot_context".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IndexConfig {
    /// gRPC endpoint of the Qdrant service.
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection: default_collection(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    120
}

fn default_min_chunk_size() -> usize {
    200
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
        }
    }
}

fn default_top_k() -> usize {
    12
}

fn default_relevance_threshold() -> f32 {
    0.7
}

fn default_max_output_kb() -> usize {
    12
}

fn default_queries() -> Vec<String> {
    [
        "project standards and coding conventions",
        "recent architecture decisions",
        "directory structure and file organization",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum cosine similarity, in `[0, 1]`.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,
    /// Advisory size budget for the generated file.
    #[serde(default = "default_max_output_kb")]
    pub max_output_kb: usize,
    /// Seed queries run on every `generate`.
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            relevance_threshold: default_relevance_threshold(),
            max_output_kb: default_max_output_kb(),
            queries: default_queries(),
        }
    }
}
