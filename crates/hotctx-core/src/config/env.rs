use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("HOTCTX_EMBEDDING_URL") {
            self.embedding.url = v;
        }
        if let Ok(v) = std::env::var("HOTCTX_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("HOTCTX_EMBEDDING_DIM") {
            match v.parse::<usize>() {
                Ok(dim) => self.embedding.dim = dim,
                Err(_) => tracing::warn!("ignoring invalid HOTCTX_EMBEDDING_DIM value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("HOTCTX_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("HOTCTX_COLLECTION") {
            self.index.collection = v;
        }
        if let Ok(v) = std::env::var("HOTCTX_TOP_K") {
            match v.parse::<usize>() {
                Ok(k) => self.retrieval.top_k = k,
                Err(_) => tracing::warn!("ignoring invalid HOTCTX_TOP_K value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("HOTCTX_RELEVANCE_THRESHOLD") {
            match v.parse::<f32>() {
                Ok(t) => self.retrieval.relevance_threshold = t,
                Err(_) => tracing::warn!("ignoring invalid HOTCTX_RELEVANCE_THRESHOLD value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("HOTCTX_MAX_OUTPUT_KB") {
            match v.parse::<usize>() {
                Ok(kb) => self.retrieval.max_output_kb = kb,
                Err(_) => tracing::warn!("ignoring invalid HOTCTX_MAX_OUTPUT_KB value: {v}"),
            }
        }
    }
}
