mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};

use hotctx_index::chunker::ChunkerConfig;
use hotctx_index::indexer::IndexerConfig;

/// Config file used when neither `--config` nor `HOTCTX_CONFIG` is given, relative to the project root.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a TOML file with env var overrides, then validate it.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the resulting configuration is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str::<Self>(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Pick the config file: explicit path, then `HOTCTX_CONFIG`, then
    /// [`DEFAULT_CONFIG_PATH`] under `root`.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>, root: &Path) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var("HOTCTX_CONFIG")
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        root.join(DEFAULT_CONFIG_PATH)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.dim == 0 {
            return Err(ConfigError::Invalid("embedding.dim must be > 0".into()));
        }
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunking.chunk_size must be > 0".into()));
        }
        if self.chunking.min_chunk_size > self.chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.min_chunk_size ({}) exceeds chunking.chunk_size ({})",
                self.chunking.min_chunk_size, self.chunking.chunk_size
            )));
        }
        let t = self.retrieval.relevance_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::Invalid(format!(
                "retrieval.relevance_threshold must be within [0, 1], got {t}"
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be > 0".into()));
        }
        if self.retrieval.queries.is_empty() {
            return Err(ConfigError::Invalid(
                "retrieval.queries must not be empty".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
            min_chunk_size: self.chunking.min_chunk_size,
        }
    }

    #[must_use]
    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            chunker: self.chunker_config(),
            embedding_dim: self.embedding.dim,
        }
    }

    #[must_use]
    pub fn retrieval_config(&self) -> hotctx_index::retriever::RetrievalConfig {
        hotctx_index::retriever::RetrievalConfig {
            relevance_threshold: self.retrieval.relevance_threshold,
        }
    }

    /// Absolute location of the generated context file.
    #[must_use]
    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.project.output)
    }
}
