//! Command orchestration: health probe, indexing, and hot context generation.

mod state;

pub use state::PipelineState;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotctx_index::IndexError;
use hotctx_index::context::{OutputReport, assemble, write_output};
use hotctx_index::indexer::{IndexReport, Indexer};
use hotctx_index::rerank::rerank;
use hotctx_index::retriever::Retriever;
use hotctx_index::store::ChunkStore;
use hotctx_llm::EmbeddingProvider;
use hotctx_memory::VectorStore;

use crate::config::{Config, ConfigError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("health check failed: {0}")]
    HealthCheck(String),

    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Top-level operations exposed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Health,
    Index,
    Generate,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    /// Collections currently present on the vector index service.
    pub collections: usize,
    /// Length of the probe embedding.
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateReport {
    /// Chunks rendered into the document after dedup and the `top_k` cap.
    pub results: usize,
    /// Candidates returned across all queries before reranking.
    pub candidates: usize,
    pub output_path: PathBuf,
    pub output: OutputReport,
}

#[derive(Debug)]
pub enum Outcome {
    Health(HealthReport),
    Index(HealthReport, IndexReport),
    Generate(HealthReport, GenerateReport),
    Refresh(HealthReport, IndexReport, GenerateReport),
}

/// Drives the services for one invocation through [`PipelineState`].
pub struct Pipeline<P> {
    config: Config,
    root: PathBuf,
    provider: Arc<P>,
    store: ChunkStore,
    state: PipelineState,
}

impl<P: EmbeddingProvider> Pipeline<P> {
    #[must_use]
    pub fn new(
        config: Config,
        root: impl Into<PathBuf>,
        provider: Arc<P>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        let store = ChunkStore::new(vector_store, config.index.collection.clone());
        Self {
            config,
            root: root.into(),
            provider,
            store,
            state: PipelineState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Health-check, run `command`, and finish.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; the pipeline is left `Failed`.
    pub async fn run(&mut self, command: Command) -> Result<Outcome, PipelineError> {
        let health = self.health().await?;
        let outcome = match command {
            Command::Health => Outcome::Health(health),
            Command::Index => Outcome::Index(health, self.index().await?),
            Command::Generate => Outcome::Generate(health, self.generate().await?),
            Command::Refresh => {
                let (indexed, generated) = self.refresh().await?;
                Outcome::Refresh(health, indexed, generated)
            }
        };
        self.finish()?;
        Ok(outcome)
    }

    /// Probe the vector index and the embedding service.
    ///
    /// A probe dimension differing from `embedding.dim` is logged, not fatal.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::HealthCheck`] if either service is unreachable.
    pub async fn health(&mut self) -> Result<HealthReport, PipelineError> {
        self.begin(PipelineState::HealthChecked)?;
        let result = self.probe().await;
        self.settle(result, PipelineState::HealthChecked)
    }

    async fn probe(&self) -> Result<HealthReport, PipelineError> {
        let collections = self.store.list_collections().await.map_err(|e| {
            tracing::error!(error = %e, "vector index unreachable");
            PipelineError::HealthCheck(format!("vector index: {e}"))
        })?;
        tracing::info!(collections = collections.len(), "vector index reachable");

        let probe = self.provider.embed("test").await.map_err(|e| {
            tracing::error!(provider = self.provider.name(), error = %e, "embedding service unreachable");
            PipelineError::HealthCheck(format!("embedding service: {e}"))
        })?;
        tracing::info!(
            provider = self.provider.name(),
            dim = probe.len(),
            "embedding service reachable"
        );
        if probe.len() != self.config.embedding.dim {
            tracing::warn!(
                expected = self.config.embedding.dim,
                actual = probe.len(),
                "embedding dimension differs from configuration"
            );
        }

        Ok(HealthReport {
            collections: collections.len(),
            embedding_dim: probe.len(),
        })
    }

    /// Chunk, embed and upsert every configured source.
    ///
    /// # Errors
    ///
    /// Returns an error if called before [`health`](Self::health), if the
    /// collection cannot be ensured, if an upsert batch fails, or if no file
    /// could be indexed.
    pub async fn index(&mut self) -> Result<IndexReport, PipelineError> {
        self.begin(PipelineState::Indexed)?;
        let indexer = Indexer::new(
            self.store.clone(),
            Arc::clone(&self.provider),
            self.config.indexer_config(),
        );
        let result = indexer
            .index_sources(&self.root, &self.config.project.sources)
            .await
            .map_err(PipelineError::from);
        self.settle(result, PipelineState::Indexed)
    }

    /// Retrieve, rerank and render the hot context file.
    ///
    /// Nothing is written if any query fails.
    ///
    /// # Errors
    ///
    /// Returns an error if called before [`health`](Self::health), if any
    /// service call fails, or if the output cannot be written.
    pub async fn generate(&mut self) -> Result<GenerateReport, PipelineError> {
        self.begin(PipelineState::Generated)?;
        let result = self.build_context().await;
        self.settle(result, PipelineState::Generated)
    }

    async fn build_context(&self) -> Result<GenerateReport, PipelineError> {
        let retrieval = &self.config.retrieval;
        let retriever = Retriever::new(
            self.store.clone(),
            Arc::clone(&self.provider),
            self.config.retrieval_config(),
        );

        let candidates = retriever.search_all(&retrieval.queries, retrieval.top_k).await?;
        let total = candidates.len();
        let mut ranked = rerank(candidates);
        ranked.truncate(retrieval.top_k);
        tracing::info!(candidates = total, selected = ranked.len(), "results reranked");

        let content = assemble(
            &ranked,
            &retrieval.queries,
            &self.config.project.sources,
            chrono::Local::now().naive_local(),
        );
        let output_path = self.config.output_path(&self.root);
        let output = write_output(&output_path, &content, retrieval.max_output_kb).await?;

        Ok(GenerateReport {
            results: ranked.len(),
            candidates: total,
            output_path,
            output,
        })
    }

    /// [`index`](Self::index) then [`generate`](Self::generate), stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever step failed.
    pub async fn refresh(&mut self) -> Result<(IndexReport, GenerateReport), PipelineError> {
        let indexed = self.index().await?;
        let generated = self.generate().await?;
        Ok((indexed, generated))
    }

    /// Mark the invocation complete.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTransition`] unless a health check succeeded.
    pub fn finish(&mut self) -> Result<(), PipelineError> {
        self.begin(PipelineState::Done)?;
        self.state = PipelineState::Done;
        Ok(())
    }

    fn begin(&self, to: PipelineState) -> Result<(), PipelineError> {
        if self.state.can_transition_to(to) {
            Ok(())
        } else {
            Err(PipelineError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    fn settle<T>(
        &mut self,
        result: Result<T, PipelineError>,
        next: PipelineState,
    ) -> Result<T, PipelineError> {
        match result {
            Ok(value) => {
                tracing::debug!(from = %self.state, to = %next, "pipeline advanced");
                self.state = next;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(from = %self.state, error = %e, "pipeline failed");
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }
}
