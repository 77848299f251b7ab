//! Source indexing: walk → chunk → embed → store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use hotctx_llm::EmbeddingProvider;

use crate::chunker::{ChunkerConfig, chunk_markdown};
use crate::error::{IndexError, Result};
use crate::store::{ChunkPayload, ChunkStore, IndexEntry, point_id};

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub chunker: ChunkerConfig,
    /// Expected embedding length; also the dimension of a newly created collection.
    pub embedding_dim: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            embedding_dim: 768,
        }
    }
}

/// Summary of an indexing run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub chunks_indexed: usize,
    /// `"<source>: <error>"` for every skipped file.
    pub failures: Vec<String>,
    /// Configured sources that do not exist under the root.
    pub missing_sources: Vec<String>,
    pub duration_ms: u64,
}

/// Indexes markdown sources into a [`ChunkStore`].
pub struct Indexer<P> {
    store: ChunkStore,
    provider: Arc<P>,
    config: IndexerConfig,
}

impl<P: EmbeddingProvider> Indexer<P> {
    #[must_use]
    pub fn new(store: ChunkStore, provider: Arc<P>, config: IndexerConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Index every configured source under `root`.
    ///
    /// Per-file read, embedding, dimension and upsert failures are logged and
    /// recorded in the report; the file is skipped and the run continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be ensured, or
    /// [`IndexError::NothingIndexed`] if files were found but none could be
    /// indexed.
    pub async fn index_sources(&self, root: &Path, sources: &[String]) -> Result<IndexReport> {
        let start = std::time::Instant::now();
        let mut report = IndexReport::default();

        self.store.ensure_collection(self.config.embedding_dim).await?;

        let (files, missing) = collect_files(root, sources);
        for source in &missing {
            let err = IndexError::SourceNotFound(root.join(source));
            tracing::warn!("{err}, skipping");
        }
        report.missing_sources = missing;

        let total = files.len();
        if total == 0 {
            tracing::warn!("no markdown files found in configured sources");
            report.duration_ms = elapsed_ms(start);
            return Ok(report);
        }
        tracing::info!(total, collection = self.store.collection(), "indexing started");

        let indexed_at = chrono::Utc::now().to_rfc3339();

        for (i, path) in files.iter().enumerate() {
            report.files_scanned += 1;
            let rel_path = relative_source(root, path);

            match self.index_file(path, &rel_path, &indexed_at).await {
                Ok(chunks) => {
                    report.files_indexed += 1;
                    report.chunks_indexed += chunks;
                    tracing::info!(
                        file = %rel_path,
                        progress = format_args!("{}/{total}", i + 1),
                        chunks,
                    );
                }
                Err(e) => {
                    tracing::warn!(file = %rel_path, error = %e, "file skipped");
                    report.failures.push(format!("{rel_path}: {e}"));
                }
            }
        }

        report.duration_ms = elapsed_ms(start);

        if report.files_indexed == 0 {
            return Err(IndexError::NothingIndexed {
                failed: report.failures.len(),
            });
        }

        tracing::info!(
            files = report.files_indexed,
            chunks = report.chunks_indexed,
            failed = report.failures.len(),
            duration_ms = report.duration_ms,
            "indexing complete"
        );
        Ok(report)
    }

    async fn index_file(&self, abs_path: &Path, rel_path: &str, indexed_at: &str) -> Result<usize> {
        let bytes = tokio::fs::read(abs_path).await?;
        let text = String::from_utf8_lossy(&bytes);
        let file_mtime = file_mtime(abs_path).await;

        let chunks = chunk_markdown(&text, rel_path, &self.config.chunker);

        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = self.provider.embed(&chunk.text).await?;
            if vector.len() != self.config.embedding_dim {
                return Err(IndexError::DimensionMismatch {
                    expected: self.config.embedding_dim,
                    actual: vector.len(),
                });
            }
            entries.push(IndexEntry {
                id: point_id(&chunk.source, chunk.chunk_index, &chunk.text),
                vector,
                payload: ChunkPayload {
                    text: chunk.text,
                    source: chunk.source,
                    kind: chunk.kind,
                    heading: chunk.heading,
                    chunk_index: chunk.chunk_index,
                    file_mtime,
                    indexed_at: indexed_at.to_owned(),
                },
            });
        }

        if entries.is_empty() {
            tracing::debug!("{rel_path}: no chunk reached the size floor");
            return Ok(0);
        }
        self.store.upsert_batch(entries).await
    }
}

/// Resolve configured sources against `root`.
///
/// Directories contribute their `*.md` files (walk honours ignore files and
/// skips hidden entries); file sources are taken as-is. A file reachable from
/// several sources is listed once, at its first position. Returns the files and
/// the sources that do not exist.
#[must_use]
pub fn collect_files(root: &Path, sources: &[String]) -> (Vec<PathBuf>, Vec<String>) {
    let mut files = Vec::new();
    let mut seen = HashSet::new();
    let mut missing = Vec::new();

    for source in sources {
        let path = root.join(source);
        if path.is_file() {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = ignore::WalkBuilder::new(&path)
                .hidden(true)
                .git_ignore(true)
                .build()
                .flatten()
                .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()) && is_markdown(e.path()))
                .map(ignore::DirEntry::into_path)
                .collect();
            found.sort();
            for file in found {
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        } else {
            missing.push(source.clone());
        }
    }

    (files, missing)
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

/// Path of `path` relative to `root`, `/`-separated.
fn relative_source(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

async fn file_mtime(path: &Path) -> f64 {
    tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0.0, |d| d.as_secs_f64())
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}
