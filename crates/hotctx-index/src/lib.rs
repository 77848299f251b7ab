//! Markdown indexing, semantic retrieval, and hot context assembly.
//!
//! Write path: markdown sources are split into heading-aware chunks, embedded,
//! and upserted into a vector collection under stable ids. Read path: seed
//! queries are embedded and searched, candidates are deduplicated and ranked,
//! and the survivors are rendered into a size-budgeted document.

pub mod chunker;
pub mod context;
pub mod error;
pub mod indexer;
pub mod rerank;
pub mod retriever;
pub mod store;

pub use error::{IndexError, Result};
