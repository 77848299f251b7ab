//! Hot context document rendering and size-budgeted output.

use std::fmt::Write;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::store::SearchHit;

/// Characters of chunk text shown per result before truncation.
pub const SNIPPET_CHARS: usize = 300;

const TITLE: &str = "# Hot Context (Auto-Generated)";

/// Whether the written document fits its size budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Within,
    /// Advisory only; the file is still written.
    Exceeded,
}

/// Measurements of a written context document.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputReport {
    /// Size in KiB (bytes / 1024).
    pub size_kb: f64,
    pub lines: usize,
    pub budget: BudgetStatus,
}

/// Display text for a result: the trimmed text, or its first
/// [`SNIPPET_CHARS`] characters trimmed and suffixed with `...`.
#[must_use]
pub fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", text[..idx].trim()),
        None => text.trim().to_owned(),
    }
}

/// Render ranked results into the hot context markdown document.
///
/// `sources` are the configured sources, listed in the footer as given.
#[must_use]
pub fn assemble(
    results: &[SearchHit],
    queries: &[String],
    sources: &[String],
    generated_at: NaiveDateTime,
) -> String {
    let mut out = String::with_capacity(4096);

    let quoted = queries
        .iter()
        .map(|q| format!("\"{q}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let _ = writeln!(out, "{TITLE}\n");
    let _ = writeln!(
        out,
        "**Last Updated**: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    out.push_str("**Source**: Semantic search across project documentation\n");
    let _ = writeln!(out, "**Queries**: {quoted}");
    out.push_str("**Note**: This file is auto-generated. Edit source docs, not this file.\n\n");
    out.push_str("---\n\n## Current Project Context\n\n");

    for (rank, hit) in results.iter().enumerate() {
        let heading = if hit.heading.is_empty() {
            String::new()
        } else {
            format!(" - {}", hit.heading)
        };
        let _ = writeln!(out, "### {}. {}{heading}\n", rank + 1, hit.source);
        let _ = writeln!(out, "**Relevance**: {:.2}\n", hit.score);
        let _ = writeln!(out, "{}\n", snippet(&hit.text));
        out.push_str("---\n\n");
    }

    out.push_str(
        "\n## How to Use This Context\n\n\
         This file is automatically included by Cursor. It provides high-signal context about:\n\
         - Project standards and conventions\n\
         - Recent architecture decisions\n\
         - File organization patterns\n\n\
         **Refresh schedule**: Nightly at 3 AM + on commit (if docs changed)\n\n\
         **Source files indexed**:\n",
    );
    for source in sources {
        let _ = writeln!(out, "- `{source}`");
    }
    out.push_str("\n---\n\n*For full details, see source files listed above.*\n");

    out
}

/// Write `content` to `path`, creating parent directories and replacing any
/// existing file, then measure it against `max_output_kb`.
///
/// Exceeding the budget logs one warning and is reported in the returned
/// [`OutputReport`]; it is never an error.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub async fn write_output(path: &Path, content: &str, max_output_kb: usize) -> Result<OutputReport> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;

    let size_kb = f64::from(u32::try_from(content.len()).unwrap_or(u32::MAX)) / 1024.0;
    let lines = content.split('\n').count();
    let max_kb = f64::from(u32::try_from(max_output_kb).unwrap_or(u32::MAX));

    let budget = if size_kb > max_kb {
        tracing::warn!(
            path = %path.display(),
            size_kb = format_args!("{size_kb:.1}"),
            max_kb = max_output_kb,
            "hot context exceeds size budget; consider lowering top_k or chunk_size"
        );
        BudgetStatus::Exceeded
    } else {
        tracing::info!(
            path = %path.display(),
            size_kb = format_args!("{size_kb:.1}"),
            max_kb = max_output_kb,
            lines,
            "hot context written"
        );
        BudgetStatus::Within
    };

    Ok(OutputReport {
        size_kb,
        lines,
        budget,
    })
}
