//! Heading-aware markdown chunking with a fixed trailing-line overlap.

use serde::Serialize;

/// Lines carried from the end of one chunk into the start of the next.
pub const OVERLAP_LINES: usize = 5;

/// Headings longer than this are cut when attached to a chunk.
pub const HEADING_MAX_CHARS: usize = 100;

/// Classification tag for chunks produced by [`chunk_markdown`].
pub const MARKDOWN_KIND: &str = "markdown";

/// One retrievable passage of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    /// Path relative to the project root.
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Nearest preceding section title; empty for forced splits.
    pub heading: String,
    pub chunk_index: usize,
}

/// Chunker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Buffer size in bytes past which a chunk is force-split (default: 1000).
    pub chunk_size: usize,
    /// Nominal overlap budget in bytes (default: 120). The effective overlap is
    /// [`OVERLAP_LINES`] lines.
    pub chunk_overlap: usize,
    /// Minimum trimmed chunk length in bytes (default: 200).
    pub min_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 120,
            min_chunk_size: 200,
        }
    }
}

/// Split a markdown document into ordered, overlapping chunks.
///
/// A heading line closes the running chunk once it holds at least
/// `min_chunk_size` bytes; the closed chunk is tagged with the heading that was
/// active before the boundary. A chunk growing past `chunk_size` is split
/// without a heading. A trailing remainder shorter than `min_chunk_size` is
/// dropped. Output is deterministic for the same input and config.
#[must_use]
pub fn chunk_markdown(text: &str, source: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    let mut splitter = Splitter {
        source,
        config,
        chunks: Vec::new(),
    };
    let mut buffer: Vec<&str> = Vec::new();
    let mut size = 0usize;
    let mut heading = String::new();

    for line in text.lines() {
        let is_heading = line.starts_with('#');

        if is_heading && size >= config.min_chunk_size && splitter.meets_floor(&buffer) {
            splitter.emit(&buffer, &heading);
            let mut next = if buffer.len() > OVERLAP_LINES {
                tail(&buffer)
            } else {
                Vec::new()
            };
            next.push(line);
            buffer = next;
            size = byte_size(&buffer);
            heading = heading_text(line);
            continue;
        }

        if is_heading {
            heading = heading_text(line);
        }
        buffer.push(line);
        size += line.len() + 1;

        if size > config.chunk_size && splitter.meets_floor(&buffer) {
            splitter.emit(&buffer, "");
            buffer = tail(&buffer);
            size = byte_size(&buffer);
        }
    }

    if splitter.meets_floor(&buffer) {
        splitter.emit(&buffer, &heading);
    }

    splitter.chunks
}

struct Splitter<'a> {
    source: &'a str,
    config: &'a ChunkerConfig,
    chunks: Vec<Chunk>,
}

impl Splitter<'_> {
    fn meets_floor(&self, lines: &[&str]) -> bool {
        let text = lines.join("\n");
        let trimmed = text.trim();
        !trimmed.is_empty() && trimmed.len() >= self.config.min_chunk_size
    }

    fn emit(&mut self, lines: &[&str], heading: &str) {
        let text = lines.join("\n");
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.chunks.push(Chunk {
            text: text.to_owned(),
            source: self.source.to_owned(),
            kind: MARKDOWN_KIND.to_owned(),
            heading: heading.to_owned(),
            chunk_index: self.chunks.len(),
        });
    }
}

fn tail<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    lines[lines.len().saturating_sub(OVERLAP_LINES)..].to_vec()
}

fn byte_size(lines: &[&str]) -> usize {
    lines.iter().map(|l| l.len() + 1).sum()
}

fn heading_text(line: &str) -> String {
    line.trim_matches('#')
        .trim()
        .chars()
        .take(HEADING_MAX_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn config(chunk_size: usize, min_chunk_size: usize) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size,
            chunk_overlap: 120,
            min_chunk_size,
        }
    }

    fn section(title: &str, body_lines: usize) -> String {
        let mut s = format!("# {title}\n");
        for i in 0..body_lines {
            s.push_str(&format!(
                "{title} paragraph line {i} with enough words to carry some weight.\n"
            ));
        }
        s
    }

    #[test]
    fn three_sections_yield_three_chunks_with_own_heading() {
        let doc = [
            section("Alpha", 4),
            section("Beta", 4),
            section("Gamma", 4),
        ]
        .concat();

        let chunks = chunk_markdown(&doc, "docs/guide.md", &config(1000, 200));

        assert_eq!(chunks.len(), 3);
        let headings: Vec<&str> = chunks.iter().map(|c| c.heading.as_str()).collect();
        assert_eq!(headings, vec!["Alpha", "Beta", "Gamma"]);
        assert!(chunks[0].text.starts_with("# Alpha"));
        assert!(chunks[1].text.starts_with("# Beta"));
        assert!(chunks[2].text.starts_with("# Gamma"));
        for c in &chunks {
            assert!(c.text.len() >= 200);
            assert_eq!(c.source, "docs/guide.md");
            assert_eq!(c.kind, MARKDOWN_KIND);
        }
    }

    #[test]
    fn heading_boundary_carries_overlap_from_long_section() {
        let doc = [section("Alpha", 8), section("Beta", 4)].concat();
        let chunks = chunk_markdown(&doc, "a.md", &config(1000, 200));

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].text.starts_with("Alpha paragraph line 3"));
        assert!(chunks[1].text.contains("# Beta"));
        assert_eq!(chunks[1].heading, "Beta");
    }

    #[test]
    fn short_section_heading_does_not_split() {
        let doc = format!("# Intro\nshort\n{}", section("Body", 5));
        let chunks = chunk_markdown(&doc, "a.md", &config(1000, 200));

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.starts_with("# Intro"));
        assert_eq!(chunks[0].heading, "Body");
    }

    #[test]
    fn forced_split_has_empty_heading() {
        let doc = section("Huge", 40);
        let chunks = chunk_markdown(&doc, "a.md", &config(1000, 200));

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].heading, "");
        assert!(chunks[0].text.len() > 900);
        assert_eq!(chunks.last().unwrap().heading, "Huge");
    }

    #[test]
    fn forced_split_keeps_last_lines_as_overlap() {
        let doc = section("Huge", 40);
        let chunks = chunk_markdown(&doc, "a.md", &config(1000, 200));

        let first_lines: Vec<&str> = chunks[0].text.lines().collect();
        let overlap = &first_lines[first_lines.len() - OVERLAP_LINES..];
        let second_lines: Vec<&str> = chunks[1].text.lines().collect();
        assert_eq!(&second_lines[..OVERLAP_LINES], overlap);
    }

    #[test]
    fn short_tail_is_dropped() {
        let doc = format!("{}# Tail\ntiny\n", section("Main", 4));
        let chunks = chunk_markdown(&doc, "a.md", &config(1000, 200));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].heading, "Main");
        assert!(!chunks[0].text.contains("tiny"));
    }

    #[test]
    fn document_below_floor_yields_nothing() {
        let chunks = chunk_markdown("# Title\nJust a line.\n", "a.md", &ChunkerConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn empty_and_whitespace_documents_yield_nothing() {
        assert!(chunk_markdown("", "a.md", &ChunkerConfig::default()).is_empty());
        let blank = "   \n\n\t\n".repeat(200);
        assert!(chunk_markdown(&blank, "a.md", &config(100, 10)).is_empty());
    }

    #[test]
    fn heading_text_strips_markers_and_caps_length() {
        assert_eq!(heading_text("## Setup ##"), "Setup");
        assert_eq!(heading_text("#"), "");
        let long = format!("# {}", "x".repeat(150));
        assert_eq!(heading_text(&long).chars().count(), HEADING_MAX_CHARS);
    }

    #[test]
    fn crlf_lines_are_normalised() {
        let doc = section("Alpha", 5).replace('\n', "\r\n");
        let chunks = chunk_markdown(&doc, "a.md", &config(1000, 200));
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].text.contains('\r'));
    }

    #[test]
    fn chunk_serializes_kind_as_type() {
        let chunk = Chunk {
            text: "t".into(),
            source: "s".into(),
            kind: MARKDOWN_KIND.into(),
            heading: String::new(),
            chunk_index: 0,
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["type"], "markdown");
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => "[a-z][a-z ]{0,90}",
            1 => "#{1,3} [A-Za-z ]{0,30}",
            1 => Just(String::new()),
        ]
    }

    proptest! {
        #[test]
        fn chunk_indices_contiguous_and_floor_held(
            lines in prop::collection::vec(line_strategy(), 0..200),
            min in 20usize..300,
            extra in 0usize..1500,
        ) {
            let doc = lines.join("\n");
            let cfg = config(min + extra, min);
            let chunks = chunk_markdown(&doc, "p.md", &cfg);

            for (i, c) in chunks.iter().enumerate() {
                prop_assert_eq!(c.chunk_index, i);
                prop_assert!(!c.text.trim().is_empty());
                prop_assert!(c.text.len() >= min);
                prop_assert_eq!(c.text.trim(), c.text.as_str());
            }
        }

        #[test]
        fn chunking_is_deterministic(
            lines in prop::collection::vec(line_strategy(), 0..120),
        ) {
            let doc = lines.join("\n");
            let cfg = ChunkerConfig::default();
            prop_assert_eq!(
                chunk_markdown(&doc, "p.md", &cfg),
                chunk_markdown(&doc, "p.md", &cfg)
            );
        }
    }
}
