//! Chunker (C1): turns a file's text into one or more `RawChunk` records at
//! function/class/method boundaries, with overlap on oversize blocks.

mod patterns;

use crate::types::RawChunk;
use patterns::{is_reserved_name, patterns_for};

const OVERSIZE_LIMIT: usize = 150;
const OVERSIZE_OVERLAP: usize = 10;
const WINDOW_SIZE: usize = 200;
const WINDOW_OVERLAP: usize = 20;

struct Boundary {
    line: usize,
    name: Option<String>,
}

/// Chunks `contents` for `path`/`language` per the pattern-based boundary
/// algorithm, falling back to a sliding window when the language is
/// unrecognized or no boundaries are found.
pub fn chunk_file(path: &str, contents: &str, language: &str) -> Vec<RawChunk> {
    chunk_file_with_kind(path, contents, language, crate::config::ChunkerKind::Ast)
}

/// Same as `chunk_file`, but `ChunkerKind::Text` forces the sliding-window
/// chunker regardless of language.
pub fn chunk_file_with_kind(
    path: &str,
    contents: &str,
    language: &str,
    kind: crate::config::ChunkerKind,
) -> Vec<RawChunk> {
    let lines: Vec<&str> = contents.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let boundaries = match kind {
        crate::config::ChunkerKind::Text => Vec::new(),
        crate::config::ChunkerKind::Ast => match patterns_for(language) {
            Some(patterns) => find_boundaries(&lines, &patterns),
            None => Vec::new(),
        },
    };

    let raw_chunks = if boundaries.is_empty() {
        sliding_window(&lines)
    } else {
        boundary_chunks(&lines, &boundaries)
    };

    raw_chunks
        .into_iter()
        .flat_map(|(start, end, name)| split_oversize(start, end, name))
        .map(|(start, end, name, subindex)| {
            let content = lines[start..end].join("\n");
            RawChunk {
                id: crate::types::Chunk::make_id(path, start, end, subindex),
                file_path: path.to_string(),
                start_line: start,
                end_line: end,
                content,
                language: language.to_string(),
                symbol_name: name,
            }
        })
        .collect()
}

fn find_boundaries(lines: &[&str], patterns: &[regex::Regex]) -> Vec<Boundary> {
    let mut boundaries = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        for pattern in patterns {
            if let Some(caps) = pattern.captures(line) {
                let name = caps
                    .name("name")
                    .map(|m| m.as_str().to_string())
                    .filter(|n| !is_reserved_name(n));
                boundaries.push(Boundary { line: i, name });
                break;
            }
        }
    }
    boundaries
}

fn boundary_chunks(lines: &[&str], boundaries: &[Boundary]) -> Vec<(usize, usize, Option<String>)> {
    let mut out = Vec::new();
    for (idx, b) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(idx + 1)
            .map(|next| next.line)
            .unwrap_or(lines.len());
        out.push((b.line, end, b.name.clone()));
    }
    out
}

fn sliding_window(lines: &[&str]) -> Vec<(usize, usize, Option<String>)> {
    if lines.len() <= WINDOW_SIZE {
        return vec![(0, lines.len(), None)];
    }
    let mut out = Vec::new();
    let mut start = 0;
    while start < lines.len() {
        let end = (start + WINDOW_SIZE).min(lines.len());
        out.push((start, end, None));
        if end == lines.len() {
            break;
        }
        start = end - WINDOW_OVERLAP;
    }
    out
}

fn split_oversize(
    start: usize,
    end: usize,
    name: Option<String>,
) -> Vec<(usize, usize, Option<String>, Option<usize>)> {
    let len = end - start;
    if len <= OVERSIZE_LIMIT {
        return vec![(start, end, name, None)];
    }
    let mut out = Vec::new();
    let mut sub_start = start;
    let mut idx = 0;
    while sub_start < end {
        let sub_end = (sub_start + OVERSIZE_LIMIT).min(end);
        let sub_name = name.as_ref().map(|n| format!("{n}#{idx}"));
        out.push((sub_start, sub_end, sub_name, Some(idx)));
        if sub_end == end {
            break;
        }
        sub_start = sub_end - OVERSIZE_OVERLAP;
        idx += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_for_unrecognized_language() {
        let content = "some content\nmore content\n";
        let chunks = chunk_file("a.xyz", content, "plaintext");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 0);
    }

    #[test]
    fn finds_rust_function_boundary() {
        let content = "use std::io;\n\nfn hello() {\n    println!(\"hi\");\n}\n";
        let chunks = chunk_file("a.rs", content, "rust");
        assert!(chunks.iter().any(|c| c.symbol_name.as_deref() == Some("hello")));
    }

    #[test]
    fn splits_oversize_chunk_with_overlap() {
        let body: String = (0..300).map(|i| format!("line {i}\n")).collect();
        let content = format!("fn big() {{\n{body}}}\n");
        let chunks = chunk_file("a.rs", &content, "rust");
        assert!(chunks.len() > 1);
        assert!(chunks[0].end_line - chunks[0].start_line <= 150);
    }

    #[test]
    fn sliding_window_used_for_unknown_language_large_file() {
        let body: String = (0..500).map(|i| format!("line {i}\n")).collect();
        let chunks = chunk_file("a.txt", &body, "text");
        assert!(chunks.len() > 1);
        assert!(chunks[0].end_line - chunks[0].start_line == 200);
    }

    #[test]
    fn reserved_keyword_is_not_a_symbol_name() {
        let content = "fn f() {\n    if true {\n        1\n    }\n}\n";
        let chunks = chunk_file("a.rs", content, "rust");
        assert!(chunks.iter().all(|c| c.symbol_name.as_deref() != Some("if")));
    }

    #[test]
    fn empty_file_yields_no_chunks() {
        assert!(chunk_file("a.rs", "", "rust").is_empty());
    }
}
