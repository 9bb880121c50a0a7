//! Context formatter (C9): deterministic shaping of a ranked result set into
//! an XML block for prompt injection.

use crate::types::SearchResult;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub max_chars_per_chunk: usize,
    pub relevance_threshold: f32,
    pub max_results_per_file: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_chars_per_chunk: 2000,
            relevance_threshold: 0.05,
            max_results_per_file: 2,
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.len() <= max_chars {
        return content.to_string();
    }
    let cut = &content[..max_chars];
    let boundary = cut.rfind('\n').unwrap_or(max_chars);
    format!("{}\n... [truncated]", &content[..boundary])
}

/// Filters, diversifies, dedupes, truncates, and serializes `results` into a
/// `<codebase_context>` block. Returns the empty string if nothing survives.
pub fn format_context(results: &[SearchResult], query: &str, options: &ContextOptions) -> String {
    let above_threshold: Vec<&SearchResult> = results
        .iter()
        .filter(|r| r.score >= options.relevance_threshold)
        .collect();

    let mut per_file_count: HashMap<&str, usize> = HashMap::new();
    let mut diversified: Vec<&SearchResult> = Vec::new();
    for r in above_threshold {
        let count = per_file_count.entry(r.chunk.file_path.as_str()).or_insert(0);
        if *count >= options.max_results_per_file {
            continue;
        }
        *count += 1;
        diversified.push(r);
    }

    let mut seen_prefixes = std::collections::HashSet::new();
    let mut survivors: Vec<&SearchResult> = Vec::new();
    for r in diversified {
        let prefix: String = r.chunk.content.chars().take(200).collect();
        if seen_prefixes.insert(prefix) {
            survivors.push(r);
        }
    }

    if survivors.is_empty() {
        return String::new();
    }

    let mut body = String::new();
    for (i, r) in survivors.iter().enumerate() {
        let symbol_attr = match &r.chunk.symbol_name {
            Some(s) => format!(" symbol=\"{}\"", escape_xml(s)),
            None => String::new(),
        };
        let content = truncate_content(&r.chunk.content, options.max_chars_per_chunk);
        body.push_str(&format!(
            "<result rank=\"{}\" file=\"{}\" lines=\"{}-{}\" language=\"{}\"{} score=\"{:.2}\">\n{}\n</result>\n",
            i + 1,
            escape_xml(&r.chunk.file_path),
            r.chunk.start_line,
            r.chunk.end_line,
            escape_xml(&r.chunk.language),
            symbol_attr,
            r.score,
            escape_xml(&content),
        ));
    }

    format!(
        "<codebase_context query=\"{}\" results=\"{}\">\n{}</codebase_context>",
        escape_xml(query),
        survivors.len(),
        body
    )
}
