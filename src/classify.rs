//! Memory-type classification (C4): is a file payload or tooling?

use crate::types::MemoryType;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const PROCEDURAL_EXTENSIONS: &[&str] = &[
    "json", "yaml", "yml", "toml", "ini", "env", "sh", "bash", "zsh", "ps1",
];

fn procedural_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^docker-compose",
            r"\.config\.(ts|js|cjs|mjs)$",
            r"^tsconfig.*\.json$",
            r"^\.eslintrc",
            r"^\.prettierrc",
            r"^(vitest|jest)\.config",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Classifies a file path as semantic (payload: code, docs) or procedural
/// (tooling: config, scripts).
pub fn classify(path: &str) -> MemoryType {
    let basename = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    let lower = basename.to_lowercase();

    if lower == "makefile" || lower == "dockerfile" {
        return MemoryType::Procedural;
    }

    if let Some(ext) = Path::new(basename).extension().and_then(|e| e.to_str()) {
        if PROCEDURAL_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return MemoryType::Procedural;
        }
    }

    if procedural_patterns().iter().any(|re| re.is_match(basename)) {
        return MemoryType::Procedural;
    }

    MemoryType::Semantic
}
