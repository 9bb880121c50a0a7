use std::path::PathBuf;

/// Which embedder the engine should ask an external collaborator to wire up.
///
/// The engine never constructs these itself; it only records the caller's
/// choice so an outer config loader has a concrete type to populate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedderKind {
    /// No embedding provider; lexical-only retrieval.
    Noop,
    Ollama { base_url: String, model: String },
    Transformers { model: String },
}

impl Default for EmbedderKind {
    fn default() -> Self {
        EmbedderKind::Noop
    }
}

/// Which chunking strategy C1 should use for a given file's language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkerKind {
    /// Language-aware block boundaries (see `crate::chunk`).
    Ast,
    /// Sliding-window fallback, used regardless of language when selected.
    Text,
}

impl Default for ChunkerKind {
    fn default() -> Self {
        ChunkerKind::Ast
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// Knobs this crate recognizes. Never parsed from a file or environment
/// variable here; an external config loader is expected to populate it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub embedder: EmbedderKind,
    pub chunker: ChunkerKind,
    pub persist_path: PathBuf,
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedder: EmbedderKind::default(),
            chunker: ChunkerKind::default(),
            persist_path: default_persist_path(),
            log_level: LogLevel::default(),
        }
    }
}

fn default_persist_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".holocron").join("index.db"))
        .unwrap_or_else(|| PathBuf::from(".holocron/index.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_lexical_only() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.embedder, EmbedderKind::Noop);
        assert_eq!(cfg.chunker, ChunkerKind::Ast);
    }
}
