use serde::{Deserialize, Serialize};

/// Classification of a file's contents, used to weight retrieval results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Semantic,
    Procedural,
}

impl MemoryType {
    pub fn weight(self) -> f32 {
        match self {
            MemoryType::Semantic => 1.0,
            MemoryType::Procedural => 0.8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemoryType::Semantic => "semantic",
            MemoryType::Procedural => "procedural",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "procedural" => MemoryType::Procedural,
            _ => MemoryType::Semantic,
        }
    }
}

/// The atomic unit of retrieval: a contiguous span of one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub language: String,
    pub symbol_name: Option<String>,
    pub ingested_at: i64,
    pub memory_type: MemoryType,
}

impl Chunk {
    pub fn make_id(path: &str, start: usize, end: usize, subindex: Option<usize>) -> String {
        match subindex {
            Some(i) => format!("{path}:{start}:{end}:{i}"),
            None => format!("{path}:{start}:{end}"),
        }
    }
}

/// A raw chunk produced by the chunker, before it has been embedded, classified
/// or assigned an ingestion timestamp.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub id: String,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub language: String,
    pub symbol_name: Option<String>,
}

/// One entry submitted to the store in a batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub chunk: RawChunk,
    pub vector: Vec<f32>,
    pub memory_type: MemoryType,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
    pub source: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStatus {
    Added,
    Modified,
    Deleted,
}

/// The git tracker's verdict on index staleness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshnessDecision {
    None,
    Full {
        current_commit: Option<String>,
    },
    Incremental {
        current_commit: String,
        added: Vec<String>,
        modified: Vec<String>,
        deleted: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEventType {
    Full,
    Incremental,
    Files,
}

impl IndexEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexEventType::Full => "full",
            IndexEventType::Incremental => "incremental",
            IndexEventType::Files => "files",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexEvent {
    pub event_type: IndexEventType,
    pub files_changed: usize,
    pub chunks_added: usize,
    pub chunks_removed: usize,
    pub commit_sha: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexResult {
    pub indexed_files: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone)]
pub struct ChunkLink {
    pub src_id: String,
    pub dst_id: String,
    pub similarity: f32,
}
