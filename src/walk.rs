//! File walker (C2): yields text files under a root, honoring size, binary,
//! and skip-directory rules.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub const MAX_FILE_BYTES: u64 = 1024 * 1024;
const SNIFF_BYTES: usize = 8 * 1024;

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".git",
    ".venv",
    "venv",
    "vendor",
    "coverage",
    ".next",
    ".cache",
];

const TEXT_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "py", "go", "java", "rb", "cs", "md", "txt", "json", "yaml",
    "yml", "toml", "ini", "sh", "bash",
];

pub struct WalkedFile {
    pub path: PathBuf,
    pub contents: String,
    pub language: String,
}

/// Maps a file extension to a lowercase language name understood by the
/// chunker; returns `"text"` for anything without a recognized extension.
pub fn language_for_path(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("rs") => "rust",
        Some("ts") | Some("tsx") => "typescript",
        Some("js") | Some("jsx") => "javascript",
        Some("py") => "python",
        Some("go") => "go",
        Some("java") => "java",
        Some("rb") => "ruby",
        Some("cs") => "csharp",
        other => other.unwrap_or("text"),
    }
    .to_string()
}

fn is_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SNIFF_BYTES)];
    if sample.contains(&0) {
        return true;
    }
    if sample.is_empty() {
        return false;
    }
    let non_printable = sample
        .iter()
        .filter(|&&b| b != b'\n' && b != b'\r' && b != b'\t' && !(0x20..=0x7e).contains(&b))
        .count();
    (non_printable as f64 / sample.len() as f64) > 0.05
}

/// Reads a single file, applying the same size/binary rejection rules as
/// directory traversal. Returns `None` if the file should be skipped.
pub fn read_file(path: &Path) -> anyhow::Result<Option<WalkedFile>> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_FILE_BYTES {
        return Ok(None);
    }
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false);
    if !ext_ok {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    if is_binary(&bytes) {
        return Ok(None);
    }
    let contents = String::from_utf8_lossy(&bytes).into_owned();
    let language = language_for_path(path);
    Ok(Some(WalkedFile {
        path: path.to_path_buf(),
        contents,
        language,
    }))
}

/// Walks `root` depth-first, yielding every eligible text file.
pub fn walk(root: &Path) -> anyhow::Result<Vec<WalkedFile>> {
    let mut out = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| !SKIP_DIRS.contains(&name))
                .unwrap_or(true)
        })
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if let Some(file) = read_file(entry.path())? {
            out.push(file);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn skips_oversize_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.rs");
        fs::write(&path, "x".repeat((MAX_FILE_BYTES + 1) as usize)).unwrap();
        assert!(read_file(&path).unwrap().is_none());
    }

    #[test]
    fn skips_binary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.rs");
        fs::write(&path, [0u8, 1, 2, 3, 0, 0]).unwrap();
        assert!(read_file(&path).unwrap().is_none());
    }

    #[test]
    fn reads_text_file_and_detects_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        fs::write(&path, "fn main() {}").unwrap();
        let file = read_file(&path).unwrap().unwrap();
        assert_eq!(file.language, "rust");
        assert_eq!(file.contents, "fn main() {}");
    }

    #[test]
    fn walk_skips_blocked_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/a.rs"), "fn a(){}").unwrap();
        fs::write(dir.path().join("keep.rs"), "fn b(){}").unwrap();
        let files = walk(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("keep.rs"));
    }
}
