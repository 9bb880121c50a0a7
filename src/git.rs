//! Git tracker (C6): decides whether the index is fresh, needs an
//! incremental update, or needs a full rebuild.

use crate::types::{DiffStatus, FreshnessDecision};
use std::path::{Path, PathBuf};
use std::process::Command;

const SENTINEL_NON_GIT: &str = "non-git-indexed";

pub struct GitTracker {
    sidecar_path: PathBuf,
}

impl GitTracker {
    pub fn new(persist_dir: &Path) -> Self {
        Self {
            sidecar_path: persist_dir.join("last_indexed_commit"),
        }
    }

    fn read_sidecar(&self) -> Option<String> {
        std::fs::read_to_string(&self.sidecar_path)
            .ok()
            .map(|s| s.trim().to_string())
    }

    pub fn save_last_indexed_commit(&self, commit: &str) -> anyhow::Result<()> {
        write_atomic(&self.sidecar_path, commit)
    }

    pub fn mark_non_git_indexed(&self) -> anyhow::Result<()> {
        write_atomic(&self.sidecar_path, SENTINEL_NON_GIT)
    }

    pub fn clear_last_indexed_commit(&self) -> anyhow::Result<()> {
        if self.sidecar_path.exists() {
            std::fs::remove_file(&self.sidecar_path)?;
        }
        Ok(())
    }

    /// Computes the freshness decision for `repo_path` per the state machine
    /// in the component design: no repo, unresolvable HEAD, or a diff error
    /// all fall back to a full reindex rather than surfacing an error.
    pub fn check_freshness(&self, repo_path: &Path) -> FreshnessDecision {
        if !is_git_repo(repo_path) {
            return match self.read_sidecar().as_deref() {
                Some(SENTINEL_NON_GIT) => FreshnessDecision::None,
                _ => FreshnessDecision::Full {
                    current_commit: None,
                },
            };
        }

        let Some(current) = resolve_head(repo_path) else {
            tracing::warn!(repo = %repo_path.display(), "could not resolve HEAD, forcing full reindex");
            return FreshnessDecision::Full {
                current_commit: None,
            };
        };

        let Some(previous) = self.read_sidecar() else {
            return FreshnessDecision::Full {
                current_commit: Some(current),
            };
        };

        if previous == current {
            return FreshnessDecision::None;
        }

        match diff_commits(repo_path, &previous, &current) {
            Some(changes) => {
                let mut added = Vec::new();
                let mut modified = Vec::new();
                let mut deleted = Vec::new();
                for (status, path) in changes {
                    match status {
                        DiffStatus::Added => added.push(path),
                        DiffStatus::Modified => modified.push(path),
                        DiffStatus::Deleted => deleted.push(path),
                    }
                }
                FreshnessDecision::Incremental {
                    current_commit: current,
                    added,
                    modified,
                    deleted,
                }
            }
            None => FreshnessDecision::Full {
                current_commit: Some(current),
            },
        }
    }
}

fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn is_git_repo(repo_path: &Path) -> bool {
    Command::new("git")
        .arg("rev-parse")
        .arg("--is-inside-work-tree")
        .current_dir(repo_path)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn resolve_head(repo_path: &Path) -> Option<String> {
    let output = Command::new("git")
        .arg("rev-parse")
        .arg("HEAD")
        .current_dir(repo_path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8(output.stdout).ok()?;
    Some(sha.trim().to_string())
}

fn diff_commits(repo_path: &Path, old: &str, new: &str) -> Option<Vec<(DiffStatus, String)>> {
    let output = Command::new("git")
        .arg("diff")
        .arg("--name-status")
        .arg(format!("{old}..{new}"))
        .current_dir(repo_path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(parse_name_status(&text))
}

fn parse_name_status(text: &str) -> Vec<(DiffStatus, String)> {
    let mut out = Vec::new();
    for line in text.lines() {
        let mut parts = line.splitn(2, '\t');
        let Some(code) = parts.next() else { continue };
        let Some(path) = parts.next() else { continue };
        let status = match code.chars().next() {
            Some('A') => DiffStatus::Added,
            Some('D') => DiffStatus::Deleted,
            Some('R') | Some('C') => DiffStatus::Modified,
            _ => DiffStatus::Modified,
        };
        // Renames carry "old\tnew"; only the new path matters for reindexing.
        let path = path.rsplit('\t').next().unwrap_or(path);
        out.push((status, path.to_string()));
    }
    out
}
