//! A local codebase-intelligence engine: git-aware incremental indexing plus
//! hybrid BM25 + vector retrieval over a single embedded database.

pub mod chunk;
pub mod classify;
pub mod config;
pub mod context;
pub mod embed;
pub mod error;
pub mod git;
pub mod index;
pub mod retrieve;
pub mod store;
pub mod tokenize;
pub mod types;
pub mod walk;

use crate::config::EngineConfig;
use crate::embed::{Embedder, NoopEmbedder};
use crate::error::Result;
use crate::git::GitTracker;
use crate::index::Indexer;
use crate::store::Store;
use crate::types::{FreshnessDecision, IndexResult, SearchResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use crate::context::{format_context, ContextOptions};
pub use crate::retrieve::SearchOptions;

/// Top-level façade wiring together the store, indexer, git tracker, and
/// retriever. One instance owns one database file and one sidecar commit
/// file.
pub struct Engine {
    store: Arc<Store>,
    embedder: Arc<dyn Embedder>,
    indexer: Indexer,
    git: GitTracker,
}

impl Engine {
    /// Opens (or creates) the database at `config.persist_path` and wires up
    /// a `NoopEmbedder` unless `embedder` is supplied.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        Self::open_with_embedder(config, Arc::new(NoopEmbedder))
    }

    pub fn open_with_embedder(config: &EngineConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let store = Arc::new(Store::open(&config.persist_path)?);
        let persist_dir = config
            .persist_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let git = GitTracker::new(&persist_dir);
        let indexer = Indexer::new(Arc::clone(&store), Arc::clone(&embedder), config.chunker);
        Ok(Self {
            store,
            embedder,
            indexer,
            git,
        })
    }

    pub fn check_freshness(&self, repo_path: &Path) -> FreshnessDecision {
        self.git.check_freshness(repo_path)
    }

    pub async fn index_directory(&self, root: &Path) -> Result<IndexResult> {
        let result = self.indexer.index_directory(root).await?;
        self.save_commit_if_git(root)?;
        Ok(result)
    }

    pub async fn index_files(&self, paths: &[PathBuf]) -> Result<IndexResult> {
        self.indexer.index_files(paths).await
    }

    /// Brings the index up to date with `repo_path`'s current git state:
    /// does nothing when fresh, re-indexes only the changed paths on an
    /// incremental decision (tagging the resulting `IndexEvent` with the new
    /// commit), and falls back to a full `index_directory` otherwise.
    pub async fn sync_with_git(&self, repo_path: &Path) -> Result<IndexResult> {
        match self.git.check_freshness(repo_path) {
            FreshnessDecision::None => Ok(IndexResult {
                indexed_files: 0,
                chunks: 0,
            }),
            FreshnessDecision::Incremental {
                current_commit,
                added,
                modified,
                deleted,
            } => {
                if !deleted.is_empty() {
                    let deleted_paths: Vec<PathBuf> =
                        deleted.iter().map(|p| repo_path.join(p)).collect();
                    self.indexer.remove_files(&deleted_paths).await?;
                }
                let changed_paths: Vec<PathBuf> = added
                    .iter()
                    .chain(modified.iter())
                    .map(|p| repo_path.join(p))
                    .collect();
                let result = if changed_paths.is_empty() {
                    IndexResult {
                        indexed_files: 0,
                        chunks: 0,
                    }
                } else {
                    self.indexer
                        .index_files_for_commit(&changed_paths, &current_commit)
                        .await?
                };
                self.git.save_last_indexed_commit(&current_commit).ok();
                Ok(result)
            }
            FreshnessDecision::Full { current_commit } => {
                let result = self.indexer.index_directory(repo_path).await?;
                match current_commit {
                    Some(commit) => {
                        self.git.save_last_indexed_commit(&commit).ok();
                    }
                    None => {
                        self.git.mark_non_git_indexed().ok();
                    }
                }
                Ok(result)
            }
        }
    }

    pub async fn remove_files(&self, paths: &[PathBuf]) -> Result<()> {
        self.indexer.remove_files(paths).await
    }

    pub async fn clear_index(&self) -> Result<()> {
        self.indexer.clear_index().await?;
        self.git.clear_last_indexed_commit().ok();
        Ok(())
    }

    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchResult>> {
        retrieve::search(Arc::clone(&self.store), Arc::clone(&self.embedder), query, options).await
    }

    pub fn format_context(&self, results: &[SearchResult], query: &str, options: &ContextOptions) -> String {
        context::format_context(results, query, options)
    }

    pub fn rebuild_links(&self, similarity_floor: f32, max_per_source: usize) -> Result<usize> {
        self.store.rebuild_links(similarity_floor, max_per_source)
    }

    /// Releases the database handle. After this call the engine must not be
    /// used again; callers drop it to free the underlying file handle.
    pub fn dispose(self) {
        drop(self);
    }

    fn save_commit_if_git(&self, repo_path: &Path) -> Result<()> {
        match self.git.check_freshness(repo_path) {
            FreshnessDecision::Full {
                current_commit: Some(commit),
            } => {
                self.git.save_last_indexed_commit(&commit).ok();
            }
            FreshnessDecision::Incremental { current_commit, .. } => {
                self.git.save_last_indexed_commit(&current_commit).ok();
            }
            FreshnessDecision::Full {
                current_commit: None,
            } => {
                self.git.mark_non_git_indexed().ok();
            }
            FreshnessDecision::None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn end_to_end_index_and_search() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("auth.ts"),
            "function authenticateUser(token: string) { return validate(token); }\n",
        )
        .unwrap();

        let db_dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            persist_path: db_dir.path().join("index.db"),
            ..Default::default()
        };
        let engine = Engine::open(&config).unwrap();

        engine.index_directory(dir.path()).await.unwrap();
        let results = engine
            .search("authenticateUser", SearchOptions::with_max_results(5))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);

        engine.clear_index().await.unwrap();
        let results = engine
            .search("authenticateUser", SearchOptions::with_max_results(5))
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
