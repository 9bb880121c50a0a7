//! Indexer (C7): walk -> chunk -> embed -> single-transaction commit.

use crate::classify::classify;
use crate::config::ChunkerKind;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{BatchEntry, IndexEvent, IndexEventType, IndexResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

const PHASE_A_CONCURRENCY: usize = 16;

pub struct Indexer {
    store: Arc<Store>,
    embedder: Arc<dyn Embedder>,
    chunker: ChunkerKind,
    in_flight: Mutex<()>,
}

impl Indexer {
    pub fn new(store: Arc<Store>, embedder: Arc<dyn Embedder>, chunker: ChunkerKind) -> Self {
        Self {
            store,
            embedder,
            chunker,
            in_flight: Mutex::new(()),
        }
    }

    pub async fn index_directory(&self, root: &Path) -> Result<IndexResult> {
        let root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || crate::walk::walk(&root))
            .await
            .map_err(join_err)?
            .map_err(Error::EmbedderIo)?;
        let paths: Vec<PathBuf> = files.into_iter().map(|f| f.path).collect();
        self.run_pipeline(&paths, IndexEventType::Full, None).await
    }

    pub async fn index_files(&self, paths: &[PathBuf]) -> Result<IndexResult> {
        self.run_pipeline(paths, IndexEventType::Incremental, None)
            .await
    }

    pub async fn index_files_for_commit(
        &self,
        paths: &[PathBuf],
        commit_sha: &str,
    ) -> Result<IndexResult> {
        self.run_pipeline(paths, IndexEventType::Incremental, Some(commit_sha))
            .await
    }

    pub async fn remove_files(&self, paths: &[PathBuf]) -> Result<()> {
        let store = Arc::clone(&self.store);
        let paths: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        tokio::task::spawn_blocking(move || {
            for path in &paths {
                store.remove_by_file_path(path)?;
            }
            Ok::<_, Error>(())
        })
        .await
        .map_err(join_err)??;
        Ok(())
    }

    pub async fn clear_index(&self) -> Result<()> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.clear_all())
            .await
            .map_err(join_err)??;
        Ok(())
    }

    async fn run_pipeline(
        &self,
        paths: &[PathBuf],
        event_type: IndexEventType,
        commit_sha: Option<&str>,
    ) -> Result<IndexResult> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| Error::IndexInProgress)?;
        tracing::debug!(files = paths.len(), event = event_type.as_str(), "indexing pipeline starting");

        // Idempotent: clear any previous chunks for these files before the
        // fresh pass lands.
        {
            let store = Arc::clone(&self.store);
            let rel: Vec<String> = paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            tokio::task::spawn_blocking(move || {
                for path in &rel {
                    store.remove_by_file_path(path)?;
                }
                Ok::<_, Error>(())
            })
            .await
            .map_err(join_err)??;
        }

        // Phase A: bounded-concurrency read + chunk.
        let semaphore = Arc::new(Semaphore::new(PHASE_A_CONCURRENCY));
        let chunker = self.chunker;
        let mut tasks = Vec::new();
        for path in paths {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            let path = path.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                read_and_chunk(&path, chunker)
            }));
        }

        let mut raw_chunks = Vec::new();
        for task in tasks {
            if let Ok(Ok(Some(mut chunks))) = task.await {
                raw_chunks.append(&mut chunks);
            }
        }

        if raw_chunks.is_empty() {
            self.log_event(event_type, paths.len(), 0, commit_sha)
                .await?;
            return Ok(IndexResult {
                indexed_files: paths.len(),
                chunks: 0,
            });
        }

        // Phase B: sequential embed.
        let mut entries = Vec::with_capacity(raw_chunks.len());
        for chunk in raw_chunks {
            let input = crate::tokenize::contextual_embedding_input(
                &chunk.file_path,
                &chunk.language,
                chunk.symbol_name.as_deref(),
                &chunk.content,
            );
            let vector = if self.embedder.dimensions() > 0 {
                self.embedder.embed(&input).await.map_err(Error::EmbedderIo)?
            } else {
                Vec::new()
            };
            let memory_type = classify(&chunk.file_path);
            entries.push(BatchEntry {
                chunk,
                vector,
                memory_type,
            });
        }

        // Phase C: single commit.
        let chunks_added = entries.len();
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.add_batch(&entries))
            .await
            .map_err(join_err)??;

        // Phase D: audit log.
        self.log_event(event_type, paths.len(), chunks_added, commit_sha)
            .await?;
        tracing::info!(files = paths.len(), chunks = chunks_added, "indexing pipeline committed");

        Ok(IndexResult {
            indexed_files: paths.len(),
            chunks: chunks_added,
        })
    }

    async fn log_event(
        &self,
        event_type: IndexEventType,
        files_changed: usize,
        chunks_added: usize,
        commit_sha: Option<&str>,
    ) -> Result<()> {
        let store = Arc::clone(&self.store);
        let event = IndexEvent {
            event_type,
            files_changed,
            chunks_added,
            chunks_removed: 0,
            commit_sha: commit_sha.map(String::from),
        };
        tokio::task::spawn_blocking(move || store.log_index_event(&event))
            .await
            .map_err(join_err)??;
        Ok(())
    }
}

fn read_and_chunk(
    path: &Path,
    chunker: ChunkerKind,
) -> anyhow::Result<Option<Vec<crate::types::RawChunk>>> {
    let Some(file) = crate::walk::read_file(path)? else {
        return Ok(None);
    };
    let rel_path = path.to_string_lossy().into_owned();
    let chunks = crate::chunk::chunk_file_with_kind(&rel_path, &file.contents, &file.language, chunker);
    Ok(Some(chunks))
}

fn join_err(e: tokio::task::JoinError) -> Error {
    Error::EmbedderIo(anyhow::anyhow!("task join error: {e}"))
}
