//! Retriever (C8): normalizes the query, runs BM25 and vector search
//! concurrently, fuses with Reciprocal Rank Fusion, applies recency decay
//! and memory-type weighting, then expands via the chunk-link graph.

use crate::embed::Embedder;
use crate::error::Result;
use crate::store::Store;
use crate::types::{Chunk, SearchResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const RRF_K: f32 = 60.0;
const DECAY_FLOOR: f32 = 0.5;
const DECAY_RATE: f32 = 0.95;
const MS_PER_MONTH: f64 = 30.0 * 24.0 * 3600.0 * 1000.0;
const GRAPH_HOP_SEEDS: usize = 5;
const GRAPH_HOP_LINKS_PER_SEED: usize = 3;
const GRAPH_HOP_SIMILARITY_FLOOR: f32 = 0.9;
const GRAPH_HOP_DISCOUNT: f32 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub max_results: usize,
    pub min_score: Option<f32>,
    pub languages: Option<Vec<String>>,
    pub directory: Option<PathBuf>,
}

impl SearchOptions {
    pub fn with_max_results(max_results: usize) -> Self {
        Self {
            max_results,
            ..Default::default()
        }
    }
}

fn decay(now_ms: i64, ingested_at: i64) -> f32 {
    let age_months = ((now_ms - ingested_at).max(0) as f64) / MS_PER_MONTH;
    (DECAY_RATE.powf(age_months as f32)).max(DECAY_FLOOR)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn filter_by_language(rows: Vec<(Chunk, f32)>, languages: &Option<Vec<String>>) -> Vec<(Chunk, f32)> {
    match languages {
        None => rows,
        Some(langs) if langs.is_empty() => rows,
        Some(langs) => rows
            .into_iter()
            .filter(|(c, _)| langs.iter().any(|l| l == &c.language))
            .collect(),
    }
}

fn filter_by_directory(rows: Vec<(Chunk, f32)>, directory: &Option<PathBuf>) -> Vec<(Chunk, f32)> {
    match directory {
        None => rows,
        Some(dir) => rows
            .into_iter()
            .filter(|(c, _)| Path::new(&c.file_path).starts_with(dir))
            .collect(),
    }
}

struct Accumulated {
    chunk: Chunk,
    rrf_score: f32,
}

fn accumulate_rrf(lists: &[Vec<(Chunk, f32)>]) -> HashMap<String, Accumulated> {
    let mut acc: HashMap<String, Accumulated> = HashMap::new();
    for list in lists {
        for (rank, (chunk, _)) in list.iter().enumerate() {
            let contribution = 1.0 / (RRF_K + rank as f32 + 1.0);
            acc.entry(chunk.id.clone())
                .and_modify(|a| a.rrf_score += contribution)
                .or_insert_with(|| Accumulated {
                    chunk: chunk.clone(),
                    rrf_score: contribution,
                });
        }
    }
    acc
}

/// Runs a hybrid search against `store`, using `embedder` for the query
/// vector when the store carries embeddings.
pub async fn search(
    store: Arc<Store>,
    embedder: Arc<dyn Embedder>,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<SearchResult>> {
    let k = options.max_results.max(1);
    let candidate_k = k * 2;
    let query_owned = query.to_string();

    let bm25_store = Arc::clone(&store);
    let bm25_query = query_owned.clone();
    let bm25_handle =
        tokio::task::spawn_blocking(move || bm25_store.search_bm25(&bm25_query, candidate_k));

    let vector_rows = if embedder.dimensions() > 0 {
        match embedder.embed(&query_owned).await {
            Ok(vec) if !vec.is_empty() => {
                let vec_store = Arc::clone(&store);
                let handle =
                    tokio::task::spawn_blocking(move || vec_store.search_vector(&vec, candidate_k));
                handle.await.map_err(|e| {
                    crate::error::Error::EmbedderIo(anyhow::anyhow!("join error: {e}"))
                })??
            }
            _ => Vec::new(),
        }
    } else {
        Vec::new()
    };

    let bm25_rows = bm25_handle
        .await
        .map_err(|e| crate::error::Error::EmbedderIo(anyhow::anyhow!("join error: {e}")))??;

    let bm25_rows = filter_by_directory(filter_by_language(bm25_rows, &options.languages), &options.directory);
    let vector_rows = filter_by_directory(filter_by_language(vector_rows, &options.languages), &options.directory);
    tracing::debug!(bm25 = bm25_rows.len(), vector = vector_rows.len(), "fused search candidates");

    let acc = accumulate_rrf(&[bm25_rows, vector_rows]);
    let now = now_ms();

    let mut scored: Vec<(Chunk, f32)> = acc
        .into_values()
        .map(|a| {
            let d = decay(now, a.chunk.ingested_at);
            let tw = a.chunk.memory_type.weight();
            let final_score = a.rrf_score * d * tw;
            (a.chunk, final_score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);

    if store.has_vectors()? && !scored.is_empty() {
        let before = scored.len();
        scored = expand_via_graph(&store, scored, k, now).await?;
        tracing::debug!(before, after = scored.len(), "graph-hop expansion applied");
    }

    let mut results: Vec<SearchResult> = scored
        .into_iter()
        .map(|(chunk, score)| SearchResult {
            chunk,
            score,
            source: "hybrid",
        })
        .collect();

    if let Some(min_score) = options.min_score {
        results.retain(|r| r.score >= min_score);
    }

    Ok(results)
}

async fn expand_via_graph(
    store: &Arc<Store>,
    primary: Vec<(Chunk, f32)>,
    k: usize,
    now: i64,
) -> Result<Vec<(Chunk, f32)>> {
    let mut seen: HashSet<String> = primary.iter().map(|(c, _)| c.id.clone()).collect();
    let seeds: Vec<(String, f32)> = primary
        .iter()
        .take(GRAPH_HOP_SEEDS)
        .map(|(c, score)| (c.id.clone(), *score))
        .collect();

    let store_clone = Arc::clone(store);
    let expansions: Vec<(Chunk, f32)> = tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        for (seed_id, seed_score) in seeds {
            let links = match store_clone.get_links(&seed_id, GRAPH_HOP_LINKS_PER_SEED) {
                Ok(l) => l,
                Err(_) => continue,
            };
            for link in links {
                if link.similarity < GRAPH_HOP_SIMILARITY_FLOOR || seen.contains(&link.dst_id) {
                    continue;
                }
                if let Ok(Some(dst_chunk)) = store_clone.get_chunk_by_id(&link.dst_id) {
                    let d = decay(now, dst_chunk.ingested_at);
                    let tw = dst_chunk.memory_type.weight();
                    let discounted = seed_score * GRAPH_HOP_DISCOUNT * link.similarity * d * tw;
                    seen.insert(link.dst_id.clone());
                    out.push((dst_chunk, discounted));
                }
            }
        }
        out
    })
    .await
    .map_err(|e| crate::error::Error::EmbedderIo(anyhow::anyhow!("join error: {e}")))?;

    let mut merged = primary;
    merged.extend(expansions);
    merged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(k);
    Ok(merged)
}
