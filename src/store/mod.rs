//! Hybrid store (C5): a single SQLite database combining relational
//! metadata, weighted full-text search, and brute-force vector search.

mod schema;

use crate::error::{Error, Result};
use crate::types::{BatchEntry, Chunk, ChunkLink, IndexEvent, MemoryType};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn encode_vector(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Owns the one database handle and every prepared-statement interaction.
/// Methods are synchronous; async callers wrap them in `spawn_blocking`.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::EmbedderIo(e.into()))?;
        }
        let conn = Connection::open(path)?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn dimensions(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(schema::get_dimensions(&conn)?.unwrap_or(0))
    }

    pub fn has_vectors(&self) -> Result<bool> {
        Ok(self.dimensions()? > 0)
    }

    pub fn size(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM chunk_meta", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// Transactional upsert. Replaces existing rows for each chunk id, then
    /// inserts fresh rows across all three tables. Rolls back entirely on
    /// any error, including a vector-width mismatch.
    pub fn add_batch(&self, entries: &[BatchEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.lock().unwrap();
        let current_dims = schema::get_dimensions(&conn)?;

        let tx = conn.transaction()?;
        let mut fixed_dims = current_dims;
        let now = now_ms();

        for entry in entries {
            if !entry.vector.is_empty() {
                match fixed_dims {
                    Some(d) if d != entry.vector.len() => {
                        return Err(Error::DimensionMismatch {
                            expected: d,
                            got: entry.vector.len(),
                        });
                    }
                    None => fixed_dims = Some(entry.vector.len()),
                    _ => {}
                }
            }

            delete_chunk_rows(&tx, &entry.chunk.id)?;

            let memory_type = entry.memory_type;
            tx.execute(
                "INSERT INTO chunk_meta
                    (id, file_path, start_line, end_line, content, language, symbol_name, ingested_at, memory_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.chunk.id,
                    entry.chunk.file_path,
                    entry.chunk.start_line as i64,
                    entry.chunk.end_line as i64,
                    entry.chunk.content,
                    entry.chunk.language,
                    entry.chunk.symbol_name,
                    now,
                    memory_type.as_str(),
                ],
            )?;
            let rowid = tx.last_insert_rowid();

            let file_tokens = crate::tokenize::extract_code_tokens(
                Path::new(&entry.chunk.file_path)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(&entry.chunk.file_path),
            );
            let code_tokens = crate::tokenize::extract_code_tokens(&entry.chunk.content);
            tx.execute(
                "INSERT INTO chunks_fts (rowid, content, symbol_name, file_tokens, code_tokens)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    rowid,
                    entry.chunk.content,
                    entry.chunk.symbol_name,
                    file_tokens,
                    code_tokens,
                ],
            )?;

            if !entry.vector.is_empty() {
                tx.execute(
                    "INSERT INTO vecs (rowid, embedding) VALUES (?1, ?2)",
                    params![rowid, encode_vector(&entry.vector)],
                )?;
            }
        }

        if let Some(d) = fixed_dims {
            if current_dims.is_none() {
                schema::set_dimensions(&tx, d)?;
            }
        }

        tx.commit()?;
        Ok(entries.len())
    }

    pub fn search_bm25(&self, query: &str, top_k: usize) -> Result<Vec<(Chunk, f32)>> {
        let normalized = crate::tokenize::normalize_query(query);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().unwrap();
        let sql = "
            SELECT cm.id, cm.file_path, cm.start_line, cm.end_line, cm.content,
                   cm.language, cm.symbol_name, cm.ingested_at, cm.memory_type,
                   bm25(chunks_fts, 10.0, 1.0, 5.0, 3.0) AS rank
            FROM chunks_fts
            JOIN chunk_meta cm ON cm.rowid = chunks_fts.rowid
            WHERE chunks_fts MATCH ?1
            ORDER BY rank ASC
            LIMIT ?2";
        let mut stmt = match conn.prepare(sql) {
            Ok(s) => s,
            Err(_) => return Ok(Vec::new()),
        };
        let rows = stmt.query_map(params![normalized, top_k as i64], |row| {
            let chunk = row_to_chunk(row)?;
            let rank: f64 = row.get(9)?;
            Ok((chunk, rank as f32))
        });
        let rows = match rows {
            Ok(r) => r,
            Err(_) => return Ok(Vec::new()),
        };
        let mut out = Vec::new();
        for r in rows {
            match r {
                Ok(v) => out.push(v),
                Err(_) => return Ok(Vec::new()),
            }
        }
        Ok(out)
    }

    pub fn search_vector(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<(Chunk, f32)>> {
        if query_vec.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().unwrap();
        if schema::get_dimensions(&conn)?.unwrap_or(0) == 0 {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare("SELECT rowid, embedding FROM vecs")?;
        let rows = stmt.query_map([], |row| {
            let rowid: i64 = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((rowid, bytes))
        })?;

        let mut scored: Vec<(i64, f32)> = Vec::new();
        for r in rows {
            let (rowid, bytes) = r?;
            let v = decode_vector(&bytes);
            let dist = l2_distance(query_vec, &v);
            scored.push((rowid, 1.0 / (1.0 + dist)));
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let mut out = Vec::new();
        for (rowid, score) in scored {
            let chunk = conn
                .query_row(
                    "SELECT id, file_path, start_line, end_line, content, language,
                            symbol_name, ingested_at, memory_type
                     FROM chunk_meta WHERE rowid = ?1",
                    [rowid],
                    row_to_chunk,
                )
                .optional()?;
            if let Some(chunk) = chunk {
                out.push((chunk, score));
            }
        }
        Ok(out)
    }

    pub fn get_chunk_by_id(&self, id: &str) -> Result<Option<Chunk>> {
        let conn = self.conn.lock().unwrap();
        let chunk = conn
            .query_row(
                "SELECT id, file_path, start_line, end_line, content, language,
                        symbol_name, ingested_at, memory_type
                 FROM chunk_meta WHERE id = ?1",
                [id],
                row_to_chunk,
            )
            .optional()?;
        Ok(chunk)
    }

    pub fn get_embedding(&self, id: &str) -> Result<Option<Vec<f32>>> {
        let conn = self.conn.lock().unwrap();
        let bytes: Option<Vec<u8>> = conn
            .query_row(
                "SELECT v.embedding FROM vecs v
                 JOIN chunk_meta cm ON cm.rowid = v.rowid
                 WHERE cm.id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(bytes.map(|b| decode_vector(&b)))
    }

    pub fn add_links(&self, links: &[ChunkLink]) -> Result<()> {
        if links.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = now_ms();
        for link in links {
            tx.execute(
                "INSERT INTO chunk_links (src_id, dst_id, similarity, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(src_id, dst_id) DO UPDATE SET similarity = excluded.similarity",
                params![link.src_id, link.dst_id, link.similarity, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_links(&self, src_id: &str, limit: usize) -> Result<Vec<ChunkLink>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT src_id, dst_id, similarity FROM chunk_links
             WHERE src_id = ?1 ORDER BY similarity DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![src_id, limit as i64], |row| {
            Ok(ChunkLink {
                src_id: row.get(0)?,
                dst_id: row.get(1)?,
                similarity: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Recomputes the chunk-link graph from stored vectors: brute-force
    /// pairwise L2 distance rescored to a `(0,1]` similarity above
    /// `similarity_floor`, capped at `max_per_source` links per source
    /// chunk. An explicit, separately-callable pass; never invoked
    /// implicitly by retrieval.
    pub fn rebuild_links(&self, similarity_floor: f32, max_per_source: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT cm.id, v.embedding FROM vecs v
             JOIN chunk_meta cm ON cm.rowid = v.rowid",
        )?;
        let rows: Vec<(String, Vec<f32>)> = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let bytes: Vec<u8> = row.get(1)?;
                Ok((id, decode_vector(&bytes)))
            })?
            .collect::<rusqlite::Result<_>>()?;
        drop(stmt);

        let mut links = Vec::new();
        for (i, (src_id, src_vec)) in rows.iter().enumerate() {
            let mut candidates: Vec<(String, f32)> = Vec::new();
            for (j, (dst_id, dst_vec)) in rows.iter().enumerate() {
                if i == j {
                    continue;
                }
                let similarity = 1.0 / (1.0 + l2_distance(src_vec, dst_vec));
                if similarity >= similarity_floor {
                    candidates.push((dst_id.clone(), similarity));
                }
            }
            candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            candidates.truncate(max_per_source);
            for (dst_id, similarity) in candidates {
                links.push(ChunkLink {
                    src_id: src_id.clone(),
                    dst_id,
                    similarity,
                });
            }
        }
        drop(conn);
        let count = links.len();
        self.add_links(&links)?;
        Ok(count)
    }

    pub fn log_index_event(&self, event: &IndexEvent) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO index_events
                (event_type, files_changed, chunks_added, chunks_removed, commit_sha, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.event_type.as_str(),
                event.files_changed as i64,
                event.chunks_added as i64,
                event.chunks_removed as i64,
                event.commit_sha,
                now_ms(),
            ],
        )?;
        Ok(())
    }

    pub fn remove_by_file_path(&self, path: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        remove_file_rows(&tx, path)?;
        tx.commit()?;
        Ok(())
    }

    pub fn clear_all(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunk_meta", [])?;
        tx.execute("DELETE FROM chunks_fts", [])?;
        tx.execute("DELETE FROM vecs", [])?;
        tx.execute("DELETE FROM chunk_links", [])?;
        tx.execute("DELETE FROM _meta WHERE key = 'dimensions'", [])?;
        tx.commit()?;
        Ok(())
    }
}

fn delete_chunk_rows(tx: &rusqlite::Transaction, id: &str) -> rusqlite::Result<()> {
    let rowid: Option<i64> = tx
        .query_row("SELECT rowid FROM chunk_meta WHERE id = ?1", [id], |r| {
            r.get(0)
        })
        .optional()?;
    if let Some(rowid) = rowid {
        tx.execute("DELETE FROM chunk_meta WHERE rowid = ?1", [rowid])?;
        tx.execute("DELETE FROM chunks_fts WHERE rowid = ?1", [rowid])?;
        tx.execute("DELETE FROM vecs WHERE rowid = ?1", [rowid])?;
    }
    Ok(())
}

fn remove_file_rows(tx: &rusqlite::Transaction, file_path: &str) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare("SELECT rowid FROM chunk_meta WHERE file_path = ?1")?;
    let rowids: Vec<i64> = stmt
        .query_map([file_path], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    drop(stmt);
    for rowid in rowids {
        tx.execute("DELETE FROM chunk_meta WHERE rowid = ?1", [rowid])?;
        tx.execute("DELETE FROM chunks_fts WHERE rowid = ?1", [rowid])?;
        tx.execute("DELETE FROM vecs WHERE rowid = ?1", [rowid])?;
    }
    Ok(())
}

fn row_to_chunk(row: &rusqlite::Row) -> rusqlite::Result<Chunk> {
    let memory_type: String = row.get(8)?;
    Ok(Chunk {
        id: row.get(0)?,
        file_path: row.get(1)?,
        start_line: row.get::<_, i64>(2)? as usize,
        end_line: row.get::<_, i64>(3)? as usize,
        content: row.get(4)?,
        language: row.get(5)?,
        symbol_name: row.get(6)?,
        ingested_at: row.get(7)?,
        memory_type: MemoryType::parse(&memory_type),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawChunk;

    fn entry(id: &str, file: &str, content: &str, vector: Vec<f32>) -> BatchEntry {
        BatchEntry {
            chunk: RawChunk {
                id: id.to_string(),
                file_path: file.to_string(),
                start_line: 0,
                end_line: 1,
                content: content.to_string(),
                language: "rust".to_string(),
                symbol_name: None,
            },
            vector,
            memory_type: MemoryType::Semantic,
        }
    }

    #[test]
    fn lexical_round_trip() {
        let store = Store::open_in_memory().unwrap();
        store
            .add_batch(&[entry(
                "a.rs:0:1",
                "a.rs",
                "fn authenticateUser() {}",
                vec![],
            )])
            .unwrap();
        let results = store.search_bm25("authenticateUser", 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "a.rs:0:1");

        store.clear_all().unwrap();
        let results = store.search_bm25("authenticateUser", 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn dimension_mismatch_rolls_back_whole_batch() {
        let store = Store::open_in_memory().unwrap();
        store
            .add_batch(&[entry("a.rs:0:1", "a.rs", "fn a(){}", vec![1.0, 0.0, 0.0])])
            .unwrap();
        let err = store.add_batch(&[
            entry("b.rs:0:1", "b.rs", "fn b(){}", vec![1.0, 0.0, 0.0]),
            entry("c.rs:0:1", "c.rs", "fn c(){}", vec![1.0, 0.0]),
        ]);
        assert!(matches!(err, Err(Error::DimensionMismatch { .. })));
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn remove_by_file_path_deletes_all_rows_for_file() {
        let store = Store::open_in_memory().unwrap();
        store
            .add_batch(&[
                entry("a.rs:0:1", "a.rs", "fn a(){}", vec![]),
                entry("a.rs:2:3", "a.rs", "fn b(){}", vec![]),
            ])
            .unwrap();
        store.remove_by_file_path("a.rs").unwrap();
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn reinserting_same_id_replaces_row() {
        let store = Store::open_in_memory().unwrap();
        store
            .add_batch(&[entry("a.rs:0:1", "a.rs", "fn old(){}", vec![])])
            .unwrap();
        store
            .add_batch(&[entry("a.rs:0:1", "a.rs", "fn new(){}", vec![])])
            .unwrap();
        assert_eq!(store.size().unwrap(), 1);
        let chunk = store.get_chunk_by_id("a.rs:0:1").unwrap().unwrap();
        assert_eq!(chunk.content, "fn new(){}");
    }

    #[test]
    fn vector_search_returns_empty_without_dimensions() {
        let store = Store::open_in_memory().unwrap();
        store
            .add_batch(&[entry("a.rs:0:1", "a.rs", "fn a(){}", vec![])])
            .unwrap();
        let results = store.search_vector(&[1.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn vector_search_ranks_closest_first() {
        let store = Store::open_in_memory().unwrap();
        store
            .add_batch(&[
                entry("a.rs:0:1", "a.rs", "fn a(){}", vec![1.0, 0.0, 0.0]),
                entry("b.rs:0:1", "b.rs", "fn b(){}", vec![0.0, 1.0, 0.0]),
            ])
            .unwrap();
        let results = store.search_vector(&[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(results[0].0.id, "a.rs:0:1");
    }
}
