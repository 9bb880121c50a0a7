//! Schema DDL and the migration gate for the hybrid store.

use rusqlite::Connection;

/// Bump this when the on-disk layout of `chunk_meta`/`chunks_fts`/`vecs`
/// changes in a way that requires a reindex.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS chunk_meta (
    rowid       INTEGER PRIMARY KEY,
    id          TEXT NOT NULL UNIQUE,
    file_path   TEXT NOT NULL,
    start_line  INTEGER NOT NULL,
    end_line    INTEGER NOT NULL,
    content     TEXT NOT NULL,
    language    TEXT NOT NULL,
    symbol_name TEXT,
    ingested_at INTEGER NOT NULL,
    memory_type TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunk_meta_file_path ON chunk_meta(file_path);

CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
    content,
    symbol_name,
    file_tokens,
    code_tokens,
    tokenize = 'porter unicode61'
);

CREATE TABLE IF NOT EXISTS vecs (
    rowid     INTEGER PRIMARY KEY,
    embedding BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS chunk_links (
    src_id     TEXT NOT NULL,
    dst_id     TEXT NOT NULL,
    similarity REAL NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (src_id, dst_id)
);
CREATE INDEX IF NOT EXISTS idx_chunk_links_src ON chunk_links(src_id);

CREATE TABLE IF NOT EXISTS index_events (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type     TEXT NOT NULL,
    files_changed  INTEGER NOT NULL,
    chunks_added   INTEGER NOT NULL,
    chunks_removed INTEGER NOT NULL,
    commit_sha     TEXT,
    created_at     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS _meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

fn stored_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT value FROM _meta WHERE key = 'schema_version'",
        [],
        |row| row.get::<_, String>(0),
    )
    .map(|v| v.parse().unwrap_or(0))
    .or(Ok(0))
}

fn set_version(conn: &Connection, version: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO _meta(key, value) VALUES ('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [version.to_string()],
    )?;
    Ok(())
}

pub fn get_dimensions(conn: &Connection) -> rusqlite::Result<Option<usize>> {
    conn.query_row(
        "SELECT value FROM _meta WHERE key = 'dimensions'",
        [],
        |row| row.get::<_, String>(0),
    )
    .map(|v| v.parse().ok())
    .or(Ok(None))
}

pub fn set_dimensions(conn: &Connection, dims: usize) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO _meta(key, value) VALUES ('dimensions', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [dims.to_string()],
    )?;
    Ok(())
}

fn clear_dimensions(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM _meta WHERE key = 'dimensions'", [])?;
    Ok(())
}

/// Ensures the schema exists at the current version, dropping and recreating
/// the schema-bound tables when an older version is found. Never migrates
/// data; a version bump just forces the next freshness check to return
/// `Full`.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);",
    )?;
    let version = stored_version(conn)?;
    if version != 0 && version < SCHEMA_VERSION {
        tracing::warn!(
            stored = version,
            current = SCHEMA_VERSION,
            "schema version changed, dropping index tables; a reindex is required"
        );
        conn.execute_batch(
            "DROP TABLE IF EXISTS chunk_meta;
             DROP TABLE IF EXISTS chunks_fts;
             DROP TABLE IF EXISTS vecs;",
        )?;
        clear_dimensions(conn)?;
    }
    conn.execute_batch(CREATE_TABLES)?;
    set_version(conn, SCHEMA_VERSION)?;
    Ok(())
}
