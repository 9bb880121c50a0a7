use thiserror::Error;

/// Errors a caller of this crate can observe.
///
/// Several taxonomy kinds never reach this enum by design: full-text grammar
/// errors are swallowed into an empty search result, chunker fallback is
/// silent, schema migration only logs, and git unavailability is represented
/// as a `FreshnessDecision` value rather than an `Err`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("vector width {got} does not match index dimensionality {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("store I/O error: {0}")]
    StoreIo(#[from] rusqlite::Error),

    #[error("embedder error: {0}")]
    EmbedderIo(#[source] anyhow::Error),

    #[error("an indexing operation is already in progress")]
    IndexInProgress,
}

pub type Result<T> = std::result::Result<T, Error>;
