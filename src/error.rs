use thiserror::Error;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot open store at \"{path}\"")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query \"{query}\" failed")]
    Query {
        query: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Transaction error: {message}")]
    Transaction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

// ---------------------------------------------------------------------------
// ResolveError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Usernames still colliding after {passes} resolution passes")]
    PassLimitExceeded { passes: u32 },
}

// ---------------------------------------------------------------------------
// DedupError — top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DedupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Convenience alias — the default error type is `DedupError`.
pub type Result<T, E = DedupError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
