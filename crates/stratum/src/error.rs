//! Error types for stratum.

use thiserror::Error;

/// Migration reconciler errors.
///
/// The first error at any pipeline stage aborts the run and propagates to the
/// caller; nothing is retried or swallowed.
#[derive(Error, Debug)]
pub enum StratumError {
    /// Directory walk or script read failed (S001).
    #[error("[S001] Migration file read failed: {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Bookkeeping table creation failed (S002).
    #[error("[S002] Bookkeeping table creation failed: {0}")]
    Schema(String),

    /// Reading from the bookkeeping table failed (S003).
    #[error("[S003] Bookkeeping query failed: {0}")]
    Query(String),

    /// A migration script's SQL failed to execute (S004).
    #[error("[S004] Migration '{name}' failed: {message}")]
    Execution { name: String, message: String },

    /// The bookkeeping insert did not affect exactly one row (S005).
    #[error("[S005] Bookkeeping insert for '{name}' affected {rows} rows, expected 1")]
    Consistency { name: String, rows: usize },
}

/// Result type alias for [`StratumError`].
pub type StratumResult<T> = Result<T, StratumError>;
