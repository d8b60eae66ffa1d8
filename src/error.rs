//! Error taxonomy for reconciliation operations.
//!
//! Driver errors are never swallowed: a `Transaction` error carries the
//! original sqlx error plus the name of the step that failed, and every
//! transaction that hits one is rolled back before the error is returned.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected before any statement was executed. No transaction is opened.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A statement, begin, or commit failed mid-operation. The in-flight
    /// transaction has already been rolled back.
    #[error("{step} failed: {source}")]
    Transaction {
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A point lookup returned zero rows.
    #[error("{what} {name:?} not found")]
    NotFound { what: &'static str, name: String },

    /// A point lookup returned more than one row. Catalog uniqueness
    /// constraints should make this unreachable.
    #[error("lookup of {what} {name:?} returned {rows} rows")]
    Ambiguous {
        what: &'static str,
        name: String,
        rows: usize,
    },

    /// A composite identifier did not split into the expected number of parts.
    #[error("malformed identifier {id:?}: expected {expected} parts, found {found}")]
    MalformedIdentifier {
        id: String,
        expected: usize,
        found: usize,
    },

    /// The operation exceeded its deadline. The in-flight transaction was
    /// dropped, which rolls it back on the server.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Wrap a driver error with the name of the failing step.
pub(crate) fn tx_err(step: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |source| Error::Transaction { step, source }
}
