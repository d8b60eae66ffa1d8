//! Reconcilers converge live catalog state toward a declared resource, one
//! resource per call, one transaction per operation.

pub mod grant;
pub mod group;
pub mod plan;
pub mod schema;
pub mod sql;
pub mod user;

pub use grant::GrantReconciler;
pub use group::{GroupReconciler, GroupState};
pub use plan::{Plan, Statement};
pub use schema::{SchemaReconciler, SchemaState};
pub use user::UserReconciler;

use std::time::Duration;

use sqlx::{Postgres, Transaction};
use tracing::debug;

use crate::error::{Error, Result, tx_err};

/// Default per-operation deadline. Callers can shorten or extend it per
/// reconciler; on expiry the in-flight transaction is dropped and rolled
/// back server-side.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) async fn exec(
    tx: &mut Transaction<'_, Postgres>,
    step: &'static str,
    sql: &str,
) -> Result<()> {
    debug!(step, "executing statement");
    sqlx::query(sql)
        .execute(&mut **tx)
        .await
        .map_err(tx_err(step))?;
    Ok(())
}

/// Reinterpret a missing catalog row as an absence signal. Refresh paths use
/// this: a vanished resource is a state, not a failure.
pub(crate) fn absent_on_not_found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::NotFound { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}
