//! Point lookups mapping principal and namespace names to their durable
//! numeric catalog identities, and back.
//!
//! All lookups use bound parameters; nothing here is ever interpolated into
//! statement text. The numeric identities travel as opaque strings, compared
//! against the catalog columns by literal text value.

use sqlx::PgExecutor;

use crate::error::{Error, Result, tx_err};

/// Resolve a user name to its `usesysid`.
pub async fn user_id<'e, E: PgExecutor<'e>>(executor: E, name: &str) -> Result<String> {
    lookup_one(
        executor,
        "SELECT usesysid::text FROM pg_user WHERE usename = $1",
        name,
        "user",
        "resolve user id",
    )
    .await
}

/// Resolve a group name to its `grosysid`.
pub async fn group_id<'e, E: PgExecutor<'e>>(executor: E, name: &str) -> Result<String> {
    lookup_one(
        executor,
        "SELECT grosysid::text FROM pg_group WHERE groname = $1",
        name,
        "group",
        "resolve group id",
    )
    .await
}

/// Resolve a schema name to its namespace oid.
pub async fn namespace_id<'e, E: PgExecutor<'e>>(executor: E, name: &str) -> Result<String> {
    lookup_one(
        executor,
        "SELECT oid::text FROM pg_namespace WHERE nspname = $1",
        name,
        "schema",
        "resolve schema id",
    )
    .await
}

/// Reverse lookup: user name by `usesysid`.
pub async fn user_name<'e, E: PgExecutor<'e>>(executor: E, id: &str) -> Result<String> {
    lookup_one(
        executor,
        "SELECT usename FROM pg_user WHERE usesysid::text = $1",
        id,
        "user id",
        "resolve user name",
    )
    .await
}

/// Reverse lookup: group name by `grosysid`.
pub async fn group_name<'e, E: PgExecutor<'e>>(executor: E, id: &str) -> Result<String> {
    lookup_one(
        executor,
        "SELECT groname FROM pg_group WHERE grosysid::text = $1",
        id,
        "group id",
        "resolve group name",
    )
    .await
}

/// Reverse lookup: schema name by namespace oid.
pub async fn namespace_name<'e, E: PgExecutor<'e>>(executor: E, id: &str) -> Result<String> {
    lookup_one(
        executor,
        "SELECT nspname FROM pg_namespace WHERE oid::text = $1",
        id,
        "schema id",
        "resolve schema name",
    )
    .await
}

async fn lookup_one<'e, E: PgExecutor<'e>>(
    executor: E,
    sql: &'static str,
    key: &str,
    what: &'static str,
    step: &'static str,
) -> Result<String> {
    let rows: Vec<String> = sqlx::query_scalar(sql)
        .bind(key)
        .fetch_all(executor)
        .await
        .map_err(tx_err(step))?;

    if rows.len() > 1 {
        return Err(Error::Ambiguous {
            what,
            name: key.to_string(),
            rows: rows.len(),
        });
    }

    rows.into_iter().next().ok_or(Error::NotFound {
        what,
        name: key.to_string(),
    })
}
