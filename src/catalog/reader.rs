//! Catalog queries for the two read paths.
//!
//! Schema grants live in the per-object ACL (`pg_namespace.nspacl`), one
//! row per namespace. Table grants are observed through the
//! default-privileges catalog (`pg_default_acl`), because default
//! privileges are the part of a table grant that outlives the current
//! table population; that catalog holds one row per (owner, namespace,
//! object type), so a schema where several owners carry default
//! privileges yields several rows and the grantee's entry may live in any
//! of them. The owner shows up as the grantor of each entry.
//!
//! A vanished catalog row reads as absence here. Callers treat that as
//! "resource vanished", never as an error.

use sqlx::PgExecutor;

use crate::acl::codec::{self, AclEntry};
use crate::error::{Result, tx_err};

/// A fetched ACL row: the schema's current name plus the flattened blob.
/// The blob is `None` when the object has no explicit ACL at all.
#[derive(Debug, Clone)]
pub struct AclRow {
    pub schema: String,
    pub acl: Option<String>,
}

impl AclRow {
    /// The blob to decode; a missing ACL decodes like an empty one.
    pub fn blob(&self) -> &str {
        self.acl.as_deref().unwrap_or_default()
    }
}

/// Fetch the schema-level ACL for a namespace oid.
pub async fn schema_acl<'e, E: PgExecutor<'e>>(
    executor: E,
    namespace_id: &str,
) -> Result<Option<AclRow>> {
    let row: Option<(String, Option<String>)> = sqlx::query_as(
        "SELECT nspname, array_to_string(nspacl, '|') \
         FROM pg_namespace WHERE oid::text = $1",
    )
    .bind(namespace_id)
    .fetch_optional(executor)
    .await
    .map_err(tx_err("read schema acl"))?;

    Ok(row.map(|(schema, acl)| AclRow { schema, acl }))
}

/// Fetch every table default-privileges ACL row for a namespace. Each owner
/// holding default privileges there contributes one row; an empty vector
/// means no default privileges exist in the schema at all.
pub async fn default_table_acls<'e, E: PgExecutor<'e>>(
    executor: E,
    namespace_id: &str,
) -> Result<Vec<AclRow>> {
    let rows: Vec<(String, Option<String>)> = sqlx::query_as(
        "SELECT n.nspname, array_to_string(d.defaclacl, '|') \
         FROM pg_default_acl d \
         JOIN pg_namespace n ON n.oid = d.defaclnamespace \
         WHERE n.oid::text = $1 AND d.defaclobjtype = 'r'",
    )
    .bind(namespace_id)
    .fetch_all(executor)
    .await
    .map_err(tx_err("read default acl"))?;

    Ok(rows
        .into_iter()
        .map(|(schema, acl)| AclRow { schema, acl })
        .collect())
}

/// Pick the grantee's entry among fetched default-ACL rows. The grant
/// belongs to the row whose entry is granted by `owner`; rows contributed
/// by other owners are passed over even when they mention the same grantee.
pub fn select_default_entry<'a>(
    rows: &'a [AclRow],
    grantee_key: &str,
    owner: &str,
) -> Option<(&'a str, AclEntry)> {
    rows.iter().find_map(|row| {
        let entries = codec::parse_blob(row.blob());
        codec::find_entry(&entries, grantee_key, Some(owner))
            .cloned()
            .map(|entry| (row.schema.as_str(), entry))
    })
}
