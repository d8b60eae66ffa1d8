//! Schema reconciliation: create with optional authorization, rename,
//! ownership transfer, drop, read.

use std::time::Duration;

use sqlx::PgPool;
use tracing::info;

use crate::error::{Error, Result, tx_err};
use crate::identity::resolver;

use super::sql::quote_ident;
use super::{DEFAULT_TIMEOUT, exec};

/// Observed schema state: name and owning user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaState {
    pub name: String,
    pub owner: String,
}

pub struct SchemaReconciler<'a> {
    pool: &'a PgPool,
    timeout: Duration,
}

impl<'a> SchemaReconciler<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(pool: &'a PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Create the schema (idempotently) and return its namespace oid.
    pub async fn create(&self, name: &str, owner: Option<&str>) -> Result<String> {
        let mut sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(name));
        if let Some(owner) = owner {
            sql.push_str(&format!(" AUTHORIZATION {}", quote_ident(owner)));
        }

        let id = self
            .deadline(async {
                let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
                exec(&mut tx, "create schema", &sql).await?;
                let id = resolver::namespace_id(&mut *tx, name).await?;
                tx.commit().await.map_err(tx_err("commit"))?;
                Ok(id)
            })
            .await?;
        info!(schema = name, id, "schema created");
        Ok(id)
    }

    pub async fn rename(&self, old: &str, new: &str) -> Result<()> {
        let sql = format!(
            "ALTER SCHEMA {} RENAME TO {}",
            quote_ident(old),
            quote_ident(new)
        );
        self.run_one("rename schema", &sql).await?;
        info!(old, new, "schema renamed");
        Ok(())
    }

    pub async fn set_owner(&self, name: &str, owner: &str) -> Result<()> {
        let sql = format!(
            "ALTER SCHEMA {} OWNER TO {}",
            quote_ident(name),
            quote_ident(owner)
        );
        self.run_one("set schema owner", &sql).await?;
        info!(schema = name, owner, "schema owner changed");
        Ok(())
    }

    pub async fn destroy(&self, name: &str) -> Result<()> {
        let sql = format!("DROP SCHEMA {}", quote_ident(name));
        self.run_one("drop schema", &sql).await?;
        info!(schema = name, "schema dropped");
        Ok(())
    }

    /// Current name and owner behind a namespace oid, or `None` if the
    /// schema is gone.
    pub async fn read(&self, id: &str) -> Result<Option<SchemaState>> {
        self.deadline(async {
            let row: Option<(String, String)> = sqlx::query_as(
                "SELECT n.nspname, u.usename \
                 FROM pg_namespace n \
                 JOIN pg_user u ON u.usesysid = n.nspowner \
                 WHERE n.oid::text = $1",
            )
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(tx_err("read schema"))?;

            Ok(row.map(|(name, owner)| SchemaState { name, owner }))
        })
        .await
    }

    async fn run_one(&self, step: &'static str, sql: &str) -> Result<()> {
        self.deadline(async {
            let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
            exec(&mut tx, step, sql).await?;
            tx.commit().await.map_err(tx_err("commit"))
        })
        .await
    }

    async fn deadline<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }
}
