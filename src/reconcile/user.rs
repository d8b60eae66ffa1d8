//! User reconciliation: create, rename, password rotation, drop, read.
//!
//! Passwords arrive from the caller (ultimately a credential provider) and
//! are interpolated as escaped literals only; they are never logged.

use std::time::Duration;

use sqlx::PgPool;
use tracing::info;

use crate::error::{Error, Result, tx_err};
use crate::identity::resolver;

use super::sql::{quote_ident, quote_literal};
use super::{DEFAULT_TIMEOUT, absent_on_not_found, exec};

pub struct UserReconciler<'a> {
    pool: &'a PgPool,
    timeout: Duration,
}

impl<'a> UserReconciler<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(pool: &'a PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Create the user and return its durable `usesysid`, resolved inside
    /// the same transaction as the CREATE.
    pub async fn create(&self, name: &str, password: &str) -> Result<String> {
        let sql = format!(
            "CREATE USER {} WITH PASSWORD {}",
            quote_ident(name),
            quote_literal(password)
        );
        let id = self
            .deadline(async {
                let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
                exec(&mut tx, "create user", &sql).await?;
                let id = resolver::user_id(&mut *tx, name).await?;
                tx.commit().await.map_err(tx_err("commit"))?;
                Ok(id)
            })
            .await?;
        info!(user = name, id, "user created");
        Ok(id)
    }

    pub async fn rename(&self, old: &str, new: &str) -> Result<()> {
        let sql = format!(
            "ALTER USER {} RENAME TO {}",
            quote_ident(old),
            quote_ident(new)
        );
        self.run_one("rename user", &sql).await?;
        info!(old, new, "user renamed");
        Ok(())
    }

    pub async fn set_password(&self, name: &str, password: &str) -> Result<()> {
        let sql = format!(
            "ALTER USER {} PASSWORD {}",
            quote_ident(name),
            quote_literal(password)
        );
        self.run_one("set password", &sql).await?;
        info!(user = name, "password rotated");
        Ok(())
    }

    pub async fn destroy(&self, name: &str) -> Result<()> {
        let sql = format!("DROP USER {}", quote_ident(name));
        self.run_one("drop user", &sql).await?;
        info!(user = name, "user dropped");
        Ok(())
    }

    /// Current name behind a `usesysid`, or `None` if the user is gone.
    pub async fn read(&self, id: &str) -> Result<Option<String>> {
        self.deadline(async { absent_on_not_found(resolver::user_name(self.pool, id).await) })
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
