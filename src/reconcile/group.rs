//! Group reconciliation: create with members, rename, membership
//! replacement, drop, read.

use std::time::Duration;

use itertools::Itertools;
use sqlx::PgPool;
use tracing::info;

use crate::error::{Error, Result, tx_err};
use crate::identity::resolver;

use super::sql::quote_ident;
use super::{DEFAULT_TIMEOUT, absent_on_not_found, exec};

/// Observed group state: name plus current member user names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupState {
    pub name: String,
    pub members: Vec<String>,
}

pub struct GroupReconciler<'a> {
    pool: &'a PgPool,
    timeout: Duration,
}

impl<'a> GroupReconciler<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(pool: &'a PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Create the group, optionally seeded with members, and return its
    /// durable `grosysid`.
    pub async fn create(&self, name: &str, members: &[String]) -> Result<String> {
        let mut sql = format!("CREATE GROUP {}", quote_ident(name));
        if !members.is_empty() {
            sql.push_str(&format!(" WITH USER {}", ident_list(members)));
        }

        let id = self
            .deadline(async {
                let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
                exec(&mut tx, "create group", &sql).await?;
                let id = resolver::group_id(&mut *tx, name).await?;
                tx.commit().await.map_err(tx_err("commit"))?;
                Ok(id)
            })
            .await?;
        info!(group = name, id, "group created");
        Ok(id)
    }

    pub async fn rename(&self, old: &str, new: &str) -> Result<()> {
        let sql = format!(
            "ALTER GROUP {} RENAME TO {}",
            quote_ident(old),
            quote_ident(new)
        );
        self.deadline(async {
            let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
            exec(&mut tx, "rename group", &sql).await?;
            tx.commit().await.map_err(tx_err("commit"))
        })
        .await?;
        info!(old, new, "group renamed");
        Ok(())
    }

    /// Replace the membership wholesale: drop every current member, add
    /// every desired one, in one transaction.
    pub async fn replace_members(
        &self,
        name: &str,
        current: &[String],
        desired: &[String],
    ) -> Result<()> {
        let group = quote_ident(name);
        self.deadline(async {
            let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
            if !current.is_empty() {
                let sql = format!("ALTER GROUP {group} DROP USER {}", ident_list(current));
                exec(&mut tx, "drop members", &sql).await?;
            }
            if !desired.is_empty() {
                let sql = format!("ALTER GROUP {group} ADD USER {}", ident_list(desired));
                exec(&mut tx, "add members", &sql).await?;
            }
            tx.commit().await.map_err(tx_err("commit"))
        })
        .await?;
        info!(group = name, members = desired.len(), "membership replaced");
        Ok(())
    }

    pub async fn destroy(&self, name: &str) -> Result<()> {
        let sql = format!("DROP GROUP {}", quote_ident(name));
        self.deadline(async {
            let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
            exec(&mut tx, "drop group", &sql).await?;
            tx.commit().await.map_err(tx_err("commit"))
        })
        .await?;
        info!(group = name, "group dropped");
        Ok(())
    }

    /// Current name and membership behind a `grosysid`, or `None` if the
    /// group is gone.
    pub async fn read(&self, id: &str) -> Result<Option<GroupState>> {
        self.deadline(async {
            let name = absent_on_not_found(resolver::group_name(self.pool, id).await)?;
            let Some(name) = name else {
                return Ok(None);
            };

            let members: Vec<String> = sqlx::query_scalar(
                "SELECT u.usename FROM pg_group g \
                 JOIN pg_user u ON u.usesysid = ANY(g.grolist) \
                 WHERE g.grosysid::text = $1 \
                 ORDER BY u.usename",
            )
            .bind(id)
            .fetch_all(self.pool)
            .await
            .map_err(tx_err("read group members"))?;

            Ok(Some(GroupState { name, members }))
        })
        .await
    }

    async fn deadline<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }
}

fn ident_list(names: &[String]) -> String {
    names.iter().map(|n| quote_ident(n)).join(",")
}
