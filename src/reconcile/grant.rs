//! The grant reconciliation state machine: Apply, Refresh, Destroy.
//!
//! Each operation is one transaction against the shared pool, executed
//! strictly in sequence and bounded by a deadline. A grant resource moves
//! `Absent -> Present` via apply, self-loops on refresh, and returns to
//! `Absent` via destroy or via refresh discovering the catalog row is gone.
//! No intermediate state is observable outside the transaction.

use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::acl::{PrivilegeSet, TargetKind, codec};
use crate::catalog;
use crate::error::{Error, Result, tx_err};
use crate::grant::{GrantSpec, GrantState, Grantee, GranteeKind, GrantTarget};
use crate::identity::{GrantId, resolver};

use super::plan::{self, Plan};
use super::{DEFAULT_TIMEOUT, absent_on_not_found, exec};

pub struct GrantReconciler<'a> {
    pool: &'a PgPool,
    timeout: Duration,
}

impl<'a> GrantReconciler<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(pool: &'a PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Converge the catalog to the desired grant and return the composite
    /// identifier. Revoke-then-grant plus the identity lookups all run in a
    /// single transaction; identities are resolved before the commit, so a
    /// failed resolution leaves the catalog exactly as it was.
    pub async fn apply(&self, spec: &GrantSpec) -> Result<GrantId> {
        // Validation happens before any transaction is opened.
        let plan = plan::apply_plan(spec)?;
        self.deadline(self.apply_tx(spec, plan)).await
    }

    /// Read back the observed state behind an identifier. `None` means the
    /// resource has vanished: an identity no longer resolves, the catalog
    /// row is gone, or the grantee no longer holds an ACL entry. All
    /// lookups share one transaction, so a concurrent rename or drop
    /// cannot tear the name resolution away from the ACL fetch.
    pub async fn refresh(
        &self,
        kind: GranteeKind,
        id: &GrantId,
    ) -> Result<Option<GrantState>> {
        self.deadline(self.refresh_tx(kind, id)).await
    }

    /// Revoke everything the grant controls. No identities are resolved;
    /// the identifier is being discarded.
    pub async fn destroy(&self, grantee: &Grantee, target: &GrantTarget) -> Result<()> {
        let plan = plan::revoke_plan(grantee, target);
        self.deadline(self.run_tx(plan)).await?;
        info!(
            grantee = grantee.name(),
            schema = target.schema(),
            "grant destroyed"
        );
        Ok(())
    }

    async fn apply_tx(&self, spec: &GrantSpec, plan: Plan) -> Result<GrantId> {
        let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;

        for statement in plan.statements() {
            exec(&mut tx, statement.step, &statement.sql).await?;
        }

        let grantee_id = match &spec.grantee {
            Grantee::User(name) => resolver::user_id(&mut *tx, name).await?,
            Grantee::Group(name) => resolver::group_id(&mut *tx, name).await?,
        };
        let namespace_id = resolver::namespace_id(&mut *tx, spec.target.schema()).await?;

        let id = match &spec.target {
            GrantTarget::Schema { .. } => GrantId::Schema {
                grantee: grantee_id,
                namespace: namespace_id,
            },
            GrantTarget::AllTables { owner, .. } => GrantId::Table {
                grantee: grantee_id,
                namespace: namespace_id,
                owner: resolver::user_id(&mut *tx, owner).await?,
            },
        };

        tx.commit().await.map_err(tx_err("commit"))?;
        info!(
            grantee = spec.grantee.name(),
            schema = spec.target.schema(),
            id = %id,
            "grant applied"
        );
        Ok(id)
    }

    async fn refresh_tx(&self, kind: GranteeKind, id: &GrantId) -> Result<Option<GrantState>> {
        let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
        let state = Self::refresh_in(&mut tx, kind, id).await?;
        tx.commit().await.map_err(tx_err("commit"))?;
        Ok(state)
    }

    async fn refresh_in(
        tx: &mut Transaction<'_, Postgres>,
        kind: GranteeKind,
        id: &GrantId,
    ) -> Result<Option<GrantState>> {
        let grantee_name = match kind {
            GranteeKind::User => {
                absent_on_not_found(resolver::user_name(&mut **tx, id.grantee()).await)?
            }
            GranteeKind::Group => {
                absent_on_not_found(resolver::group_name(&mut **tx, id.grantee()).await)?
            }
        };
        let Some(grantee_name) = grantee_name else {
            return Ok(None);
        };
        let grantee = Grantee::new(kind, grantee_name);

        match id {
            GrantId::Schema { namespace, .. } => {
                let Some(row) = catalog::schema_acl(&mut **tx, namespace).await? else {
                    return Ok(None);
                };

                let entries = codec::parse_blob(row.blob());
                let Some(entry) = codec::find_entry(&entries, &grantee.acl_key(), None) else {
                    return Ok(None);
                };

                Ok(Some(GrantState {
                    grantee,
                    schema: row.schema,
                    owner: None,
                    privileges: PrivilegeSet::decode(
                        &entry.permissions,
                        TargetKind::Schema,
                    ),
                }))
            }
            GrantId::Table {
                namespace, owner, ..
            } => {
                let owner_name =
                    absent_on_not_found(resolver::user_name(&mut **tx, owner).await)?;
                let Some(owner_name) = owner_name else {
                    return Ok(None);
                };

                // One default-ACL row per owner; the grant belongs to the
                // row whose entry this owner granted.
                let rows = catalog::default_table_acls(&mut **tx, namespace).await?;
                let Some((schema, entry)) =
                    catalog::select_default_entry(&rows, &grantee.acl_key(), &owner_name)
                else {
                    return Ok(None);
                };

                Ok(Some(GrantState {
                    grantee,
                    schema: schema.to_string(),
                    owner: Some(owner_name),
                    privileges: PrivilegeSet::decode(
                        &entry.permissions,
                        TargetKind::AllTables,
                    ),
                }))
            }
        }
    }

    async fn run_tx(&self, plan: Plan) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(tx_err("begin"))?;
        for statement in plan.statements() {
            exec(&mut tx, statement.step, &statement.sql).await?;
        }
        tx.commit().await.map_err(tx_err("commit"))
    }

    async fn deadline<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }
}
