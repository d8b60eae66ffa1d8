//! Pure statement planning for grant reconciliation.
//!
//! Every apply is an unconditional reset: REVOKE ALL, then GRANT exactly the
//! declared set. There is no old-vs-new diffing, which makes the operation
//! convergent regardless of how far the live ACLs have drifted. Planning is
//! side-effect free; execution order is the vector order.

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::grant::{GrantSpec, Grantee, GrantTarget};

use super::sql::{grantee_ref, quote_ident};

/// One SQL statement, labelled with the step name used in error wrapping
/// and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub step: &'static str,
    pub sql: String,
}

impl Statement {
    fn new(step: &'static str, sql: String) -> Self {
        Self { step, sql }
    }
}

/// An ordered statement sequence for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    statements: Vec<Statement>,
}

impl Plan {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    fn push(&mut self, step: &'static str, sql: String) {
        self.statements.push(Statement::new(step, sql));
    }
}

/// Build the revoke-then-grant sequence for a desired grant. Fails with a
/// validation error, before any SQL text exists, if the privilege set is
/// empty or strays outside the target kind's vocabulary.
pub fn apply_plan(spec: &GrantSpec) -> Result<Plan> {
    let kind = spec.target.kind();
    spec.privileges.validate_for(kind)?;
    if spec.privileges.is_empty() {
        return Err(Error::Validation(
            "a grant must carry at least one privilege".to_string(),
        ));
    }

    let mut plan = revoke_plan(&spec.grantee, &spec.target);

    let grantee = grantee_ref(&spec.grantee);
    let schema = quote_ident(spec.target.schema());
    let privileges = spec.privileges.keywords(kind).iter().join(",");

    match &spec.target {
        GrantTarget::Schema { .. } => {
            plan.push(
                "grant privileges",
                format!("GRANT {privileges} ON SCHEMA {schema} TO {grantee}"),
            );
        }
        GrantTarget::AllTables { owner, .. } => {
            let owner = quote_ident(owner);
            plan.push(
                "grant privileges",
                format!("GRANT {privileges} ON ALL TABLES IN SCHEMA {schema} TO {grantee}"),
            );
            plan.push(
                "grant default privileges",
                format!(
                    "ALTER DEFAULT PRIVILEGES FOR USER {owner} IN SCHEMA {schema} \
                     GRANT {privileges} ON TABLES TO {grantee}"
                ),
            );
        }
    }

    Ok(plan)
}

/// Build the revoke-only sequence used by destroy, and as the head of every
/// apply. REVOKE always precedes GRANT so a privilege dropped from the
/// desired set can never survive an apply.
pub fn revoke_plan(grantee: &Grantee, target: &GrantTarget) -> Plan {
    let mut plan = Plan::default();
    let grantee = grantee_ref(grantee);
    let schema = quote_ident(target.schema());

    match target {
        GrantTarget::Schema { .. } => {
            plan.push(
                "revoke privileges",
                format!("REVOKE ALL ON SCHEMA {schema} FROM {grantee} CASCADE"),
            );
        }
        GrantTarget::AllTables { owner, .. } => {
            let owner = quote_ident(owner);
            plan.push(
                "revoke privileges",
                format!("REVOKE ALL ON ALL TABLES IN SCHEMA {schema} FROM {grantee} CASCADE"),
            );
            plan.push(
                "revoke default privileges",
                format!(
                    "ALTER DEFAULT PRIVILEGES FOR USER {owner} IN SCHEMA {schema} \
                     REVOKE ALL ON TABLES FROM {grantee}"
                ),
            );
        }
    }

    plan
}
