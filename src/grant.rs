//! Domain types for grant resources: who receives privileges, on what, and
//! the desired/observed privilege sets.

use crate::acl::{PrivilegeSet, TargetKind};

/// The principal receiving privileges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    User(String),
    Group(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GranteeKind {
    User,
    Group,
}

impl Grantee {
    pub fn new(kind: GranteeKind, name: impl Into<String>) -> Self {
        match kind {
            GranteeKind::User => Grantee::User(name.into()),
            GranteeKind::Group => Grantee::Group(name.into()),
        }
    }

    pub fn kind(&self) -> GranteeKind {
        match self {
            Grantee::User(_) => GranteeKind::User,
            Grantee::Group(_) => GranteeKind::Group,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Grantee::User(name) | Grantee::Group(name) => name,
        }
    }

    /// The key this grantee appears under in a packed ACL entry. Groups are
    /// keyed with a `group ` prefix.
    pub fn acl_key(&self) -> String {
        match self {
            Grantee::User(name) => name.clone(),
            Grantee::Group(name) => format!("group {name}"),
        }
    }
}

/// What the grant applies to. The owner of future objects lives inside the
/// all-tables variant, so owner-bearing and owner-less grants cannot be
/// mixed up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantTarget {
    /// Privileges on the schema object itself (USAGE, CREATE).
    Schema { schema: String },
    /// Privileges on every table in a schema, plus the matching default
    /// privileges for tables `owner` creates later.
    AllTables { schema: String, owner: String },
}

impl GrantTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            GrantTarget::Schema { .. } => TargetKind::Schema,
            GrantTarget::AllTables { .. } => TargetKind::AllTables,
        }
    }

    pub fn schema(&self) -> &str {
        match self {
            GrantTarget::Schema { schema } | GrantTarget::AllTables { schema, .. } => schema,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            GrantTarget::Schema { .. } => None,
            GrantTarget::AllTables { owner, .. } => Some(owner),
        }
    }
}

/// Desired state for one grant resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSpec {
    pub grantee: Grantee,
    pub target: GrantTarget,
    pub privileges: PrivilegeSet,
}

/// Observed state read back from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantState {
    pub grantee: Grantee,
    pub schema: String,
    pub owner: Option<String>,
    pub privileges: PrivilegeSet,
}
