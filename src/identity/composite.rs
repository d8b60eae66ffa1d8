//! The composite identifier is the only state this engine persists: a
//! delimiter-joined tuple of catalog-assigned numeric identities. Names can
//! be renamed out from under us; the numeric identities cannot.
//!
//! The ids are opaque strings end to end. The only operations ever performed
//! on them are equality, storage, and catalog lookup by literal value, so
//! parsing them as integers would buy nothing.

use std::fmt;

use crate::acl::TargetKind;
use crate::error::{Error, Result};

pub const DELIMITER: char = '-';

/// Persisted handle for one grant resource. Part order is fixed per kind:
/// `grantee-namespace` for schema grants, `grantee-namespace-owner` for
/// all-tables grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantId {
    Schema {
        grantee: String,
        namespace: String,
    },
    Table {
        grantee: String,
        namespace: String,
        owner: String,
    },
}

impl GrantId {
    pub fn kind(&self) -> TargetKind {
        match self {
            GrantId::Schema { .. } => TargetKind::Schema,
            GrantId::Table { .. } => TargetKind::AllTables,
        }
    }

    pub fn grantee(&self) -> &str {
        match self {
            GrantId::Schema { grantee, .. } | GrantId::Table { grantee, .. } => grantee,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            GrantId::Schema { namespace, .. } | GrantId::Table { namespace, .. } => namespace,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            GrantId::Schema { .. } => None,
            GrantId::Table { owner, .. } => Some(owner),
        }
    }

    /// Parse a raw identifier for the expected resource kind. The two-part
    /// and three-part forms must never be confused, so a count mismatch is
    /// always fatal.
    pub fn parse(kind: TargetKind, raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(DELIMITER).collect();
        let expected = match kind {
            TargetKind::Schema => 2,
            TargetKind::AllTables => 3,
        };

        if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::MalformedIdentifier {
                id: raw.to_string(),
                expected,
                found: parts.len(),
            });
        }

        Ok(match kind {
            TargetKind::Schema => GrantId::Schema {
                grantee: parts[0].to_string(),
                namespace: parts[1].to_string(),
            },
            TargetKind::AllTables => GrantId::Table {
                grantee: parts[0].to_string(),
                namespace: parts[1].to_string(),
                owner: parts[2].to_string(),
            },
        })
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantId::Schema { grantee, namespace } => {
                write!(f, "{grantee}{DELIMITER}{namespace}")
            }
            GrantId::Table {
                grantee,
                namespace,
                owner,
            } => write!(f, "{grantee}{DELIMITER}{namespace}{DELIMITER}{owner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_both_forms() {
        let schema_id = GrantId::Schema {
            grantee: "104".into(),
            namespace: "2200".into(),
        };
        let parsed = GrantId::parse(TargetKind::Schema, &schema_id.to_string()).unwrap();
        assert_eq!(parsed, schema_id);

        let table_id = GrantId::Table {
            grantee: "104".into(),
            namespace: "2200".into(),
            owner: "101".into(),
        };
        let parsed = GrantId::parse(TargetKind::AllTables, &table_id.to_string()).unwrap();
        assert_eq!(parsed, table_id);
        assert_eq!(parsed.to_string(), "104-2200-101");
    }

    #[test]
    fn part_count_mismatch_is_malformed() {
        let err = GrantId::parse(TargetKind::Schema, "104-2200-101").unwrap_err();
        match err {
            Error::MalformedIdentifier {
                expected, found, ..
            } => {
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(GrantId::parse(TargetKind::AllTables, "104-2200").is_err());
        assert!(GrantId::parse(TargetKind::Schema, "104").is_err());
    }

    #[test]
    fn empty_parts_are_malformed() {
        assert!(GrantId::parse(TargetKind::Schema, "-2200").is_err());
        assert!(GrantId::parse(TargetKind::AllTables, "104--101").is_err());
        assert!(GrantId::parse(TargetKind::Schema, "").is_err());
    }

    #[test]
    fn accessors_expose_parts() {
        let id = GrantId::parse(TargetKind::AllTables, "104-2200-101").unwrap();
        assert_eq!(id.grantee(), "104");
        assert_eq!(id.namespace(), "2200");
        assert_eq!(id.owner(), Some("101"));
        assert_eq!(id.kind(), TargetKind::AllTables);
    }
}
