use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Error, Result};

/// A named privilege, paired with its single-letter code in the packed ACL
/// encoding. The letter mapping is catalog-defined and version-specific;
/// this table matches the Redshift/PostgreSQL `aclitem` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    Usage,
    Create,
    Select,
    Insert,
    Update,
    Delete,
    References,
}

impl Privilege {
    /// The SQL keyword used in GRANT/REVOKE statements.
    pub fn keyword(self) -> &'static str {
        match self {
            Privilege::Usage => "USAGE",
            Privilege::Create => "CREATE",
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::References => "REFERENCES",
        }
    }

    /// The permission letter inside a packed ACL entry.
    pub fn letter(self) -> char {
        match self {
            Privilege::Usage => 'U',
            Privilege::Create => 'C',
            Privilege::Select => 'r',
            Privilege::Insert => 'a',
            Privilege::Update => 'w',
            Privilege::Delete => 'd',
            Privilege::References => 'x',
        }
    }

    /// Parse a privilege keyword, case-insensitively.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "USAGE" => Some(Privilege::Usage),
            "CREATE" => Some(Privilege::Create),
            "SELECT" => Some(Privilege::Select),
            "INSERT" => Some(Privilege::Insert),
            "UPDATE" => Some(Privilege::Update),
            "DELETE" => Some(Privilege::Delete),
            "REFERENCES" => Some(Privilege::References),
            _ => None,
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// What a grant applies to: a schema itself, or every table in a schema
/// (present and, through default privileges, future).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TargetKind {
    Schema,
    AllTables,
}

impl TargetKind {
    /// The privilege vocabulary for this target kind, in canonical encode
    /// order. Encoding always emits letters in this order, so two sets with
    /// the same members encode identically.
    pub fn vocabulary(self) -> &'static [Privilege] {
        match self {
            TargetKind::Schema => &[Privilege::Usage, Privilege::Create],
            TargetKind::AllTables => &[
                Privilege::Select,
                Privilege::Insert,
                Privilege::Update,
                Privilege::Delete,
                Privilege::References,
            ],
        }
    }
}

/// An unordered set of privileges. Validity against a target kind's
/// vocabulary is checked at the reconciliation boundary, not on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeSet {
    privileges: BTreeSet<Privilege>,
}

impl PrivilegeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, privilege: Privilege) {
        self.privileges.insert(privilege);
    }

    pub fn contains(&self, privilege: Privilege) -> bool {
        self.privileges.contains(&privilege)
    }

    pub fn is_empty(&self) -> bool {
        self.privileges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.privileges.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Privilege> + '_ {
        self.privileges.iter().copied()
    }

    /// Reject any privilege outside the target kind's vocabulary. A schema
    /// grant carrying SELECT is a caller bug, surfaced before any SQL runs.
    pub fn validate_for(&self, kind: TargetKind) -> Result<()> {
        let vocabulary = kind.vocabulary();
        for privilege in self.iter() {
            if !vocabulary.contains(&privilege) {
                return Err(Error::Validation(format!(
                    "privilege {privilege} is not valid for {kind:?} grants"
                )));
            }
        }
        Ok(())
    }

    /// Pack the set into its permission-letter run, in canonical order.
    pub fn encode(&self, kind: TargetKind) -> String {
        kind.vocabulary()
            .iter()
            .filter(|p| self.contains(**p))
            .map(|p| p.letter())
            .collect()
    }

    /// Unpack a permission-letter run by testing membership of each letter
    /// in the target kind's vocabulary. Unknown letters are ignored; the
    /// packed encoding carries letters (e.g. ownership markers) this engine
    /// does not manage.
    pub fn decode(letters: &str, kind: TargetKind) -> Self {
        let mut set = Self::new();
        for privilege in kind.vocabulary() {
            if letters.contains(privilege.letter()) {
                set.insert(*privilege);
            }
        }
        set
    }

    /// SQL keywords for the contained privileges, in canonical order.
    /// Used to render GRANT statement privilege lists.
    pub fn keywords(&self, kind: TargetKind) -> Vec<&'static str> {
        kind.vocabulary()
            .iter()
            .filter(|p| self.contains(**p))
            .map(|p| p.keyword())
            .collect()
    }
}

impl FromIterator<Privilege> for PrivilegeSet {
    fn from_iter<I: IntoIterator<Item = Privilege>>(iter: I) -> Self {
        Self {
            privileges: iter.into_iter().collect(),
        }
    }
}
