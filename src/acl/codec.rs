//! Tokenizer for the packed ACL blob.
//!
//! The catalog hands us all entries for one object flattened into a single
//! string, one `grantee=permissions/grantor` entry per array element, with
//! elements joined by `|`. Grantee and grantor names may be double-quoted
//! when they contain special characters, with embedded quotes doubled.
//!
//! Matching is exact key equality over the parsed entries, never substring
//! or pattern matching against the flattened string, so a grantee named
//! `alice` can never pick up the entry of `malice`, and names containing
//! delimiter or metacharacters cannot corrupt a lookup.

use tracing::warn;

use super::privilege::{PrivilegeSet, TargetKind};

/// One parsed `grantee=permissions/grantor` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    /// Grantee key: a user name, `group <name>` for groups, or empty for
    /// the PUBLIC pseudo-grantee.
    pub grantee: String,
    /// Raw permission-letter run, grant-option markers included.
    pub permissions: String,
    pub grantor: String,
}

/// Parse the flattened blob into its entries. Entries that do not match the
/// grammar are skipped; an engine-side encoding surprise should not make the
/// whole object unreadable.
pub fn parse_blob(blob: &str) -> Vec<AclEntry> {
    let mut entries = Vec::new();

    for raw in split_elements(blob) {
        if raw.is_empty() {
            continue;
        }
        match parse_entry(&raw) {
            Some(entry) => entries.push(entry),
            None => warn!(entry = %raw, "skipping unparseable ACL entry"),
        }
    }

    entries
}

/// Locate the entry for a grantee key, optionally constrained to a specific
/// grantor (default-privilege reads key on the owner as grantor).
pub fn find_entry<'a>(
    entries: &'a [AclEntry],
    grantee_key: &str,
    grantor: Option<&str>,
) -> Option<&'a AclEntry> {
    entries
        .iter()
        .find(|e| e.grantee == grantee_key && grantor.is_none_or(|g| e.grantor == g))
}

/// Decode the privilege set held by `grantee_key` in the blob. A grantee
/// with no entry decodes to the empty set; "object not found" is signalled
/// one layer up by the catalog reader, not here.
pub fn decode(
    blob: &str,
    grantee_key: &str,
    grantor: Option<&str>,
    kind: TargetKind,
) -> PrivilegeSet {
    let entries = parse_blob(blob);
    match find_entry(&entries, grantee_key, grantor) {
        Some(entry) => PrivilegeSet::decode(&entry.permissions, kind),
        None => PrivilegeSet::new(),
    }
}

/// Split the blob on `|`, honoring quoted names that may themselves contain
/// the element separator.
fn split_elements(blob: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in blob.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '|' if !in_quotes => {
                elements.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    elements.push(current);

    elements
}

/// Parse one `grantee=permissions/grantor` element, resolving quoting in
/// the name positions.
fn parse_entry(element: &str) -> Option<AclEntry> {
    let mut chars = element.chars().peekable();

    // Grantee runs to the first '=' outside quotes.
    let mut grantee = String::new();
    let mut in_quotes = false;
    loop {
        match chars.next()? {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    grantee.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            '=' if !in_quotes => break,
            c => grantee.push(c),
        }
    }

    // Permission letters run to the '/'.
    let mut permissions = String::new();
    loop {
        match chars.next()? {
            '/' => break,
            c => permissions.push(c),
        }
    }

    // Grantor is the remainder.
    let mut grantor = String::new();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    grantor.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            c => grantor.push(c),
        }
    }

    Some(AclEntry {
        grantee,
        permissions,
        grantor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::privilege::Privilege;

    #[test]
    fn parses_user_and_group_entries() {
        let blob = "alice=UC/admin|group readers=U/admin";
        let entries = parse_blob(blob);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].grantee, "alice");
        assert_eq!(entries[0].permissions, "UC");
        assert_eq!(entries[0].grantor, "admin");
        assert_eq!(entries[1].grantee, "group readers");
    }

    #[test]
    fn decode_returns_empty_set_for_missing_grantee() {
        let blob = "alice=UC/admin";
        let set = decode(blob, "bob", None, TargetKind::Schema);
        assert!(set.is_empty());
        assert!(decode("", "bob", None, TargetKind::Schema).is_empty());
    }

    #[test]
    fn decode_never_matches_name_substrings() {
        // `alice` is a substring of both neighbors; exact matching must not
        // pick either of them up.
        let blob = "malice=UC/admin|alice2=C/admin";
        assert!(decode(blob, "alice", None, TargetKind::Schema).is_empty());

        let blob = "alice=U/admin|malice=UC/admin";
        let set = decode(blob, "alice", None, TargetKind::Schema);
        assert!(set.contains(Privilege::Usage));
        assert!(!set.contains(Privilege::Create));
    }

    #[test]
    fn decode_is_inert_to_metacharacters_in_names() {
        let blob = r"a.c*=UC/admin|a\b=C/admin";
        let set = decode(blob, "a.c*", None, TargetKind::Schema);
        assert_eq!(set.encode(TargetKind::Schema), "UC");
        assert!(decode(blob, "a.c", None, TargetKind::Schema).is_empty());
    }

    #[test]
    fn quoted_names_resolve() {
        let blob = r#""odd name"=UC/"odd owner""#;
        let entries = parse_blob(blob);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].grantee, "odd name");
        assert_eq!(entries[0].grantor, "odd owner");
    }

    #[test]
    fn quoted_name_may_contain_separator() {
        let blob = r#""a|b"=U/admin|carol=C/admin"#;
        let entries = parse_blob(blob);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].grantee, "a|b");
        assert_eq!(entries[1].grantee, "carol");
    }

    #[test]
    fn grantor_constraint_distinguishes_owners() {
        // Same grantee, different grantors: default-privilege reads must
        // only see the entry keyed by the owning principal.
        let blob = "alice=r/etl_bot|alice=rawd/other_owner";
        let set = decode(blob, "alice", Some("etl_bot"), TargetKind::AllTables);
        assert_eq!(set.encode(TargetKind::AllTables), "r");

        let set = decode(blob, "alice", Some("nobody"), TargetKind::AllTables);
        assert!(set.is_empty());
    }

    #[test]
    fn public_entry_has_empty_grantee() {
        let blob = "=U/admin|alice=UC/admin";
        let entries = parse_blob(blob);
        assert_eq!(entries[0].grantee, "");
        let set = decode(blob, "", None, TargetKind::Schema);
        assert!(set.contains(Privilege::Usage));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let blob = "garbage|alice=UC/admin|also-garbage";
        let entries = parse_blob(blob);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].grantee, "alice");
    }

    #[test]
    fn grant_option_markers_do_not_disturb_decode() {
        let blob = "alice=r*a/admin";
        let set = decode(blob, "alice", None, TargetKind::AllTables);
        assert!(set.contains(Privilege::Select));
        assert!(set.contains(Privilege::Insert));
        assert_eq!(set.len(), 2);
    }
}
