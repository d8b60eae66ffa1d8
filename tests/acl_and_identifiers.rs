//! Codec and identifier properties through the public API.

use redgrant::acl::{Privilege, PrivilegeSet, TargetKind, decode};
use redgrant::catalog::{AclRow, select_default_entry};
use redgrant::error::Error;
use redgrant::identity::GrantId;
use rstest::rstest;

#[rstest]
#[case::usage_only(&[Privilege::Usage], TargetKind::Schema)]
#[case::schema_full(&[Privilege::Usage, Privilege::Create], TargetKind::Schema)]
#[case::select_insert(&[Privilege::Select, Privilege::Insert], TargetKind::AllTables)]
#[case::table_full(
    &[Privilege::Select, Privilege::Insert, Privilege::Update, Privilege::Delete, Privilege::References],
    TargetKind::AllTables
)]
fn encode_is_stable_through_decode(#[case] set: &[Privilege], #[case] kind: TargetKind) {
    let set: PrivilegeSet = set.iter().copied().collect();
    let encoded = set.encode(kind);
    let decoded = PrivilegeSet::decode(&encoded, kind);
    assert_eq!(decoded.encode(kind), encoded);
    assert_eq!(decoded, set);
}

#[test]
fn decode_reads_the_catalog_blob_shape() {
    // nspacl as the catalog flattens it: one entry per grantee
    let blob = "admin=UC/admin|group readers=U/admin|alice=C/admin";

    let readers = decode(blob, "group readers", None, TargetKind::Schema);
    assert_eq!(readers.encode(TargetKind::Schema), "U");

    let alice = decode(blob, "alice", None, TargetKind::Schema);
    assert_eq!(alice.encode(TargetKind::Schema), "C");
}

#[test]
fn default_acl_read_is_keyed_by_owner_as_grantor() {
    let blob = "alice=ra/etl_bot|alice=rawdx/admin";

    let through_owner = decode(blob, "alice", Some("etl_bot"), TargetKind::AllTables);
    assert_eq!(through_owner.encode(TargetKind::AllTables), "ra");

    // An entry granted by someone else is a different resource
    let through_admin = decode(blob, "alice", Some("admin"), TargetKind::AllTables);
    assert_eq!(through_admin.encode(TargetKind::AllTables), "rawdx");
}

#[test]
fn default_entry_is_found_across_owner_rows() {
    // pg_default_acl holds one row per owner with default privileges in
    // the schema; the grantee's entry may live in any of them
    let rows = vec![
        AclRow {
            schema: "analytics".into(),
            acl: Some("bob=arwdx/other_owner".into()),
        },
        AclRow {
            schema: "analytics".into(),
            acl: Some("alice=ra/etl_bot".into()),
        },
    ];

    let (schema, entry) = select_default_entry(&rows, "alice", "etl_bot").unwrap();
    assert_eq!(schema, "analytics");
    let set = PrivilegeSet::decode(&entry.permissions, TargetKind::AllTables);
    assert_eq!(set.encode(TargetKind::AllTables), "ra");
}

#[test]
fn default_entry_ignores_other_owners_rows_for_same_grantee() {
    // Another owner granting to the same grantee is a different resource
    let rows = vec![AclRow {
        schema: "analytics".into(),
        acl: Some("alice=rawdx/other_owner".into()),
    }];
    assert!(select_default_entry(&rows, "alice", "etl_bot").is_none());
}

#[test]
fn destroyed_grant_reads_as_absent() {
    // After a revoke the owner's row may survive with other grantees only,
    // or disappear entirely; both must read as absent
    let surviving_row = vec![AclRow {
        schema: "analytics".into(),
        acl: Some("bob=r/etl_bot".into()),
    }];
    assert!(select_default_entry(&surviving_row, "alice", "etl_bot").is_none());
    assert!(select_default_entry(&[], "alice", "etl_bot").is_none());
}

#[test]
fn hostile_grantee_names_cannot_borrow_privileges() {
    // "readers" vs a group whose name embeds it plus metacharacters
    let blob = "group readers=UC/admin|group readers.*=U/admin";
    let exact = decode(blob, "group readers", None, TargetKind::Schema);
    assert_eq!(exact.encode(TargetKind::Schema), "UC");

    let weird = decode(blob, "group readers.*", None, TargetKind::Schema);
    assert_eq!(weird.encode(TargetKind::Schema), "U");
}

#[test]
fn identifier_round_trip_both_kinds() {
    for (kind, raw) in [
        (TargetKind::Schema, "104-2200"),
        (TargetKind::AllTables, "104-2200-101"),
    ] {
        let id = GrantId::parse(kind, raw).unwrap();
        assert_eq!(id.to_string(), raw);
        assert_eq!(GrantId::parse(kind, &id.to_string()).unwrap(), id);
    }
}

#[rstest]
#[case::too_many(TargetKind::Schema, "1-2-3", 2, 3)]
#[case::too_few(TargetKind::AllTables, "1-2", 3, 2)]
#[case::single(TargetKind::Schema, "12", 2, 1)]
fn identifier_arity_is_enforced(
    #[case] kind: TargetKind,
    #[case] raw: &str,
    #[case] expected: usize,
    #[case] found: usize,
) {
    match GrantId::parse(kind, raw) {
        Err(Error::MalformedIdentifier {
            expected: e,
            found: f,
            ..
        }) => {
            assert_eq!(e, expected);
            assert_eq!(f, found);
        }
        other => panic!("expected malformed identifier, got {other:?}"),
    }
}
