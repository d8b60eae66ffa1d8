//! End-to-end planning behavior through the public API: the exact SQL a
//! reconciliation would send, for every grantee/target combination.

use redgrant::acl::{Privilege, PrivilegeSet};
use redgrant::error::Error;
use redgrant::grant::{GrantSpec, GrantTarget, Grantee};
use redgrant::reconcile::plan::{apply_plan, revoke_plan};
use rstest::rstest;

fn privileges(list: &[Privilege]) -> PrivilegeSet {
    list.iter().copied().collect()
}

#[test]
fn schema_group_grant_matches_catalog_dialect() {
    let spec = GrantSpec {
        grantee: Grantee::Group("readers".into()),
        target: GrantTarget::Schema {
            schema: "analytics".into(),
        },
        privileges: privileges(&[Privilege::Usage]),
    };

    let sql: Vec<String> = apply_plan(&spec)
        .unwrap()
        .statements()
        .iter()
        .map(|s| s.sql.clone())
        .collect();

    assert_eq!(
        sql,
        vec![
            "REVOKE ALL ON SCHEMA \"analytics\" FROM GROUP \"readers\" CASCADE".to_string(),
            "GRANT USAGE ON SCHEMA \"analytics\" TO GROUP \"readers\"".to_string(),
        ]
    );
}

#[test]
fn table_user_grant_issues_both_grant_clauses() {
    let spec = GrantSpec {
        grantee: Grantee::User("alice".into()),
        target: GrantTarget::AllTables {
            schema: "analytics".into(),
            owner: "etl_bot".into(),
        },
        privileges: privileges(&[Privilege::Select, Privilege::Insert]),
    };

    let plan = apply_plan(&spec).unwrap();
    let sql: Vec<&str> = plan.statements().iter().map(|s| s.sql.as_str()).collect();

    assert_eq!(sql.len(), 4);
    assert!(sql[2].starts_with("GRANT SELECT,INSERT ON ALL TABLES"));
    assert!(sql[3].contains("ALTER DEFAULT PRIVILEGES FOR USER \"etl_bot\""));
    assert!(sql[3].contains("GRANT SELECT,INSERT ON TABLES TO \"alice\""));
}

#[rstest]
#[case::user(Grantee::User("alice".into()), "\"alice\"")]
#[case::group(Grantee::Group("readers".into()), "GROUP \"readers\"")]
fn grantee_rendering_is_kind_aware(#[case] grantee: Grantee, #[case] rendered: &str) {
    let spec = GrantSpec {
        grantee,
        target: GrantTarget::Schema {
            schema: "sales".into(),
        },
        privileges: privileges(&[Privilege::Usage, Privilege::Create]),
    };

    for statement in apply_plan(&spec).unwrap().statements() {
        assert!(
            statement.sql.contains(rendered),
            "{} missing {rendered}",
            statement.sql
        );
    }
}

#[test]
fn empty_privilege_set_is_rejected_with_no_grant_statement() {
    let spec = GrantSpec {
        grantee: Grantee::User("alice".into()),
        target: GrantTarget::AllTables {
            schema: "analytics".into(),
            owner: "etl_bot".into(),
        },
        privileges: PrivilegeSet::new(),
    };

    match apply_plan(&spec) {
        Err(Error::Validation(message)) => {
            assert!(message.contains("at least one privilege"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn apply_planning_is_idempotent() {
    let spec = GrantSpec {
        grantee: Grantee::Group("writers".into()),
        target: GrantTarget::AllTables {
            schema: "staging".into(),
            owner: "loader".into(),
        },
        privileges: privileges(&[
            Privilege::Select,
            Privilege::Insert,
            Privilege::Update,
            Privilege::Delete,
            Privilege::References,
        ]),
    };

    let first = apply_plan(&spec).unwrap();
    let second = apply_plan(&spec).unwrap();
    assert_eq!(first, second);
}

#[test]
fn destroy_only_revokes() {
    let grantee = Grantee::Group("readers".into());
    let target = GrantTarget::AllTables {
        schema: "analytics".into(),
        owner: "etl_bot".into(),
    };

    let plan = revoke_plan(&grantee, &target);
    assert_eq!(plan.statements().len(), 2);
    for statement in plan.statements() {
        assert!(statement.sql.contains("REVOKE ALL"));
        assert!(!statement.sql.contains(" GRANT "));
    }
}
