//! Named rule and action resolution across whole documents.

use serde_json::{Value, json};

use modsieve::config::{ActionEntry, RuleEntry, parse_document, resolve};
use modsieve::{CheckDefinition, ModsieveError};

fn checks(value: Value) -> Vec<CheckDefinition> {
    serde_json::from_value(value).unwrap()
}

fn rule_names(entries: &[RuleEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| match e {
            RuleEntry::Rule(r) => r.name.clone().unwrap_or_else(|| r.kind.clone()),
            RuleEntry::Set(_) => "set".into(),
            RuleEntry::Reference(name) => format!("ref:{name}"),
        })
        .collect()
}

#[test]
fn references_are_replaced_by_definitions() {
    let resolved = resolve(checks(json!([
        {
            "name": "first",
            "kind": "submission",
            "rules": [{"kind": "regex", "name": "Spam", "pattern": "buy now"}],
            "actions": [{"kind": "remove", "name": "nuke"}]
        },
        {
            "name": "second",
            "kind": "comment",
            "rules": ["spam", {"condition": "OR", "rules": [" SPAM "]}],
            "actions": ["NUKE"]
        }
    ])))
    .unwrap();

    let second = &resolved[1];
    assert_eq!(rule_names(&second.rules), ["Spam", "set"]);
    match &second.rules[1] {
        RuleEntry::Set(set) => assert_eq!(rule_names(&set.rules), ["Spam"]),
        other => panic!("expected set, got {other:?}"),
    }
    match &second.actions[0] {
        ActionEntry::Action(a) => assert_eq!(a.kind, "remove"),
        other => panic!("expected action, got {other:?}"),
    }
}

#[test]
fn forward_references_resolve() {
    let resolved = resolve(checks(json!([
        {"name": "early", "kind": "submission", "rules": ["later"]},
        {"name": "late", "kind": "submission", "rules": [{"kind": "author", "name": "later", "include": []}]}
    ])))
    .unwrap();
    assert_eq!(rule_names(&resolved[0].rules), ["later"]);
}

#[test]
fn identical_duplicates_are_accepted() {
    let def = json!({"kind": "regex", "name": "dup", "pattern": "x"});
    let resolved = resolve(checks(json!([
        {"name": "a", "kind": "submission", "rules": [def.clone()]},
        {"name": "b", "kind": "submission", "rules": [def, "DUP"]}
    ])))
    .unwrap();
    assert_eq!(resolved[1].rules.len(), 2);
}

#[test]
fn conflicting_duplicates_name_the_offender() {
    let err = resolve(checks(json!([
        {"name": "a", "kind": "submission", "rules": [{"kind": "regex", "name": "dup", "pattern": "x"}]},
        {"name": "b", "kind": "submission", "rules": [
            {"condition": "AND", "rules": [{"kind": "regex", "name": "Dup", "pattern": "y"}]}
        ]}
    ])))
    .unwrap_err();

    match err {
        ModsieveError::DuplicateName { kind, name } => {
            assert_eq!(kind, "rule");
            assert_eq!(name, "Dup");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_actions_conflict_too() {
    let err = resolve(checks(json!([
        {"name": "a", "kind": "submission", "actions": [{"kind": "remove", "name": "x"}]},
        {"name": "b", "kind": "submission", "actions": [{"kind": "lock", "name": "X"}]}
    ])))
    .unwrap_err();
    assert!(matches!(err, ModsieveError::DuplicateName { kind: "action", .. }));
}

#[test]
fn unresolved_reference_names_the_missing_rule() {
    let err = resolve(checks(json!([
        {"name": "a", "kind": "submission", "rules": [{"condition": "OR", "rules": ["ghost"]}]}
    ])))
    .unwrap_err();

    match err {
        ModsieveError::UnresolvedReference { kind, name } => {
            assert_eq!(kind, "rule");
            assert_eq!(name, "ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn resolution_is_idempotent_and_preserves_order() {
    let input = checks(json!([
        {
            "name": "a",
            "kind": "submission",
            "condition": "OR",
            "rules": [
                {"kind": "regex", "name": "one", "pattern": "1"},
                {"kind": "regex", "pattern": "2"},
                {"condition": "AND", "rules": ["one", {"kind": "author", "include": []}]}
            ]
        },
        {"name": "b", "kind": "comment", "rules": ["one"]}
    ]));

    let once = resolve(input).unwrap();
    let twice = resolve(once.clone()).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once[0].name, "a");
    assert_eq!(once[1].name, "b");
    assert_eq!(rule_names(&once[0].rules), ["one", "regex", "set"]);
}

#[test]
fn passthrough_members_survive() {
    let config = parse_document(
        &json!({
            "version": 3,
            "checks": [{
                "name": "a",
                "kind": "submission",
                "polling": ["unmoderated"],
                "rules": []
            }]
        })
        .to_string(),
    )
    .unwrap();

    assert_eq!(config.extra.get("version"), Some(&json!(3)));
    assert_eq!(config.checks[0].extra.get("polling"), Some(&json!(["unmoderated"])));
}

#[test]
fn document_errors_surface_from_parse() {
    let err = parse_document(r#"{"checks": [{"name": "a", "kind": "submission", "rules": ["nope"]}]}"#)
        .unwrap_err();
    assert!(matches!(err, ModsieveError::UnresolvedReference { .. }));

    let err = parse_document(r#"{"checks": [{"name": "a", "kind": "modmail"}]}"#).unwrap_err();
    assert!(matches!(err, ModsieveError::SchemaInvalid { .. }));

    let err = parse_document("{not json").unwrap_err();
    assert!(matches!(err, ModsieveError::Json(_)));
}
