use modsieve::{ModsieveError, Result};

#[test]
fn schema_error_lists_allowed_values() {
    let err = ModsieveError::SchemaInvalid {
        path: "$.checks[0].kind".into(),
        message: "must be one of the allowed values".into(),
        allowed: vec!["submission".into(), "comment".into()],
    };
    let text = err.to_string();
    assert!(text.contains("$.checks[0].kind"));
    assert!(text.ends_with("(allowed: submission, comment)"));
}

#[test]
fn schema_helper_has_no_allowed_hint() {
    let err = ModsieveError::schema("$", "must be an object");
    assert_eq!(err.to_string(), "invalid config at $: must be an object");
}

#[test]
fn resolution_errors_name_the_definition() {
    let dup = ModsieveError::DuplicateName {
        kind: "rule",
        name: "Spam".into(),
    };
    assert!(dup.to_string().contains("'Spam'"));

    let missing = ModsieveError::UnresolvedReference {
        kind: "action",
        name: "nuke".into(),
    };
    assert!(missing.to_string().contains("no action named 'nuke'"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(ModsieveError::NotFound("s1".into()))
    }
    assert!(returns_error().is_err());
}

// ============================================================================
// Logged-once wrapping
// ============================================================================

#[test]
fn log_once_wraps_exactly_once() {
    let err = ModsieveError::Store("disk full".into()).log_once("test");
    assert!(err.is_logged());

    let again = err.log_once("outer");
    match &again {
        ModsieveError::Logged(inner) => assert!(!inner.is_logged()),
        other => panic!("expected logged wrapper, got {other:?}"),
    }
}

#[test]
fn logged_error_displays_and_reports_inner() {
    let err = ModsieveError::Api {
        status: 403,
        message: "forbidden".into(),
    }
    .log_once("test");

    assert_eq!(err.to_string(), "API error (403): forbidden");
    assert_eq!(err.status(), Some(403));
    assert!(matches!(err.inner(), ModsieveError::Api { .. }));
}

#[test]
fn content_fetch_status_is_exposed() {
    let err = ModsieveError::ContentFetch {
        reference: "wiki:x".into(),
        status: Some(404),
        message: "page not found".into(),
    };
    assert_eq!(err.status(), Some(404));
    assert_eq!(ModsieveError::NotFound("r/golang".into()).status(), Some(404));
    assert_eq!(ModsieveError::Http("reset".into()).status(), None);
}

#[test]
fn json_errors_convert() {
    let err: ModsieveError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
    assert!(matches!(err, ModsieveError::Json(_)));
}
