//! Structural validation of config documents.
//!
//! Resolution assumes a well-formed document. [`validate_document`] checks
//! the shape it relies on and reports the first violation with its JSON
//! path, what was wrong and which values would have been accepted.

use serde_json::Value;

use super::definition::ModerationConfig;
use super::resolver::resolve_config;
use crate::{ModsieveError, Result};

const ACTIVITY_KINDS: &[&str] = &["submission", "comment"];
const JOIN_OPERATORS: &[&str] = &["AND", "OR"];

fn invalid(path: &str, message: impl Into<String>, allowed: &[&str]) -> ModsieveError {
    ModsieveError::SchemaInvalid {
        path: path.to_string(),
        message: message.into(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_enum(value: Option<&Value>, path: &str, allowed: &[&str], required: bool) -> Result<()> {
    match value {
        None if required => Err(invalid(path, "is required", allowed)),
        None => Ok(()),
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => Ok(()),
        Some(other) => Err(invalid(
            path,
            format!("must be one of the allowed values, got {other}"),
            allowed,
        )),
    }
}

fn expect_optional_string(value: Option<&Value>, path: &str) -> Result<()> {
    match value {
        None | Some(Value::String(_)) => Ok(()),
        Some(other) => Err(invalid(
            path,
            format!("must be a string, got {}", type_name(other)),
            &[],
        )),
    }
}

fn expect_array<'v>(value: Option<&'v Value>, path: &str) -> Result<&'v [Value]> {
    match value {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(invalid(
            path,
            format!("must be an array, got {}", type_name(other)),
            &[],
        )),
    }
}

fn validate_rule_entries(entries: &[Value], path: &str) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        let path = format!("{path}[{i}]");
        match entry {
            Value::String(_) => {}
            Value::Object(map) if map.contains_key("condition") && !map.contains_key("kind") => {
                expect_enum(map.get("condition"), &format!("{path}.condition"), JOIN_OPERATORS, true)?;
                if let Some(extra) = map.keys().find(|k| *k != "condition" && *k != "rules") {
                    return Err(invalid(
                        &format!("{path}.{extra}"),
                        "is not a rule set member",
                        &["condition", "rules"],
                    ));
                }
                let rules = match map.get("rules") {
                    Some(_) => expect_array(map.get("rules"), &format!("{path}.rules"))?,
                    None => return Err(invalid(&format!("{path}.rules"), "is required", &[])),
                };
                validate_rule_entries(rules, &format!("{path}.rules"))?;
            }
            Value::Object(map) => {
                match map.get("kind") {
                    Some(Value::String(_)) => {}
                    Some(other) => {
                        return Err(invalid(
                            &format!("{path}.kind"),
                            format!("must be a string, got {}", type_name(other)),
                            &[],
                        ));
                    }
                    None => return Err(invalid(&format!("{path}.kind"), "is required", &[])),
                }
                expect_optional_string(map.get("name"), &format!("{path}.name"))?;
            }
            other => {
                return Err(invalid(
                    &path,
                    format!("must be a rule, rule set or rule name, got {}", type_name(other)),
                    &[],
                ));
            }
        }
    }
    Ok(())
}

fn validate_action_entries(entries: &[Value], path: &str) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        let path = format!("{path}[{i}]");
        match entry {
            Value::String(_) => {}
            Value::Object(map) => {
                match map.get("kind") {
                    Some(Value::String(_)) => {}
                    _ => return Err(invalid(&format!("{path}.kind"), "is required and must be a string", &[])),
                }
                expect_optional_string(map.get("name"), &format!("{path}.name"))?;
            }
            other => {
                return Err(invalid(
                    &path,
                    format!("must be an action or action name, got {}", type_name(other)),
                    &[],
                ));
            }
        }
    }
    Ok(())
}

/// Check the structural shape of a raw config document.
pub fn validate_document(doc: &Value) -> Result<()> {
    let Value::Object(root) = doc else {
        return Err(invalid("$", format!("must be an object, got {}", type_name(doc)), &[]));
    };
    let checks = match root.get("checks") {
        Some(_) => expect_array(root.get("checks"), "$.checks")?,
        None => return Err(invalid("$.checks", "is required", &[])),
    };

    for (i, check) in checks.iter().enumerate() {
        let path = format!("$.checks[{i}]");
        let Value::Object(map) = check else {
            return Err(invalid(&path, format!("must be an object, got {}", type_name(check)), &[]));
        };
        match map.get("name") {
            Some(Value::String(_)) => {}
            _ => return Err(invalid(&format!("{path}.name"), "is required and must be a string", &[])),
        }
        expect_enum(map.get("kind"), &format!("{path}.kind"), ACTIVITY_KINDS, true)?;
        expect_enum(map.get("condition"), &format!("{path}.condition"), JOIN_OPERATORS, false)?;
        validate_rule_entries(expect_array(map.get("rules"), &format!("{path}.rules"))?, &format!("{path}.rules"))?;
        validate_action_entries(
            expect_array(map.get("actions"), &format!("{path}.actions"))?,
            &format!("{path}.actions"),
        )?;
    }
    Ok(())
}

/// Parse, validate and resolve a JSON config document.
pub fn parse_document(json: &str) -> Result<ModerationConfig> {
    let doc: Value = serde_json::from_str(json)?;
    load_document(doc)
}

/// Validate and resolve an already parsed config document.
pub fn load_document(doc: Value) -> Result<ModerationConfig> {
    validate_document(&doc)?;
    let config: ModerationConfig = serde_json::from_value(doc)
        .map_err(|e| ModsieveError::schema("$", e.to_string()))?;
    resolve_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_path(err: ModsieveError) -> String {
        match err {
            ModsieveError::SchemaInvalid { path, .. } => path,
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[test]
    fn accepts_minimal_document() {
        let doc = json!({"checks": [{"name": "c", "kind": "comment"}]});
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn rejects_unknown_check_kind_with_allowed_values() {
        let doc = json!({"checks": [{"name": "c", "kind": "message"}]});
        let err = validate_document(&doc).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("$.checks[0].kind"));
        assert!(text.contains("submission, comment"));
    }

    #[test]
    fn reports_nested_rule_path() {
        let doc = json!({"checks": [{
            "name": "c",
            "kind": "submission",
            "rules": [{"condition": "OR", "rules": ["a", 5]}]
        }]});
        assert_eq!(
            schema_path(validate_document(&doc).unwrap_err()),
            "$.checks[0].rules[0].rules[1]"
        );
    }

    #[test]
    fn rejects_bad_condition() {
        let doc = json!({"checks": [{
            "name": "c",
            "kind": "submission",
            "rules": [{"condition": "XOR", "rules": []}]
        }]});
        assert_eq!(
            schema_path(validate_document(&doc).unwrap_err()),
            "$.checks[0].rules[0].condition"
        );
    }

    #[test]
    fn rejects_action_without_kind() {
        let doc = json!({"checks": [{
            "name": "c",
            "kind": "submission",
            "actions": [{"name": "x"}]
        }]});
        assert_eq!(
            schema_path(validate_document(&doc).unwrap_err()),
            "$.checks[0].actions[0].kind"
        );
    }
}
