//! Check, rule and action definitions as they appear in a config document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::criteria::{AuthorCriteria, ItemCriteria};
use crate::types::ActivityKind;

/// Join operator of a rule set or check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinOperator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl JoinOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinOperator::And => "AND",
            JoinOperator::Or => "OR",
        }
    }
}

/// A single predicate declaration: `{kind, name?, ...parameters}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

/// A single action declaration: `{kind, name?, ...parameters}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

/// A nested AND/OR group of rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetDefinition {
    pub condition: JoinOperator,
    pub rules: Vec<RuleEntry>,
}

/// A member of a check's or rule set's `rules` list.
///
/// Variant order matters for untagged deserialization: a rule set object
/// has exactly `condition` and `rules`, anything else with a `kind` is a
/// rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    /// Name of a rule defined elsewhere in the document.
    Reference(String),
    Set(RuleSetDefinition),
    Rule(RuleDefinition),
}

/// A member of a check's `actions` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionEntry {
    Reference(String),
    Action(ActionDefinition),
}

/// Per-author result caching for comment checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResultCacheOptions {
    #[serde(default)]
    pub enable: bool,
    /// Seconds a cached outcome stays valid. Default: 60.
    #[serde(default = "default_user_result_ttl")]
    pub ttl: u64,
    /// Whether actions run again when a cached outcome is reused.
    #[serde(default = "default_true")]
    pub run_actions: bool,
}

fn default_user_result_ttl() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for UserResultCacheOptions {
    fn default() -> Self {
        Self {
            enable: false,
            ttl: default_user_result_ttl(),
            run_actions: true,
        }
    }
}

/// A named bundle of rule conditions and resulting actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDefinition {
    pub name: String,
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub condition: JoinOperator,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_is: Vec<ItemCriteria>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author_is: Vec<AuthorCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_user_result: Option<UserResultCacheOptions>,
    /// Scheduling and presentation metadata, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A community's moderation config document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationConfig {
    pub checks: Vec<CheckDefinition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Definitions that may carry a document-wide name.
pub trait NamedDefinition: Clone + PartialEq {
    /// Label used in error messages ("rule", "action").
    const LABEL: &'static str;

    fn name(&self) -> Option<&str>;

    /// A copy with the name removed, for structural comparison.
    fn without_name(&self) -> Self;
}

impl NamedDefinition for RuleDefinition {
    const LABEL: &'static str = "rule";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn without_name(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }
}

impl NamedDefinition for ActionDefinition {
    const LABEL: &'static str = "action";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn without_name(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }
}
