//! Rule predicates and their AND/OR composition.
//!
//! A rule is one predicate over an activity. Rules are built from resolved
//! [`RuleDefinition`]s by [`build_rule`]; the vocabulary is closed:
//!
//! | kind | module |
//! |---|---|
//! | `author` | [`author`] |
//! | `regex` | [`regex`] |
//! | `recentActivity` | [`recent`] |
//!
//! Every rule also accepts `itemIs` / `authorIs` criteria. When either does
//! not pass, the rule reports *not applicable* instead of running.
//!
//! Rules compose into [`RuleSet`]s; see [`set`] for the join semantics.

pub mod author;
pub mod recent;
pub mod regex;
pub mod set;

pub use set::{Outcome, RuleNode, RuleSet, RuleSetResult, build_rule_set};

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::cache::ResourceCache;
use crate::config::RuleDefinition;
use crate::context::CommunityContext;
use crate::criteria::{AuthorCriteria, ItemCriteria};
use crate::types::Activity;
use crate::{ModsieveError, Result, telemetry};

/// The recorded outcome of one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub kind: String,
    pub name: String,
    /// `None` when the rule did not apply to the activity.
    pub triggered: Option<bool>,
    /// Short human-readable summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl RuleResult {
    pub fn is_applicable(&self) -> bool {
        self.triggered.is_some()
    }
}

/// What a predicate decided, before it is labelled with the rule's identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub triggered: Option<bool>,
    pub result: Option<String>,
    pub data: Value,
}

impl Evaluation {
    pub fn triggered(triggered: bool) -> Self {
        Self {
            triggered: Some(triggered),
            ..Default::default()
        }
    }

    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self {
            triggered: None,
            result: Some(reason.into()),
            data: Value::Null,
        }
    }

    pub fn result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Members every rule kind accepts.
#[derive(Clone)]
pub struct RuleCommon {
    pub name: String,
    /// Whether `name` was declared (otherwise it is the kind).
    pub named: bool,
    pub item_is: Vec<ItemCriteria>,
    pub author_is: Vec<AuthorCriteria>,
    pub resources: Arc<ResourceCache>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FilterOptions {
    #[serde(default)]
    item_is: Vec<ItemCriteria>,
    #[serde(default)]
    author_is: Vec<AuthorCriteria>,
}

impl RuleCommon {
    fn from_definition(def: &RuleDefinition, ctx: &CommunityContext) -> Result<Self> {
        let filters: FilterOptions = parse_parameters(def, &def.parameters)?;
        Ok(Self {
            name: def.name.clone().unwrap_or_else(|| def.kind.clone()),
            named: def.name.is_some(),
            item_is: filters.item_is,
            author_is: filters.author_is,
            resources: Arc::clone(ctx.resources()),
        })
    }
}

/// Deserialize a rule's parameters into its options type.
fn parse_parameters<T: DeserializeOwned>(
    def: &RuleDefinition,
    parameters: &Map<String, Value>,
) -> Result<T> {
    serde_json::from_value(Value::Object(parameters.clone())).map_err(|e| {
        ModsieveError::schema(
            format!("rule '{}'", def.name.as_deref().unwrap_or(&def.kind)),
            e.to_string(),
        )
    })
}

/// A single predicate over an activity.
#[async_trait]
pub trait Rule: Send + Sync {
    /// The rule's `kind` as written in config.
    fn kind(&self) -> &'static str;

    fn common(&self) -> &RuleCommon;

    /// Decide whether the rule triggers for `activity`.
    async fn evaluate(&self, activity: &Activity) -> Result<Evaluation>;

    fn name(&self) -> &str {
        &self.common().name
    }

    /// Run the rule with its filters, reusing an earlier result for the
    /// same named rule when `prior` has one.
    async fn run(&self, activity: &Activity, prior: &[RuleResult]) -> Result<RuleResult> {
        let common = self.common();
        if common.named {
            if let Some(previous) = prior
                .iter()
                .find(|r| r.kind == self.kind() && r.name.eq_ignore_ascii_case(&common.name))
            {
                debug!(rule = %common.name, "reusing earlier result");
                return Ok(previous.clone());
            }
        }

        let evaluation = if !common
            .resources
            .test_item_criteria(activity, &common.item_is)
            .await
            .map_err(|e| e.log_once("rule itemIs"))?
        {
            Evaluation::not_applicable("itemIs criteria did not match")
        } else if !common
            .resources
            .test_author_criteria(activity, &common.author_is)
            .await
            .map_err(|e| e.log_once("rule authorIs"))?
        {
            Evaluation::not_applicable("authorIs criteria did not match")
        } else {
            self.evaluate(activity).await.map_err(|e| match e {
                ModsieveError::ContentFetch { .. } => e,
                other => other.log_once(&format!("rule '{}'", common.name)),
            })?
        };

        let outcome = match evaluation.triggered {
            Some(true) => "triggered",
            Some(false) => "passed",
            None => "skipped",
        };
        metrics::counter!(telemetry::RULE_RUNS_TOTAL, "kind" => self.kind(), "outcome" => outcome)
            .increment(1);
        debug!(rule = %common.name, kind = self.kind(), outcome, "rule evaluated");

        Ok(RuleResult {
            kind: self.kind().to_string(),
            name: common.name.clone(),
            triggered: evaluation.triggered,
            result: evaluation.result,
            data: evaluation.data,
        })
    }
}

/// Instantiate a rule from its resolved definition.
pub fn build_rule(def: &RuleDefinition, ctx: &CommunityContext) -> Result<Arc<dyn Rule>> {
    let common = RuleCommon::from_definition(def, ctx)?;
    let rule: Arc<dyn Rule> = match def.kind.as_str() {
        author::KIND => Arc::new(author::AuthorRule::new(
            common,
            parse_parameters(def, &def.parameters)?,
        )?),
        regex::KIND => Arc::new(regex::RegexRule::new(
            common,
            parse_parameters(def, &def.parameters)?,
        )?),
        recent::KIND => Arc::new(recent::RecentActivityRule::new(
            common,
            parse_parameters(def, &def.parameters)?,
        )),
        other => {
            return Err(ModsieveError::SchemaInvalid {
                path: format!("rule '{}'.kind", def.name.as_deref().unwrap_or(other)),
                message: format!("unknown rule kind '{other}'"),
                allowed: KINDS.iter().map(|k| k.to_string()).collect(),
            });
        }
    };
    Ok(rule)
}

/// Every rule kind [`build_rule`] understands.
pub const KINDS: &[&str] = &[author::KIND, regex::KIND, recent::KIND];
