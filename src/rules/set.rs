//! AND/OR rule trees.
//!
//! A [`RuleSet`] runs its children strictly in declared order. Each child
//! sees every result produced so far (the caller's prior results followed
//! by earlier siblings, nested sets flattened), so a named rule that
//! already ran is not run again.
//!
//! Join semantics:
//!
//! - A child that reports not applicable is recorded but ignored by the
//!   join.
//! - `AND` stops at the first applicable child that did not trigger.
//! - `OR` stops at the first applicable child that triggered.
//! - When no child applied, the set does not trigger, under either
//!   operator. A nested set always reports a definite outcome to its
//!   parent.
//!
//! Results hold only the children evaluated before the stop.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::{JoinOperator, RuleEntry};
use crate::context::CommunityContext;
use crate::types::Activity;
use crate::{ModsieveError, Result};

use super::{Rule, RuleResult, build_rule};

/// A child of a rule set.
#[derive(Clone)]
pub enum RuleNode {
    Rule(Arc<dyn Rule>),
    Set(RuleSet),
}

/// A result trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Set(RuleSetResult),
    Rule(RuleResult),
}

impl Outcome {
    /// `None` for a rule that did not apply. Sets are always definite.
    pub fn triggered(&self) -> Option<bool> {
        match self {
            Outcome::Rule(r) => r.triggered,
            Outcome::Set(s) => Some(s.triggered),
        }
    }

    /// The rule results in this outcome, depth first.
    pub fn flatten(&self) -> Vec<RuleResult> {
        match self {
            Outcome::Rule(r) => vec![r.clone()],
            Outcome::Set(s) => s.flatten(),
        }
    }
}

/// Outcome of running a [`RuleSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetResult {
    pub condition: JoinOperator,
    pub triggered: bool,
    pub results: Vec<Outcome>,
}

impl RuleSetResult {
    pub fn flatten(&self) -> Vec<RuleResult> {
        self.results.iter().flat_map(Outcome::flatten).collect()
    }
}

/// An AND/OR group of rules and nested groups.
#[derive(Clone)]
pub struct RuleSet {
    condition: JoinOperator,
    children: Vec<RuleNode>,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("condition", &self.condition)
            .field("children", &self.children.len())
            .finish()
    }
}

impl RuleSet {
    pub fn new(condition: JoinOperator, children: Vec<RuleNode>) -> Self {
        Self {
            condition,
            children,
        }
    }

    pub fn condition(&self) -> JoinOperator {
        self.condition
    }

    pub fn children(&self) -> &[RuleNode] {
        &self.children
    }

    /// Evaluate the tree against `activity`.
    pub fn run<'a>(
        &'a self,
        activity: &'a Activity,
        prior: &'a [RuleResult],
    ) -> BoxFuture<'a, Result<RuleSetResult>> {
        async move {
            let mut seen = prior.to_vec();
            let mut results = Vec::with_capacity(self.children.len());
            let mut any_applied = false;

            for child in &self.children {
                let outcome = match child {
                    RuleNode::Rule(rule) => Outcome::Rule(rule.run(activity, &seen).await?),
                    RuleNode::Set(set) => Outcome::Set(set.run(activity, &seen).await?),
                };
                let triggered = outcome.triggered();
                seen.extend(outcome.flatten());
                results.push(outcome);

                match (self.condition, triggered) {
                    (_, None) => {}
                    (JoinOperator::And, Some(false)) => return Ok(self.finish(false, results)),
                    (JoinOperator::Or, Some(true)) => return Ok(self.finish(true, results)),
                    (_, Some(_)) => any_applied = true,
                }
            }

            let triggered = match self.condition {
                JoinOperator::And => any_applied,
                JoinOperator::Or => false,
            };
            Ok(self.finish(triggered, results))
        }
        .boxed()
    }

    fn finish(&self, triggered: bool, results: Vec<Outcome>) -> RuleSetResult {
        RuleSetResult {
            condition: self.condition,
            triggered,
            results,
        }
    }
}

/// Build a rule tree from resolved rule entries.
///
/// Entries must already be resolved; a leftover name reference is an
/// [`ModsieveError::UnresolvedReference`].
pub fn build_rule_set(
    condition: JoinOperator,
    entries: &[RuleEntry],
    ctx: &CommunityContext,
) -> Result<RuleSet> {
    let children = entries
        .iter()
        .map(|entry| match entry {
            RuleEntry::Reference(name) => Err(ModsieveError::UnresolvedReference {
                kind: "rule",
                name: name.clone(),
            }),
            RuleEntry::Rule(def) => build_rule(def, ctx).map(RuleNode::Rule),
            RuleEntry::Set(set) => build_rule_set(set.condition, &set.rules, ctx).map(RuleNode::Set),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RuleSet::new(condition, children))
}
