//! Checks: rule trees bound to a community, with their actions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Instrument, debug, instrument};

use crate::cache::stable_hash;
use crate::config::{ActionDefinition, ActionEntry, CheckDefinition, UserResultCacheOptions};
use crate::context::CommunityContext;
use crate::rules::{Outcome, RuleSet, build_rule_set};
use crate::types::{Activity, Comment};
use crate::{ModsieveError, Result, telemetry};

/// Outcome of running a [`Check`] against one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub check: String,
    /// Whether the rule tree was evaluated (or a cached evaluation reused).
    pub ran: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    pub triggered: bool,
    pub results: Vec<Outcome>,
    /// Actions to dispatch, with `content` references resolved to text.
    /// Empty unless triggered.
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub from_cache: bool,
}

impl CheckOutcome {
    fn skipped(check: &str, reason: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            ran: false,
            skip_reason: Some(reason.into()),
            triggered: false,
            results: Vec::new(),
            actions: Vec::new(),
            from_cache: false,
        }
    }

    fn status(&self) -> &'static str {
        match (self.ran, self.from_cache, self.triggered) {
            (false, _, _) => "skipped",
            (true, true, _) => "cached",
            (true, false, true) => "triggered",
            (true, false, false) => "passed",
        }
    }
}

/// A resolved check, ready to run for its community.
pub struct Check {
    definition: CheckDefinition,
    fingerprint: String,
    rules: RuleSet,
    actions: Vec<ActionDefinition>,
    ctx: CommunityContext,
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.definition.name)
            .field("community", &self.ctx.name())
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl Check {
    /// Build a check from a resolved definition.
    pub fn build(definition: CheckDefinition, ctx: &CommunityContext) -> Result<Self> {
        let rules = build_rule_set(definition.condition, &definition.rules, ctx)?;
        let actions = definition
            .actions
            .iter()
            .map(|entry| match entry {
                ActionEntry::Action(action) => Ok(action.clone()),
                ActionEntry::Reference(name) => Err(ModsieveError::UnresolvedReference {
                    kind: "action",
                    name: name.clone(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            fingerprint: stable_hash(&definition),
            definition,
            rules,
            actions,
            ctx: ctx.clone(),
        })
    }

    /// Build every check of a resolved document.
    pub fn build_all(definitions: Vec<CheckDefinition>, ctx: &CommunityContext) -> Result<Vec<Self>> {
        definitions
            .into_iter()
            .map(|def| Self::build(def, ctx))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &CheckDefinition {
        &self.definition
    }

    /// Stable hash of the resolved definition.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Run the check against `activity`.
    pub async fn run(&self, activity: &Activity) -> Result<CheckOutcome> {
        let outcome = self
            .run_in_community(activity)
            .instrument(self.ctx.span().clone())
            .await
            .map_err(|e| match e {
                ModsieveError::ContentFetch { .. } | ModsieveError::SchemaInvalid { .. } => e,
                other => other.log_once(&format!("check '{}'", self.definition.name)),
            })?;
        metrics::counter!(telemetry::CHECK_RUNS_TOTAL, "status" => outcome.status()).increment(1);
        Ok(outcome)
    }

    #[instrument(skip_all, fields(check = %self.definition.name, activity = activity.id()))]
    async fn run_in_community(&self, activity: &Activity) -> Result<CheckOutcome> {
        let name = self.definition.name.as_str();
        if activity.kind() != self.definition.kind {
            return Ok(CheckOutcome::skipped(
                name,
                format!("check runs on {}s", self.definition.kind),
            ));
        }

        let resources = self.ctx.resources();
        if !resources
            .test_item_criteria(activity, &self.definition.item_is)
            .await?
        {
            debug!("itemIs criteria did not match, skipping check");
            return Ok(CheckOutcome::skipped(name, "itemIs criteria did not match"));
        }
        if !resources
            .test_author_criteria(activity, &self.definition.author_is)
            .await?
        {
            debug!("authorIs criteria did not match, skipping check");
            return Ok(CheckOutcome::skipped(name, "authorIs criteria did not match"));
        }

        let user_cache = match (activity, &self.definition.cache_user_result) {
            (Activity::Comment(comment), Some(options)) if options.enable => {
                Some((comment, options))
            }
            _ => None,
        };

        if let Some((comment, options)) = user_cache {
            if let Some(cached) = self.cached_outcome(comment, options).await? {
                return Ok(cached);
            }
        }

        let result = self.rules.run(activity, &[]).await?;
        let actions = if result.triggered {
            self.resolve_actions().await?
        } else {
            Vec::new()
        };
        let outcome = CheckOutcome {
            check: name.to_string(),
            ran: true,
            skip_reason: None,
            triggered: result.triggered,
            actions,
            results: result.results,
            from_cache: false,
        };
        debug!(triggered = outcome.triggered, "check evaluated");

        if let Some((comment, options)) = user_cache {
            resources
                .set_comment_check_cache_result(
                    comment,
                    &self.fingerprint,
                    &outcome,
                    Duration::from_secs(options.ttl),
                )
                .await?;
        }
        Ok(outcome)
    }

    /// Copies of the actions with `wiki:` / `url:` content fetched.
    async fn resolve_actions(&self) -> Result<Vec<ActionDefinition>> {
        let resources = self.ctx.resources();
        let mut resolved = Vec::with_capacity(self.actions.len());
        for action in &self.actions {
            let mut action = action.clone();
            let reference = match action.parameters.get("content") {
                Some(Value::String(reference)) => Some(reference.clone()),
                _ => None,
            };
            if let Some(reference) = reference {
                let text = resources.get_content(&reference, self.ctx.name()).await?;
                action.parameters.insert("content".into(), Value::String(text));
            }
            resolved.push(action);
        }
        Ok(resolved)
    }

    async fn cached_outcome(
        &self,
        comment: &Comment,
        options: &UserResultCacheOptions,
    ) -> Result<Option<CheckOutcome>> {
        let cached: Option<CheckOutcome> = self
            .ctx
            .resources()
            .get_comment_check_cache_result(comment, &self.fingerprint)
            .await?;
        Ok(cached.map(|mut outcome| {
            debug!(author = %comment.author.name, "reusing cached check result for author");
            outcome.from_cache = true;
            if !options.run_actions {
                outcome.actions.clear();
            }
            outcome
        }))
    }
}
