//! `author` rule: triggers on who wrote the activity.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::criteria::AuthorCriteria;
use crate::types::Activity;
use crate::{ModsieveError, Result};

use super::{Evaluation, Rule, RuleCommon};

pub const KIND: &str = "author";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRuleOptions {
    /// Author must match one of these.
    #[serde(default)]
    pub include: Vec<AuthorCriteria>,
    /// Author must match none of these.
    #[serde(default)]
    pub exclude: Vec<AuthorCriteria>,
}

pub struct AuthorRule {
    common: RuleCommon,
    options: AuthorRuleOptions,
}

impl AuthorRule {
    pub fn new(common: RuleCommon, options: AuthorRuleOptions) -> Result<Self> {
        if options.include.is_empty() && options.exclude.is_empty() {
            return Err(ModsieveError::schema(
                format!("rule '{}'", common.name),
                "author rule needs at least one of include or exclude",
            ));
        }
        Ok(Self { common, options })
    }
}

#[async_trait]
impl Rule for AuthorRule {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn common(&self) -> &RuleCommon {
        &self.common
    }

    async fn evaluate(&self, activity: &Activity) -> Result<Evaluation> {
        let resources = &self.common.resources;
        let author = &activity.author().name;

        if !self.options.include.is_empty()
            && !resources
                .test_author_criteria(activity, &self.options.include)
                .await?
        {
            return Ok(Evaluation::triggered(false)
                .result(format!("{author} matched no include criteria"))
                .data(json!({"author": author})));
        }
        if !self.options.exclude.is_empty()
            && resources
                .test_author_criteria(activity, &self.options.exclude)
                .await?
        {
            return Ok(Evaluation::triggered(false)
                .result(format!("{author} matched exclude criteria"))
                .data(json!({"author": author})));
        }
        Ok(Evaluation::triggered(true)
            .result(format!("{author} matched"))
            .data(json!({"author": author})))
    }
}
