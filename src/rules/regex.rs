//! `regex` rule: triggers on text patterns in a title or body.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::types::{Activity, ActivityKind};
use crate::{ModsieveError, Result};

use super::{Evaluation, Rule, RuleCommon};

pub const KIND: &str = "regex";

/// Matched text kept in result data, per rule run.
const MAX_SAMPLES: usize = 3;

/// Which text of the activity is searched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegexField {
    Title,
    Body,
    #[default]
    Any,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexRuleOptions {
    pub pattern: String,
    #[serde(default)]
    pub field: RegexField,
    /// Number of matches needed to trigger. Default: 1.
    #[serde(default = "default_threshold")]
    pub match_threshold: usize,
    /// Restrict the rule to one activity kind.
    #[serde(default)]
    pub activity: Option<ActivityKind>,
}

fn default_threshold() -> usize {
    1
}

pub struct RegexRule {
    common: RuleCommon,
    options: RegexRuleOptions,
    regex: Regex,
}

impl RegexRule {
    pub fn new(common: RuleCommon, options: RegexRuleOptions) -> Result<Self> {
        let regex = Regex::new(&options.pattern).map_err(|e| ModsieveError::InvalidRegex {
            pattern: options.pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            common,
            options,
            regex,
        })
    }

    fn texts<'a>(&self, activity: &'a Activity) -> Vec<&'a str> {
        let title = activity.title();
        let body = activity.body();
        match self.options.field {
            RegexField::Title => title.into_iter().collect(),
            RegexField::Body => body.into_iter().collect(),
            RegexField::Any => title.into_iter().chain(body).collect(),
        }
    }
}

#[async_trait]
impl Rule for RegexRule {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn common(&self) -> &RuleCommon {
        &self.common
    }

    async fn evaluate(&self, activity: &Activity) -> Result<Evaluation> {
        if let Some(kind) = self.options.activity {
            if kind != activity.kind() {
                return Ok(Evaluation::not_applicable(format!("only applies to {kind}s")));
            }
        }

        let mut count = 0;
        let mut samples = Vec::new();
        for text in self.texts(activity) {
            for m in self.regex.find_iter(text) {
                count += 1;
                if samples.len() < MAX_SAMPLES {
                    samples.push(m.as_str().to_string());
                }
            }
        }

        let threshold = self.options.match_threshold;
        Ok(Evaluation::triggered(count >= threshold)
            .result(format!("matched {count} time(s), threshold {threshold}"))
            .data(json!({"matches": count, "samples": samples})))
    }
}
