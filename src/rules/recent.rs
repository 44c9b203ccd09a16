//! `recentActivity` rule: triggers on where the author has been active.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::Result;
use crate::types::{Activity, AuthorActivityOptions};

use super::{Evaluation, Rule, RuleCommon};

pub const KIND: &str = "recentActivity";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityOptions {
    /// Which slice of the author's history to look at.
    #[serde(default)]
    pub window: AuthorActivityOptions,
    /// Communities to count activity in. Empty counts every community.
    #[serde(default)]
    pub communities: Vec<String>,
    /// Activities needed to trigger. Default: 1.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
}

fn default_threshold() -> usize {
    1
}

pub struct RecentActivityRule {
    common: RuleCommon,
    options: RecentActivityOptions,
    communities: Vec<String>,
}

impl RecentActivityRule {
    pub fn new(common: RuleCommon, options: RecentActivityOptions) -> Self {
        let communities = options
            .communities
            .iter()
            .map(|c| normalize_community(c))
            .collect();
        Self {
            common,
            options,
            communities,
        }
    }

    fn counts(&self, activity: &Activity) -> bool {
        self.communities.is_empty()
            || self
                .communities
                .contains(&normalize_community(activity.community()))
    }
}

fn normalize_community(name: &str) -> String {
    let name = name.trim();
    name.strip_prefix("r/")
        .unwrap_or(name)
        .to_lowercase()
}

#[async_trait]
impl Rule for RecentActivityRule {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn common(&self) -> &RuleCommon {
        &self.common
    }

    async fn evaluate(&self, activity: &Activity) -> Result<Evaluation> {
        let author = &activity.author().name;
        let history = self
            .common
            .resources
            .get_author_activities(author, &self.options.window)
            .await?;

        let count = history
            .iter()
            .filter(|a| a.id() != activity.id() && self.counts(a))
            .count();
        let threshold = self.options.threshold;
        Ok(Evaluation::triggered(count >= threshold)
            .result(format!(
                "{count} recent activit{} in watched communities, threshold {threshold}",
                if count == 1 { "y" } else { "ies" }
            ))
            .data(json!({"count": count, "communities": self.options.communities})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_names_ignore_prefix_and_case() {
        assert_eq!(normalize_community(" r/Rust "), "rust");
        assert_eq!(normalize_community("golang"), "golang");
    }
}
