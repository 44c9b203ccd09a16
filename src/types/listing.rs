//! Author history listing options

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which part of an author's history to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    #[default]
    Overview,
    Submissions,
    Comments,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Overview => "overview",
            ListingKind::Submissions => "submissions",
            ListingKind::Comments => "comments",
        }
    }
}

/// Options for listing an author's recent activities.
///
/// Unknown members are kept in `extra` so that they take part in the cache
/// key: two option sets only share a cache entry when they are logically
/// identical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorActivityOptions {
    #[serde(default)]
    pub kind: ListingKind,
    /// Maximum number of activities to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Only include activities newer than this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_secs: Option<u64>,
    /// Key the history per community instead of per author.
    #[serde(default)]
    pub community_scoped: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthorActivityOptions {
    pub fn new(kind: ListingKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn max_age_secs(mut self, secs: u64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    pub fn community_scoped(mut self, scoped: bool) -> Self {
        self.community_scoped = scoped;
        self
    }
}
