//! Cache categories, TTL values and per-community cache settings.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default maximum number of entries in an in-process store.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// The kinds of values the resource cache memoizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheCategory {
    Submission,
    Comment,
    AuthorActivities,
    Content,
    AuthorCriteria,
    ItemCriteria,
    CheckResult,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 7] = [
        CacheCategory::Submission,
        CacheCategory::Comment,
        CacheCategory::AuthorActivities,
        CacheCategory::Content,
        CacheCategory::AuthorCriteria,
        CacheCategory::ItemCriteria,
        CacheCategory::CheckResult,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::Submission => "submission",
            CacheCategory::Comment => "comment",
            CacheCategory::AuthorActivities => "authorActivities",
            CacheCategory::Content => "content",
            CacheCategory::AuthorCriteria => "authorCriteria",
            CacheCategory::ItemCriteria => "itemCriteria",
            CacheCategory::CheckResult => "checkResult",
        }
    }
}

impl std::fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-to-live of a cache category.
///
/// Configured as `false` (never cache), `0` (cache forever) or a positive
/// number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    Disabled,
    Forever,
    Expires(Duration),
}

impl Ttl {
    pub fn secs(secs: u64) -> Self {
        if secs == 0 {
            Ttl::Forever
        } else {
            Ttl::Expires(Duration::from_secs(secs))
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Ttl::Disabled)
    }

    /// Expiry handed to the backing store: `None` means no expiry.
    pub fn store_ttl(&self) -> Option<Duration> {
        match self {
            Ttl::Expires(d) => Some(*d),
            _ => None,
        }
    }

    /// The finite, positive duration of this TTL, if it has one.
    pub fn finite(&self) -> Option<Duration> {
        match self {
            Ttl::Expires(d) if !d.is_zero() => Some(*d),
            _ => None,
        }
    }
}

impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ttl::Disabled => serializer.serialize_bool(false),
            Ttl::Forever => serializer.serialize_u64(0),
            Ttl::Expires(d) if d.subsec_nanos() == 0 => serializer.serialize_u64(d.as_secs()),
            Ttl::Expires(d) => serializer.serialize_f64(d.as_secs_f64()),
        }
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Secs(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Ttl::Disabled),
            Raw::Flag(true) => Err(serde::de::Error::custom(
                "ttl must be false, 0 or a positive number of seconds",
            )),
            Raw::Secs(s) if s < 0.0 || !s.is_finite() => Err(serde::de::Error::custom(format!(
                "ttl must not be negative (got {s})"
            ))),
            Raw::Secs(s) if s == 0.0 => Ok(Ttl::Forever),
            Raw::Secs(s) => Duration::try_from_secs_f64(s)
                .map(Ttl::Expires)
                .map_err(|e| serde::de::Error::custom(format!("ttl {s} is out of range: {e}"))),
        }
    }
}

/// TTL for every configurable cache category.
///
/// The check-result category is absent: its TTL is supplied per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtlSettings {
    pub submission: Ttl,
    pub comment: Ttl,
    pub author_activities: Ttl,
    pub content: Ttl,
    pub author_criteria: Ttl,
    pub item_criteria: Ttl,
}

impl Default for TtlSettings {
    fn default() -> Self {
        Self {
            submission: Ttl::secs(60),
            comment: Ttl::secs(60),
            author_activities: Ttl::secs(60),
            content: Ttl::secs(300),
            author_criteria: Ttl::secs(60),
            item_criteria: Ttl::secs(60),
        }
    }
}

impl TtlSettings {
    /// Every category disabled; useful as a base in tests and dry runs.
    pub fn disabled() -> Self {
        Self {
            submission: Ttl::Disabled,
            comment: Ttl::Disabled,
            author_activities: Ttl::Disabled,
            content: Ttl::Disabled,
            author_criteria: Ttl::Disabled,
            item_criteria: Ttl::Disabled,
        }
    }

    /// TTL configured for `category`. Check results always report
    /// [`Ttl::Forever`] here because callers pass their own expiry.
    pub fn for_category(&self, category: CacheCategory) -> Ttl {
        match category {
            CacheCategory::Submission => self.submission,
            CacheCategory::Comment => self.comment,
            CacheCategory::AuthorActivities => self.author_activities,
            CacheCategory::Content => self.content,
            CacheCategory::AuthorCriteria => self.author_criteria,
            CacheCategory::ItemCriteria => self.item_criteria,
            CacheCategory::CheckResult => Ttl::Forever,
        }
    }

    /// Smallest finite positive TTL across all categories.
    pub fn min_finite(&self) -> Option<Duration> {
        [
            self.submission,
            self.comment,
            self.author_activities,
            self.content,
            self.author_criteria,
            self.item_criteria,
        ]
        .iter()
        .filter_map(Ttl::finite)
        .min()
    }
}

/// Effective cache settings for one community.
///
/// ```rust
/// # use modsieve::cache::{CacheSettings, Ttl};
/// # use std::time::Duration;
/// let settings = CacheSettings::new()
///     .max_entries(500)
///     .submission_ttl(Ttl::Disabled)
///     .content_ttl(Ttl::Expires(Duration::from_secs(900)));
/// assert!(!settings.ttl.submission.is_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Maximum entries of an in-process store. Default: 10,000.
    pub max_entries: u64,
    pub ttl: TtlSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: TtlSettings::default(),
        }
    }
}

impl CacheSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: TtlSettings) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn submission_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl.submission = ttl;
        self
    }

    pub fn comment_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl.comment = ttl;
        self
    }

    pub fn author_activities_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl.author_activities = ttl;
        self
    }

    pub fn content_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl.content = ttl;
        self
    }

    pub fn criteria_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl.author_criteria = ttl;
        self.ttl.item_criteria = ttl;
        self
    }
}

/// Partial per-community TTL overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtlOverrides {
    pub submission: Option<Ttl>,
    pub comment: Option<Ttl>,
    pub author_activities: Option<Ttl>,
    pub content: Option<Ttl>,
    pub author_criteria: Option<Ttl>,
    pub item_criteria: Option<Ttl>,
}

/// Partial per-community cache settings, overlaid on shared defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheOverrides {
    pub max_entries: Option<u64>,
    pub ttl: TtlOverrides,
}

impl CacheOverrides {
    /// Apply these overrides on top of `base`.
    pub fn apply(&self, base: &CacheSettings) -> CacheSettings {
        let t = &self.ttl;
        CacheSettings {
            max_entries: self.max_entries.unwrap_or(base.max_entries),
            ttl: TtlSettings {
                submission: t.submission.unwrap_or(base.ttl.submission),
                comment: t.comment.unwrap_or(base.ttl.comment),
                author_activities: t.author_activities.unwrap_or(base.ttl.author_activities),
                content: t.content.unwrap_or(base.ttl.content),
                author_criteria: t.author_criteria.unwrap_or(base.ttl.author_criteria),
                item_criteria: t.item_criteria.unwrap_or(base.ttl.item_criteria),
            },
        }
    }
}
