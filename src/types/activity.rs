//! Activities (submissions and comments) and their authors

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Concrete type of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Submission,
    Comment,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Submission => "submission",
            ActivityKind::Comment => "comment",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locator used to fetch an activity from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityRef {
    pub kind: ActivityKind,
    pub id: String,
}

impl ActivityRef {
    pub fn submission(id: impl Into<String>) -> Self {
        Self {
            kind: ActivityKind::Submission,
            id: id.into(),
        }
    }

    pub fn comment(id: impl Into<String>) -> Self {
        Self {
            kind: ActivityKind::Comment,
            id: id.into(),
        }
    }
}

/// The account behind an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flair_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flair_css_class: Option<String>,
    #[serde(default)]
    pub is_mod: bool,
    #[serde(default)]
    pub verified: bool,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A top-level post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub author: Author,
    pub community: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub filtered: bool,
    /// Platform properties not modelled above (score, locked, spoiler, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reply within a submission's discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: Author,
    pub community: String,
    pub body: String,
    /// Id of the submission this comment belongs to.
    pub submission_id: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub filtered: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A submission or comment from the monitored platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Submission(Submission),
    Comment(Comment),
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Activity::Submission(_) => ActivityKind::Submission,
            Activity::Comment(_) => ActivityKind::Comment,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Activity::Submission(s) => &s.id,
            Activity::Comment(c) => &c.id,
        }
    }

    pub fn to_ref(&self) -> ActivityRef {
        ActivityRef {
            kind: self.kind(),
            id: self.id().to_string(),
        }
    }

    pub fn author(&self) -> &Author {
        match self {
            Activity::Submission(s) => &s.author,
            Activity::Comment(c) => &c.author,
        }
    }

    pub fn community(&self) -> &str {
        match self {
            Activity::Submission(s) => &s.community,
            Activity::Comment(c) => &c.community,
        }
    }

    pub fn permalink(&self) -> &str {
        match self {
            Activity::Submission(s) => &s.permalink,
            Activity::Comment(c) => &c.permalink,
        }
    }

    /// Title of a submission; comments have none.
    pub fn title(&self) -> Option<&str> {
        match self {
            Activity::Submission(s) => Some(&s.title),
            Activity::Comment(_) => None,
        }
    }

    /// Text body (self-text for submissions).
    pub fn body(&self) -> Option<&str> {
        match self {
            Activity::Submission(s) => s.body.as_deref(),
            Activity::Comment(c) => Some(&c.body),
        }
    }

    pub fn is_removed(&self) -> bool {
        match self {
            Activity::Submission(s) => s.removed,
            Activity::Comment(c) => c.removed,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Activity::Submission(s) => s.deleted,
            Activity::Comment(c) => c.deleted,
        }
    }

    pub fn is_filtered(&self) -> bool {
        match self {
            Activity::Submission(s) => s.filtered,
            Activity::Comment(c) => c.filtered,
        }
    }

    /// Id of the submission this activity lives under (itself for submissions).
    pub fn submission_id(&self) -> &str {
        match self {
            Activity::Submission(s) => &s.id,
            Activity::Comment(c) => &c.submission_id,
        }
    }

    /// Look up a property by its serialized (camelCase) name.
    ///
    /// Covers both modelled fields and the pass-through `extra` map.
    pub fn property(&self, key: &str) -> Option<Value> {
        let extra = match self {
            Activity::Submission(s) => &s.extra,
            Activity::Comment(c) => &c.extra,
        };
        if let Some(v) = extra.get(key) {
            return Some(v.clone());
        }
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.get(key).cloned(),
            _ => None,
        }
    }
}

impl From<Submission> for Activity {
    fn from(s: Submission) -> Self {
        Activity::Submission(s)
    }
}

impl From<Comment> for Activity {
    fn from(c: Comment) -> Self {
        Activity::Comment(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission() -> Activity {
        serde_json::from_value(json!({
            "type": "submission",
            "id": "abc",
            "author": { "name": "alice", "isMod": true },
            "community": "rust",
            "title": "Hello",
            "score": 12,
            "locked": false
        }))
        .unwrap()
    }

    #[test]
    fn property_reads_modelled_and_extra_fields() {
        let activity = submission();
        assert_eq!(activity.property("title"), Some(json!("Hello")));
        assert_eq!(activity.property("score"), Some(json!(12)));
        assert_eq!(activity.property("locked"), Some(json!(false)));
        assert_eq!(activity.property("nope"), None);
    }

    #[test]
    fn submission_id_of_submission_is_itself() {
        let activity = submission();
        assert_eq!(activity.submission_id(), "abc");
        assert_eq!(activity.kind(), ActivityKind::Submission);
        assert!(activity.author().is_mod);
    }
}
