//! Author- and item-level criteria.
//!
//! A criteria list is OR-combined: it passes when any entry passes. Within
//! one entry every declared field must match. Criteria objects keep their
//! raw JSON form, which is what cache keys are hashed from. Item criteria
//! are parsed into a closed set of [`ItemField`] variants once, when built,
//! in the order their keys were written; author criteria are parsed into
//! [`AuthorField`] variants when evaluated. Keys outside the recognized set are never an error: item
//! criteria compare them against same-named activity properties, author
//! criteria skip them with a warning.

mod matcher;

pub use matcher::{CriteriaMatcher, SubmissionLookup};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// One item criteria entry, e.g. `{"removed": false, "title": "^\\[META\\]"}`.
///
/// Fields are evaluated in the order they were written.
#[derive(Debug, Clone, Default)]
pub struct ItemCriteria {
    raw: Map<String, Value>,
    fields: Vec<(String, ItemField)>,
}

/// One author criteria entry, e.g. `{"name": ["alice"], "isMod": false}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorCriteria(pub Map<String, Value>);

/// A recognized item criteria field with its expected value.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemField {
    Removed(bool),
    Deleted(bool),
    Filtered(bool),
    /// Regular expression the submission title must match.
    Title(TitlePattern),
    /// Criteria the parent submission of a comment must satisfy.
    SubmissionState(Vec<ItemCriteria>),
    /// Equality against an arbitrary activity property.
    Property { key: String, expected: Value },
    /// A recognized key whose value has the wrong shape.
    Malformed { key: String, reason: String },
}

impl ItemField {
    pub fn parse(key: &str, value: &Value) -> Self {
        let flag = |make: fn(bool) -> ItemField| match value.as_bool() {
            Some(b) => make(b),
            None => ItemField::Malformed {
                key: key.to_string(),
                reason: "expected a boolean".into(),
            },
        };
        match key {
            "removed" => flag(ItemField::Removed),
            "deleted" => flag(ItemField::Deleted),
            "filtered" => flag(ItemField::Filtered),
            "title" => match value.as_str() {
                Some(pattern) => ItemField::Title(TitlePattern::new(pattern)),
                None => ItemField::Malformed {
                    key: key.to_string(),
                    reason: "expected a regular expression string".into(),
                },
            },
            "submissionState" => {
                let nested = match value {
                    Value::Array(_) => serde_json::from_value::<Vec<ItemCriteria>>(value.clone()),
                    Value::Object(_) => {
                        serde_json::from_value::<ItemCriteria>(value.clone()).map(|c| vec![c])
                    }
                    _ => {
                        return ItemField::Malformed {
                            key: key.to_string(),
                            reason: "expected a criteria object or list".into(),
                        };
                    }
                };
                match nested {
                    Ok(list) => ItemField::SubmissionState(list),
                    Err(e) => ItemField::Malformed {
                        key: key.to_string(),
                        reason: e.to_string(),
                    },
                }
            }
            other => ItemField::Property {
                key: other.to_string(),
                expected: value.clone(),
            },
        }
    }
}

/// A `title` regular expression, compiled once.
///
/// An invalid pattern is reported when parsed and never matches.
#[derive(Debug, Clone)]
pub struct TitlePattern {
    source: String,
    regex: Option<Regex>,
}

impl TitlePattern {
    pub fn new(source: &str) -> Self {
        let regex = match Regex::new(source) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = source, error = %e, "invalid title regex, treating as no match");
                None
            }
        };
        Self {
            source: source.to_string(),
            regex,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    pub fn is_match(&self, title: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(title))
    }
}

impl PartialEq for TitlePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl ItemCriteria {
    pub fn new(raw: Map<String, Value>) -> Self {
        let fields = raw
            .iter()
            .map(|(k, v)| (k.clone(), ItemField::parse(k, v)))
            .collect();
        Self { raw, fields }
    }

    /// The entry as written.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Parsed fields, in declaration order.
    pub fn fields(&self) -> &[(String, ItemField)] {
        &self.fields
    }

    /// The nested submission criteria, when `submissionState` is the only field.
    pub fn only_submission_state(&self) -> Option<Vec<ItemCriteria>> {
        match self.fields.as_slice() {
            [(_, ItemField::SubmissionState(list))] => Some(list.clone()),
            _ => None,
        }
    }
}

impl PartialEq for ItemCriteria {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Serialize for ItemCriteria {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ItemCriteria {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::new)
    }
}

/// A recognized author criteria field with its expected value.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorField {
    /// Any of these names (case-insensitive).
    Name(Vec<String>),
    FlairText(Vec<String>),
    FlairCssClass(Vec<String>),
    IsMod(bool),
    Verified(bool),
    Unknown(String),
    Malformed { key: String, reason: String },
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

impl AuthorField {
    pub fn parse(key: &str, value: &Value) -> Self {
        let malformed = |reason: &str| AuthorField::Malformed {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        match key {
            "name" | "flairText" | "flairCssClass" => match string_list(value) {
                Some(list) if key == "name" => AuthorField::Name(list),
                Some(list) if key == "flairText" => AuthorField::FlairText(list),
                Some(list) => AuthorField::FlairCssClass(list),
                None => malformed("expected a string or list of strings"),
            },
            "isMod" => value
                .as_bool()
                .map(AuthorField::IsMod)
                .unwrap_or_else(|| malformed("expected a boolean")),
            "verified" => value
                .as_bool()
                .map(AuthorField::Verified)
                .unwrap_or_else(|| malformed("expected a boolean")),
            other => AuthorField::Unknown(other.to_string()),
        }
    }
}

impl AuthorCriteria {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> Vec<(String, AuthorField)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), AuthorField::parse(k, v)))
            .collect()
    }
}
