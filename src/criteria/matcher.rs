//! Criteria evaluation.

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::Result;
use crate::types::{Activity, Author, Comment};

use super::{AuthorCriteria, AuthorField, ItemCriteria, ItemField};

/// Resolves the submission a comment belongs to.
///
/// Injected into [`CriteriaMatcher`] so `submissionState` can be evaluated
/// without the matcher knowing where submissions come from.
#[async_trait]
pub trait SubmissionLookup: Send + Sync {
    async fn parent_submission(&self, comment: &Comment) -> Result<Activity>;
}

/// Evaluates criteria lists against activities and authors.
pub struct CriteriaMatcher<'a> {
    lookup: &'a dyn SubmissionLookup,
}

impl<'a> CriteriaMatcher<'a> {
    pub fn new(lookup: &'a dyn SubmissionLookup) -> Self {
        Self { lookup }
    }

    /// Test `author` against an OR-combined author criteria list.
    ///
    /// An empty list passes.
    pub fn test_author(author: &Author, criteria: &[AuthorCriteria]) -> bool {
        criteria.is_empty()
            || criteria
                .iter()
                .any(|entry| author_entry_matches(author, entry))
    }

    /// Test `activity` against an OR-combined item criteria list.
    ///
    /// An empty list passes. Entries are tried in order and evaluation
    /// stops at the first entry that passes.
    pub fn test_item<'b>(
        &'b self,
        activity: &'b Activity,
        criteria: &'b [ItemCriteria],
    ) -> BoxFuture<'b, Result<bool>> {
        async move {
            if criteria.is_empty() {
                return Ok(true);
            }
            for entry in criteria {
                if self.item_entry_matches(activity, entry).await? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        .boxed()
    }

    async fn item_entry_matches(&self, activity: &Activity, entry: &ItemCriteria) -> Result<bool> {
        for (key, field) in entry.fields() {
            let passed = match field {
                ItemField::Removed(expected) => activity.is_removed() == *expected,
                ItemField::Deleted(expected) => activity.is_deleted() == *expected,
                ItemField::Filtered(expected) => activity.is_filtered() == *expected,
                ItemField::Title(pattern) => match activity.title() {
                    Some(title) => pattern.is_match(title),
                    None => {
                        warn!(
                            field = %key,
                            activity = activity.id(),
                            "title criteria only applies to submissions, skipping"
                        );
                        true
                    }
                },
                ItemField::SubmissionState(nested) => match activity {
                    Activity::Comment(comment) => {
                        let submission = self.lookup.parent_submission(comment).await?;
                        self.test_item(&submission, nested).await?
                    }
                    Activity::Submission(_) => {
                        warn!(
                            field = %key,
                            activity = activity.id(),
                            "submissionState can only be used with comments, skipping"
                        );
                        true
                    }
                },
                ItemField::Property { key, expected } => match activity.property(key) {
                    Some(actual) => actual == *expected,
                    None => {
                        warn!(
                            field = %key,
                            activity = activity.id(),
                            "unknown item criteria field, skipping"
                        );
                        true
                    }
                },
                ItemField::Malformed { key, reason } => {
                    warn!(field = %key, reason = %reason, "malformed item criteria field, skipping");
                    true
                }
            };
            if !passed {
                debug!(field = %key, activity = activity.id(), "item criteria field failed");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn any_eq_ignore_case(candidates: &[String], actual: Option<&str>) -> bool {
    actual.is_some_and(|a| candidates.iter().any(|c| c.trim().eq_ignore_ascii_case(a.trim())))
}

fn author_entry_matches(author: &Author, entry: &AuthorCriteria) -> bool {
    for (key, field) in entry.fields() {
        let passed = match field {
            AuthorField::Name(names) => any_eq_ignore_case(&names, Some(&author.name)),
            AuthorField::FlairText(texts) => any_eq_ignore_case(&texts, author.flair_text.as_deref()),
            AuthorField::FlairCssClass(classes) => {
                any_eq_ignore_case(&classes, author.flair_css_class.as_deref())
            }
            AuthorField::IsMod(expected) => author.is_mod == expected,
            AuthorField::Verified(expected) => author.verified == expected,
            AuthorField::Unknown(key) => {
                warn!(field = %key, "unknown author criteria field, skipping");
                true
            }
            AuthorField::Malformed { key, reason } => {
                warn!(field = %key, reason = %reason, "malformed author criteria field, skipping");
                true
            }
        };
        if !passed {
            debug!(field = %key, author = %author.name, "author criteria field failed");
            return false;
        }
    }
    true
}
