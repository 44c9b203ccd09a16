//! Platform-facing data types.

mod activity;
mod listing;

pub use activity::{Activity, ActivityKind, ActivityRef, Author, Comment, Submission};
pub use listing::{AuthorActivityOptions, ListingKind};

/// Community (subreddit-like space) metadata returned by the platform.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Community {
    pub name: String,
    #[serde(default)]
    pub wiki_enabled: bool,
}
