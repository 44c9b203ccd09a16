//! Content locators: wiki pages and external URLs.

/// Where a piece of configured text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentReference {
    /// `wiki:<page>` or `wiki:<page>|<community>`.
    Wiki {
        page: String,
        community: Option<String>,
    },
    /// `url:<address>`.
    Url(String),
    /// Anything else is the content itself.
    Literal(String),
}

impl ContentReference {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if let Some(rest) = strip_prefix_ignore_case(trimmed, "wiki:") {
            let (page, community) = match rest.split_once('|') {
                Some((page, community)) if !community.trim().is_empty() => {
                    (page, Some(community.trim().trim_start_matches("r/").to_string()))
                }
                Some((page, _)) => (page, None),
                None => (rest, None),
            };
            return ContentReference::Wiki {
                page: page.trim().to_string(),
                community,
            };
        }
        if let Some(rest) = strip_prefix_ignore_case(trimmed, "url:") {
            return ContentReference::Url(rest.trim().to_string());
        }
        ContentReference::Literal(value.to_string())
    }

    /// Whether resolving this reference needs a fetch (and so a cache entry).
    pub fn is_remote(&self) -> bool {
        !matches!(self, ContentReference::Literal(_))
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}
