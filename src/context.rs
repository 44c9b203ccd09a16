//! Per-community evaluation context.

use std::sync::Arc;

use tracing::{Span, info_span};

use crate::cache::ResourceCache;

/// Everything a rule or check needs to know about the community it runs in.
///
/// Passed explicitly to every component that is built for a community;
/// there is no ambient per-community state.
#[derive(Debug, Clone)]
pub struct CommunityContext {
    name: String,
    span: Span,
    resources: Arc<ResourceCache>,
}

impl CommunityContext {
    pub fn new(resources: Arc<ResourceCache>) -> Self {
        let name = resources.community().to_string();
        Self {
            span: info_span!("community", name = %name),
            name,
            resources,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Span that evaluation for this community runs inside.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn resources(&self) -> &Arc<ResourceCache> {
        &self.resources
    }
}
