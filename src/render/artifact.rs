//! Page artifacts and the content-generation seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::cache::keys::RouteParams;
use crate::error::GenerateError;

/// Raw output of the content-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub description: String,
    pub body: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A rendered page, immutable once created.
///
/// Regeneration supersedes an artifact rather than mutating it; the
/// `generated_at` stamp distinguishes supersessions. The title/description
/// pair is what the page-mutation collaborator (SEO tag writer) consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageArtifact {
    pub title: String,
    pub description: String,
    pub rendered_body: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

impl From<GeneratedContent> for PageArtifact {
    fn from(content: GeneratedContent) -> Self {
        Self {
            title: content.title,
            description: content.description,
            rendered_body: content.body,
            metadata: content.metadata,
            generated_at: OffsetDateTime::now_utc(),
        }
    }
}

/// External content-generation collaborator.
///
/// Both paths may fail; the resolver applies its per-class policy (propagate
/// for static/dynamic routes, fall back for adaptive ones). No retry policy
/// here — callers retry by re-invoking resolution.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce precomputed content for a static-eligible route.
    async fn generate_static(&self, route: &str) -> Result<GeneratedContent, GenerateError>;

    /// Produce on-demand content for a route with request parameters.
    async fn generate_dynamic(
        &self,
        route: &str,
        params: &RouteParams,
    ) -> Result<GeneratedContent, GenerateError>;
}
