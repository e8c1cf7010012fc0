//! Rendering-mode resolution.
//!
//! Routes classify into one of three strategies:
//!
//! - **Static**: precomputed content, cached for 24 hours under `ssg:`.
//! - **Dynamic**: on-demand content keyed by parameters, cached for one hour
//!   under `ssr:`.
//! - **Adaptive**: tries the static path and falls back to the dynamic path
//!   on generation failure, favoring availability over freshness.
//!
//! The [`RenderResolver`] layers an in-process memory cache above the
//! expiring cache; content generation itself is an external collaborator
//! behind the [`ContentGenerator`] trait.

mod artifact;
mod classify;
mod resolver;

pub use crate::cache::keys::RouteParams;
pub use artifact::{ContentGenerator, GeneratedContent, PageArtifact};
pub use classify::{RouteClass, RouteRules};
pub use resolver::RenderResolver;
