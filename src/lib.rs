//! Brezza — local-first persistence and adaptive-rendering engine.
//!
//! The engine is the durable core under a presentation layer that cannot
//! afford to see storage failures:
//!
//! - **[`store`]**: key/value persistence across an ordered chain of backing
//!   mediums with automatic fallback. Callers never see a storage error;
//!   the worst case is an absent value.
//! - **[`cache`]**: a namespaced TTL layer over the tiered store. Expired
//!   entries are ignored, not purged, and overwritten on the next write.
//! - **[`render`]**: classifies routes into static/dynamic/adaptive
//!   rendering strategies and produces page artifacts through three cache
//!   tiers with differing TTLs.
//! - **[`security`]**: a bounded, filterable event ledger with a
//!   reset-window rate limiter and input screening.
//!
//! All pieces are wired into a single [`Engine`] context constructed once at
//! process start and shared by reference.
//!
//! ## Configuration
//!
//! Settings load from `config/default` and `brezza` files plus `BREZZA__*`
//! environment variables; see [`config`] for the full surface.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
mod lock;
pub mod render;
pub mod security;
pub mod store;
pub mod telemetry;

pub use cache::{ExpiringCache, keys};
pub use config::Settings;
pub use engine::Engine;
pub use error::{GenerateError, MediumError, ResolveError};
pub use render::{
    ContentGenerator, GeneratedContent, PageArtifact, RenderResolver, RouteClass, RouteParams,
    RouteRules,
};
pub use security::{
    EventFilter, EventKind, RateDecision, RateLimiter, SecurityEvent, SecurityLedger,
    SecurityReport, SecurityStatus, Severity, is_suspicious_input,
};
pub use store::{FileMedium, MemoryMedium, StorageMedium, StorageRecord, TieredStore};
