//! Persisted key namespaces and hashing.
//!
//! Every key written through the engine is built here so the namespace
//! layout stays greppable in one place:
//!
//! - `cache:<key>` — generic TTL cache
//! - `page:<route>` / `ssg:<route>` / `ssr:<route>:<hash>` — rendering tiers
//! - `security:events` — bounded event list
//! - `user:preferences`, `user:history`, `analytics:events` — consumer state

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Route parameters for dynamic resolution. A `BTreeMap` so the hash of a
/// parameter set is independent of insertion order.
pub type RouteParams = BTreeMap<String, String>;

pub const SECURITY_EVENTS: &str = "security:events";
pub const USER_PREFERENCES: &str = "user:preferences";
pub const USER_HISTORY: &str = "user:history";
pub const ANALYTICS_EVENTS: &str = "analytics:events";

pub const GENERIC_PREFIX: &str = "cache:";
pub const PAGE_PREFIX: &str = "page:";
pub const SSG_PREFIX: &str = "ssg:";
pub const SSR_PREFIX: &str = "ssr:";

/// Generic TTL cache key: `cache:<key>`.
pub fn generic(key: &str) -> String {
    format!("{GENERIC_PREFIX}{key}")
}

/// Whole-page artifact key: `page:<route>`.
pub fn page(route: &str) -> String {
    format!("{PAGE_PREFIX}{route}")
}

/// Precomputed (static) tier key: `ssg:<route>`.
pub fn ssg(route: &str) -> String {
    format!("{SSG_PREFIX}{route}")
}

/// On-demand (dynamic) tier key: `ssr:<route>:<hash(params)>`.
pub fn ssr(route: &str, params: &RouteParams) -> String {
    format!("{SSR_PREFIX}{route}:{:016x}", hash_params(params))
}

/// Prefix covering every parameter variant of a dynamic route.
pub fn ssr_route_prefix(route: &str) -> String {
    format!("{SSR_PREFIX}{route}:")
}

/// Hash a parameter set for dynamic cache keys.
pub fn hash_params(params: &RouteParams) -> u64 {
    let mut hasher = DefaultHasher::new();
    for (name, value) in params {
        name.hash(&mut hasher);
        value.hash(&mut hasher);
    }
    hasher.finish()
}
