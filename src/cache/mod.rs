//! TTL caching over the tiered store.
//!
//! The [`ExpiringCache`] wraps a [`crate::store::TieredStore`] with expiry
//! semantics: every entry carries an `expires_at` stamp, expired entries are
//! logically dead but not proactively purged, and malformed entries read as
//! misses. The [`keys`] module centralizes every persisted key namespace.

mod expiring;
pub mod keys;

pub use expiring::{CacheEntry, ExpiringCache};
