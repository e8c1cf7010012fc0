//! Tiered key/value persistence.
//!
//! A [`TieredStore`] owns an ordered chain of [`StorageMedium`] backends and
//! retries each call wholesale against the next medium when one fails. The
//! chain exists to make every consumer fallback-transparent: quota errors,
//! unwritable directories, and corrupt payloads all degrade to a miss, never
//! to an error at the call site.

mod medium;
mod tiered;

pub use medium::{FileMedium, MemoryMedium, StorageMedium};
pub use tiered::{StorageRecord, TieredStore};
