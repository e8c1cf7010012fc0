//! The tiered store: an ordered medium chain with never-throws semantics.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use metrics::counter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::medium::{FileMedium, MemoryMedium, StorageMedium};

const SOURCE: &str = "store::tiered";

const METRIC_STORE_FALLBACK_TOTAL: &str = "brezza_store_fallback_total";
const METRIC_STORE_MALFORMED_TOTAL: &str = "brezza_store_malformed_total";

/// Envelope around every persisted value.
///
/// Owned exclusively by the tiered store; the capture timestamp lets
/// consumers reason about staleness without a separate bookkeeping key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageRecord<T> {
    pub value: T,
    #[serde(with = "time::serde::rfc3339")]
    pub written_at: OffsetDateTime,
}

/// Key/value persistence across an ordered list of backing mediums.
///
/// Fallback is medium-level: once a medium fails a call, the same call is
/// retried wholesale against the next medium. No partial state is merged
/// between mediums. None of the public operations return an error; failure
/// of the whole chain reads as absent (`get`) or unsuccessful (`set`).
pub struct TieredStore {
    mediums: Vec<Arc<dyn StorageMedium>>,
}

impl TieredStore {
    /// Build a store over an explicit medium chain, tried in order.
    pub fn new(mediums: Vec<Arc<dyn StorageMedium>>) -> Self {
        debug_assert!(!mediums.is_empty(), "medium chain must not be empty");
        Self { mediums }
    }

    /// The standard local-first chain: durable files first, process memory
    /// as the always-available fallback.
    pub fn local_first(root: impl Into<PathBuf>) -> Self {
        Self::new(vec![
            Arc::new(FileMedium::new(root)),
            Arc::new(MemoryMedium::new()),
        ])
    }

    /// Read the value under `key`.
    ///
    /// A medium failure or a corrupt payload falls through to the next
    /// medium. A clean miss falls through too: a write that fell back to a
    /// later medium must stay readable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        for medium in &self.mediums {
            match medium.read(key).await {
                Ok(Some(payload)) => match serde_json::from_str::<StorageRecord<T>>(&payload) {
                    Ok(record) => return Some(record.value),
                    Err(err) => {
                        debug!(
                            target_module = SOURCE,
                            key,
                            medium = medium.name(),
                            error = %err,
                            "Malformed record treated as absent"
                        );
                        counter!(METRIC_STORE_MALFORMED_TOTAL, "medium" => medium.name())
                            .increment(1);
                    }
                },
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        target_module = SOURCE,
                        key,
                        medium = medium.name(),
                        error = %err,
                        "Medium read failed, falling through"
                    );
                    counter!(METRIC_STORE_FALLBACK_TOTAL, "medium" => medium.name(), "op" => "get")
                        .increment(1);
                }
            }
        }
        None
    }

    /// Persist `value` under `key`, stamped with the capture timestamp.
    ///
    /// Returns whether any medium accepted the write.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let record = StorageRecord {
            value,
            written_at: OffsetDateTime::now_utc(),
        };
        let payload = match serde_json::to_string(&record) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    target_module = SOURCE,
                    key,
                    error = %err,
                    "Value not serializable, write dropped"
                );
                return false;
            }
        };

        for medium in &self.mediums {
            match medium.write(key, &payload).await {
                Ok(()) => return true,
                Err(err) => {
                    warn!(
                        target_module = SOURCE,
                        key,
                        medium = medium.name(),
                        error = %err,
                        "Medium write failed, falling through"
                    );
                    counter!(METRIC_STORE_FALLBACK_TOTAL, "medium" => medium.name(), "op" => "set")
                        .increment(1);
                }
            }
        }
        false
    }

    /// Best-effort delete across every medium.
    ///
    /// Removal runs on the whole chain so a value that fell back during a
    /// write does not survive its own invalidation.
    pub async fn remove(&self, key: &str) {
        for medium in &self.mediums {
            if let Err(err) = medium.remove(key).await {
                debug!(
                    target_module = SOURCE,
                    key,
                    medium = medium.name(),
                    error = %err,
                    "Medium remove failed"
                );
            }
        }
    }

    /// Enumerate keys under `prefix`, unioned across every medium.
    pub async fn keys(&self, prefix: &str) -> Vec<String> {
        let mut union = BTreeSet::new();
        for medium in &self.mediums {
            match medium.keys(prefix).await {
                Ok(keys) => union.extend(keys),
                Err(err) => {
                    warn!(
                        target_module = SOURCE,
                        prefix,
                        medium = medium.name(),
                        error = %err,
                        "Medium enumeration failed"
                    );
                }
            }
        }
        union.into_iter().collect()
    }
}
