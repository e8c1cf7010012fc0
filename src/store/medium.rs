//! Storage medium backends.
//!
//! A medium stores opaque string payloads under string keys. The file medium
//! is the durable primary; the memory medium is the synchronous, always-
//! available fallback.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::MediumError;
use crate::lock::{rw_read, rw_write};

const SOURCE: &str = "store::medium";

/// A concrete storage backend underlying the tiered store.
///
/// Implementations report failure through [`MediumError`]; the tiered store
/// converts failure into fallback, so a medium should fail fast rather than
/// retry internally.
#[async_trait]
pub trait StorageMedium: Send + Sync {
    /// Stable name used in logs and metrics labels.
    fn name(&self) -> &'static str;

    /// Read the payload under `key`, `None` when the key is absent.
    async fn read(&self, key: &str) -> Result<Option<String>, MediumError>;

    /// Write `payload` under `key`, replacing any existing payload.
    async fn write(&self, key: &str, payload: &str) -> Result<(), MediumError>;

    /// Delete the payload under `key`; absence is not an error.
    async fn remove(&self, key: &str) -> Result<(), MediumError>;

    /// Enumerate keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, MediumError>;
}

// ============================================================================
// File medium
// ============================================================================

/// Durable file-backed medium.
///
/// Each key maps to one file under the root directory; the filename is the
/// hex encoding of the key, so arbitrary key characters (`:`, `/`) survive
/// the filesystem and enumeration can recover the original key.
pub struct FileMedium {
    root: PathBuf,
}

impl FileMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", hex::encode(key)))
    }
}

#[async_trait]
impl StorageMedium for FileMedium {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn read(&self, key: &str) -> Result<Option<String>, MediumError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(MediumError::Io(err)),
        }
    }

    async fn write(&self, key: &str, payload: &str) -> Result<(), MediumError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), payload).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MediumError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MediumError::Io(err)),
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, MediumError> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(MediumError::Io(err)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(stem) = Path::new(&name).file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            // Files not written by this medium are skipped, not errors.
            let Ok(bytes) = hex::decode(stem) else {
                continue;
            };
            let Ok(key) = String::from_utf8(bytes) else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

// ============================================================================
// Memory medium
// ============================================================================

/// Synchronous in-process fallback medium.
///
/// Holds payloads for the process lifetime. Cannot fail: it is the terminal
/// link of the fallback chain.
#[derive(Default)]
pub struct MemoryMedium {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageMedium for MemoryMedium {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, key: &str) -> Result<Option<String>, MediumError> {
        Ok(rw_read(&self.entries, SOURCE, "read").get(key).cloned())
    }

    async fn write(&self, key: &str, payload: &str) -> Result<(), MediumError> {
        rw_write(&self.entries, SOURCE, "write").insert(key.to_string(), payload.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MediumError> {
        rw_write(&self.entries, SOURCE, "remove").remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, MediumError> {
        Ok(rw_read(&self.entries, SOURCE, "keys")
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
