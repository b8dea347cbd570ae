// ABOUTME: On-disk edge cache for response envelopes, a thin typed wrapper over cacache.
// ABOUTME: Entries are keyed by the canonical query string and hold the serialized envelope.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::GenError;
use crate::gateway::Envelope;

/// Envelope store rooted at one cacache directory.
#[derive(Debug, Clone)]
pub struct EdgeCache {
    root: PathBuf,
}

impl EdgeCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cached envelope for `key`, or `None` on a miss.
    pub async fn get(&self, key: &str) -> Result<Option<Envelope>, GenError> {
        let bytes = match cacache::read(&self.root, key).await {
            Ok(bytes) => bytes,
            Err(cacache::Error::EntryNotFound(_, _)) => {
                debug!(key, "edge cache miss");
                return Ok(None);
            }
            Err(e) => return Err(GenError::cache(key, "CacheRead", Some(e.into()))),
        };
        let envelope = serde_json::from_slice(&bytes)
            .map_err(|e| GenError::cache(key, "CacheDecode", Some(e.into())))?;
        Ok(Some(envelope))
    }

    /// Store `envelope` under `key`; the last write wins.
    pub async fn put(&self, key: &str, envelope: &Envelope) -> Result<(), GenError> {
        let bytes = serde_json::to_vec(envelope)
            .map_err(|e| GenError::cache(key, "CacheEncode", Some(e.into())))?;
        cacache::write(&self.root, key, bytes)
            .await
            .map_err(|e| GenError::cache(key, "CacheWrite", Some(e.into())))?;
        Ok(())
    }
}
