//! Process-wide, read-mostly caches.
//!
//! Entries are filled lazily: the first worker to ask for a key takes that
//! key's `OnceLock` and computes the value while other workers asking for
//! the same key block on it; once filled, readers only take the shared map
//! lock briefly to clone the entry handle.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::SystemTime;

use tracing::debug;

use crate::document::{Document, DocumentFormat};
use crate::error::{PackError, Result, fs};

type Slot<V> = Arc<OnceLock<std::result::Result<Arc<V>, String>>>;

/// Lazily populated cache with a per-key initialization lock
#[derive(Debug)]
pub struct OnceCache<K, V> {
    slots: RwLock<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for OnceCache<K, V> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V> OnceCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &K) -> Slot<V> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Return the cached value for `key`, computing it once if absent.
    ///
    /// Failures are cached as their message so every caller sees the same outcome.
    pub fn get_or_init(
        &self,
        key: &K,
        init: impl FnOnce() -> std::result::Result<V, String>,
    ) -> std::result::Result<Arc<V>, String> {
        self.slot(key).get_or_init(|| init().map(Arc::new)).clone()
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parsed documents keyed by absolute path and modification time
#[derive(Debug, Default)]
pub struct ParseCache {
    inner: OnceCache<(PathBuf, Option<SystemTime>), Document>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse a YAML or JSON file, reusing an earlier parse when unchanged
    pub fn load(&self, path: &Path) -> Result<Arc<Document>> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentFormat::from_extension)
            .ok_or_else(|| PackError::LoadFailed {
                path: path.display().to_string(),
                reason: "not a YAML or JSON file".to_string(),
            })?;
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => fs::not_found(path),
            _ => fs::read_failed(path, &e),
        })?;
        let absolute = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let key = (absolute, metadata.modified().ok());

        self.inner
            .get_or_init(&key, || {
                debug!(path = %path.display(), "parsing document");
                let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
                Document::parse(&text, format).map_err(|e| e.to_string())
            })
            .map_err(|reason| PackError::LoadFailed {
                path: path.display().to_string(),
                reason,
            })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
