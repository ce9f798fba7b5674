// src/cache/mod.rs
//! Write-once key/value stores backing the content and summary caches.
//! Entries are never invalidated; a racing writer may overwrite an entry with
//! equal content, which is harmless.

pub mod content;
pub mod summary;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tempfile::NamedTempFile;

use crate::error::Result;

pub use content::ContentCache;
pub use summary::{Summarizer, Summary};

/// Minimal durable string store keyed by sanitized post ids.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

pub type SharedStore = Arc<dyn CacheStore>;

/// Turn an upstream id into a safe storage identifier.
///
/// Ids made only of `[A-Za-z0-9_-]` are used as-is; anything else is replaced by
/// a stable sha256 prefix so it can never escape the cache directory.
pub fn sanitize_key(id: &str) -> String {
    let safe = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if safe {
        return id.to_string();
    }
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(id.as_bytes());
    let mut out = String::with_capacity(2 + 32);
    out.push_str("h-");
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

// ------------------------------------------------------------
// Filesystem store
// ------------------------------------------------------------

/// One file per key under `dir`, written through a uniquely named temp file + rename.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
    extension: &'static str,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>, extension: &'static str) -> Self {
        Self {
            dir: dir.into(),
            extension,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_key(key), self.extension))
    }
}

impl CacheStore for FsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Each writer gets its own temp file, so racing puts on one key never
        // rename each other's files away.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

// ------------------------------------------------------------
// In-memory store
// ------------------------------------------------------------

/// Process-local store, mainly for tests. Counts writes so callers can assert
/// that nothing was persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.inner.read().unwrap_or_else(|p| p.into_inner());
        Ok(map.get(&sanitize_key(key)).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.inner.write().unwrap_or_else(|p| p.into_inner());
        map.insert(sanitize_key(key), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
