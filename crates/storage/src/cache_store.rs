// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted cache entries.
//!
//! One zstd-compressed JSON file per cache key, named `<key>.json.zst`.
//! Writes go to a temp file that is renamed over the target, so a reader
//! never sees a half-written entry. Expiry is checked on load.

use std::io;
use std::path::{Path, PathBuf};

use cmdx_core::CommandResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const EXTENSION: &str = "json.zst";
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache key {0:?} is not a hex digest")]
    InvalidKey(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("corrupt entry {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to serialize entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A cache entry as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub key: String,
    pub created_at_ms: u64,
    pub ttl_ms: u64,
    pub result: CommandResult,
}

impl StoredEntry {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.created_at_ms.saturating_add(self.ttl_ms)
    }
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|source| StoreError::Io { path: dir.clone(), source })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }

    pub fn save(&self, entry: &StoredEntry) -> Result<(), StoreError> {
        let path = self.path(&entry.key)?;
        let tmp_path = path.with_extension("zst.tmp");
        let json = serde_json::to_vec(entry)?;
        let compressed = zstd::stream::encode_all(json.as_slice(), COMPRESSION_LEVEL)
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;
        std::fs::write(&tmp_path, compressed)
            .and_then(|()| std::fs::rename(&tmp_path, &path))
            .map_err(|source| StoreError::Io { path, source })
    }

    /// Load a live entry. Missing and expired entries are `None`; expired
    /// files are removed.
    pub fn load(&self, key: &str, now_ms: u64) -> Result<Option<StoredEntry>, StoreError> {
        let path = self.path(key)?;
        let Some(entry) = read_entry(&path)? else {
            return Ok(None);
        };
        if entry.key != key {
            return Err(StoreError::Corrupt { path, reason: format!("holds key {:?}", entry.key) });
        }
        if entry.is_expired(now_ms) {
            remove_file(&path)?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        remove_file(&self.path(key)?)
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        self.retain(|_| false)
    }

    /// Remove expired and unreadable entries. Returns how many were removed.
    pub fn purge_expired(&self, now_ms: u64) -> Result<usize, StoreError> {
        self.retain(|entry| entry.is_some_and(|e| !e.is_expired(now_ms)))
    }

    fn retain(&self, keep: impl Fn(Option<&StoredEntry>) -> bool) -> Result<usize, StoreError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|source| StoreError::Io { path: self.dir.clone(), source })?;
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !name.ends_with(EXTENSION) {
                continue;
            }
            let stored = match read_entry(&path) {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unreadable cache entry");
                    None
                }
            };
            if !keep(stored.as_ref()) {
                remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn read_entry(path: &Path) -> Result<Option<StoredEntry>, StoreError> {
    let compressed = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
    };
    let json = zstd::stream::decode_all(compressed.as_slice())
        .map_err(|e| StoreError::Corrupt { path: path.to_path_buf(), reason: e.to_string() })?;
    serde_json::from_slice(&json)
        .map(Some)
        .map_err(|e| StoreError::Corrupt { path: path.to_path_buf(), reason: e.to_string() })
}

fn remove_file(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io { path: path.to_path_buf(), source }),
    }
}

#[cfg(test)]
#[path = "cache_store_tests.rs"]
mod tests;
