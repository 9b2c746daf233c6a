// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk hash-time cache backing the staleness oracle's `use_hash` mode.
//!
//! One JSON file per dependency URI, at `CACHE_DIR/<scheme>/<netloc>/<abs-path>`,
//! holding `{"t": <float-seconds>, "h": <hex-digest>}`. The cache file's own
//! mtime is the validity timestamp: a cache entry is only trusted when it is
//! newer than the dependency's raw mtime.

use crate::error::StorageError;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheRecord {
    t: f64,
    h: String,
}

/// The hash-time cache rooted at a single directory (typically
/// `./.cache/buildpy`, per `CACHE_DIR`).
#[derive(Debug, Clone)]
pub struct HashCache {
    root: PathBuf,
}

impl HashCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `CACHE_DIR/<scheme>/<netloc>/<abs-path>`, with any leading `/` on
    /// `path` stripped so it composes as a relative suffix.
    pub fn cache_path(&self, scheme: &str, netloc: &str, path: &str) -> PathBuf {
        self.root.join(scheme).join(netloc).join(path.trim_start_matches('/'))
    }

    /// Resolve the hash-augmented mtime for one dependency.
    ///
    /// `t_uri` is the dependency's raw adapter-reported mtime. `digest`
    /// computes its content hash lazily — it is only invoked when the
    /// cache is missing, corrupt, or stale, so an unchanged dependency
    /// never pays for hashing on every lookup.
    pub fn resolve(
        &self,
        scheme: &str,
        netloc: &str,
        path: &str,
        t_uri: f64,
        digest: impl FnOnce() -> Result<String, StorageError>,
    ) -> Result<f64, StorageError> {
        let cache_path = self.cache_path(scheme, netloc, path);
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let existing = fs::metadata(&cache_path).ok().and_then(|meta| {
            let record = read_record(&cache_path).ok()?;
            let t_cache_mtime = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?.as_secs_f64();
            Some((record, t_cache_mtime))
        });

        match existing {
            None => {
                let h_now = digest()?;
                self.write_record(&cache_path, t_uri, &h_now)?;
                Ok(t_uri)
            }
            Some((record, t_cache_mtime)) => {
                if t_cache_mtime > t_uri {
                    return Ok(record.t);
                }
                let h_now = digest()?;
                if h_now == record.h {
                    self.touch(&cache_path)?;
                    Ok(record.t)
                } else {
                    self.write_record(&cache_path, t_uri, &h_now)?;
                    Ok(t_uri)
                }
            }
        }
    }

    /// Write `{t, h}` atomically: lock a sibling lockfile for the duration
    /// of the write, stage the content in a tempfile in the same
    /// directory, then rename into place. The rename is what makes this
    /// atomic even against a reader that doesn't participate in the lock.
    fn write_record(&self, cache_path: &Path, t: f64, h: &str) -> Result<(), StorageError> {
        let _guard = self.lock(cache_path)?;

        let dir = cache_path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| StorageError::io(dir, e))?;
        let record = CacheRecord { t, h: h.to_string() };
        let body = serde_json::to_vec(&record).map_err(|e| StorageError::Digest(e.to_string()))?;
        tmp.write_all(&body).map_err(|e| StorageError::io(cache_path, e))?;
        tmp.flush().map_err(|e| StorageError::io(cache_path, e))?;
        tmp.persist(cache_path)
            .map_err(|e| StorageError::io(cache_path, e.error))?;
        Ok(())
    }

    /// Bump the cache file's mtime to now without touching its content,
    /// recording that the dependency's content is still the one last hashed.
    fn touch(&self, cache_path: &Path) -> Result<(), StorageError> {
        let _guard = self.lock(cache_path)?;
        let file = OpenOptions::new()
            .write(true)
            .open(cache_path)
            .map_err(|e| StorageError::io(cache_path, e))?;
        file.set_modified(SystemTime::now()).map_err(|e| StorageError::io(cache_path, e))?;
        Ok(())
    }

    fn lock(&self, cache_path: &Path) -> Result<LockGuard, StorageError> {
        let lock_path = lock_path_for(cache_path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StorageError::io(&lock_path, e))?;
        file.lock_exclusive().map_err(|e| StorageError::io(&lock_path, e))?;
        Ok(LockGuard { file })
    }
}

fn lock_path_for(cache_path: &Path) -> PathBuf {
    let mut os = cache_path.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

fn read_record(cache_path: &Path) -> Result<CacheRecord, StorageError> {
    let bytes = fs::read(cache_path).map_err(|e| StorageError::io(cache_path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Digest(e.to_string()))
}

/// Holds the advisory exclusive lock for the scope of one write/touch.
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
#[path = "hash_cache_tests.rs"]
mod tests;
