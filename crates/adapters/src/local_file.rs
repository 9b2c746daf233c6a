// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter for `file://localhost/...` targets: the real filesystem.

use crate::error::AdapterError;
use crate::registry::ResourceAdapter;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use strata_core::Uri;
use strata_storage::HashCache;

/// Local filesystem adapter. Content digests feed the shared
/// [`HashCache`] so `use_hash=true` jobs get mtime-with-hash semantics.
pub struct LocalFileAdapter {
    cache: Arc<HashCache>,
}

impl LocalFileAdapter {
    pub fn new(cache: Arc<HashCache>) -> Self {
        Self { cache }
    }
}

fn raw_mtime(path: &Path, uri: &str) -> Result<f64, AdapterError> {
    let meta = fs::metadata(path).map_err(|e| io_error(uri, e))?;
    let modified = meta.modified().map_err(|e| AdapterError::Transport { uri: uri.to_string(), reason: e.to_string() })?;
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AdapterError::Transport { uri: uri.to_string(), reason: e.to_string() })?
        .as_secs_f64();
    Ok(secs)
}

fn io_error(uri: &str, err: std::io::Error) -> AdapterError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AdapterError::NotFound { uri: uri.to_string() }
    } else {
        AdapterError::Transport { uri: uri.to_string(), reason: err.to_string() }
    }
}

fn sha256_hex(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

impl ResourceAdapter for LocalFileAdapter {
    fn mtime(&self, uri: &Uri, _credential: Option<&str>, use_hash: bool) -> Result<f64, AdapterError> {
        let path = Path::new(uri.path());
        let t_uri = raw_mtime(path, &uri.to_string())?;
        if !use_hash {
            return Ok(t_uri);
        }
        let path_owned = path.to_path_buf();
        let uri_string = uri.to_string();
        self.cache
            .resolve(&uri.scheme, &uri.netloc, uri.path(), t_uri, move || {
                sha256_hex(&path_owned).map_err(|e| strata_storage::StorageError::Digest(e.to_string()))
            })
            .map_err(|e| AdapterError::Transport { uri: uri_string, reason: e.to_string() })
    }

    fn rm(&self, uri: &Uri, _credential: Option<&str>) -> Result<(), AdapterError> {
        let path = Path::new(uri.path());
        fs::remove_file(path).map_err(|e| io_error(&uri.to_string(), e))
    }
}

#[cfg(test)]
#[path = "local_file_tests.rs"]
mod tests;
