// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-scheme resource adapter registry.

use crate::error::AdapterError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::Uri;

/// Capability set every resource adapter must provide: report a URI's
/// last-modification time, and delete the object it names.
///
/// Implementations must be safe for concurrent calls — the worker pool
/// calls `mtime` from many threads at once during staleness probing.
pub trait ResourceAdapter: Send + Sync {
    /// Last-modification timestamp, in seconds since the Unix epoch. When
    /// `use_hash` is true and the adapter can produce a content digest,
    /// this is the hash-augmented value (see the staleness oracle), not
    /// the raw filesystem/object mtime.
    fn mtime(&self, uri: &Uri, credential: Option<&str>, use_hash: bool) -> Result<f64, AdapterError>;

    /// Delete the object this URI names. `NotFound` if it is already gone.
    fn rm(&self, uri: &Uri, credential: Option<&str>) -> Result<(), AdapterError>;
}

/// Maps a URI's scheme string to the adapter responsible for it.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, Arc<dyn ResourceAdapter>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, scheme: impl Into<String>, adapter: Arc<dyn ResourceAdapter>) {
        self.adapters.write().insert(scheme.into(), adapter);
    }

    pub fn get(&self, scheme: &str) -> Result<Arc<dyn ResourceAdapter>, AdapterError> {
        self.adapters
            .read()
            .get(scheme)
            .cloned()
            .ok_or_else(|| AdapterError::UnsupportedScheme { scheme: scheme.to_string() })
    }

    pub fn mtime(&self, uri: &Uri, credential: Option<&str>, use_hash: bool) -> Result<f64, AdapterError> {
        self.get(&uri.scheme)?.mtime(uri, credential, use_hash)
    }

    pub fn rm(&self, uri: &Uri, credential: Option<&str>) -> Result<(), AdapterError> {
        self.get(&uri.scheme)?.rm(uri, credential)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
