// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory adapter for engine/cli test suites, avoiding real filesystem
//! or network I/O while still exercising the full `ResourceAdapter` seam.

use crate::error::AdapterError;
use crate::registry::ResourceAdapter;
use parking_lot::Mutex;
use std::collections::HashMap;
use strata_core::Uri;

#[derive(Debug, Clone, Default)]
struct Entry {
    mtime: f64,
    removed: bool,
}

/// Controllable adapter backed by a plain map from URI string to mtime.
/// `use_hash` is accepted but ignored — tests control staleness directly
/// by setting mtimes, so there is nothing for a fake digest to add.
#[derive(Default)]
pub struct FakeAdapter {
    entries: Mutex<HashMap<String, Entry>>,
    removed_log: Mutex<Vec<String>>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mtime(&self, uri: impl Into<String>, mtime: f64) {
        self.entries.lock().entry(uri.into()).or_default().mtime = mtime;
    }

    pub fn remove_now(&self, uri: impl Into<String>) {
        self.entries.lock().remove(&uri.into());
    }

    pub fn rm_log(&self) -> Vec<String> {
        self.removed_log.lock().clone()
    }
}

impl ResourceAdapter for FakeAdapter {
    fn mtime(&self, uri: &Uri, _credential: Option<&str>, _use_hash: bool) -> Result<f64, AdapterError> {
        let key = uri.to_string();
        let entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if !entry.removed => Ok(entry.mtime),
            _ => Err(AdapterError::NotFound { uri: key }),
        }
    }

    fn rm(&self, uri: &Uri, _credential: Option<&str>) -> Result<(), AdapterError> {
        let key = uri.to_string();
        let mut entries = self.entries.lock();
        match entries.get_mut(&key) {
            Some(entry) if !entry.removed => {
                entry.removed = true;
                self.removed_log.lock().push(key);
                Ok(())
            }
            _ => Err(AdapterError::NotFound { uri: key }),
        }
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
