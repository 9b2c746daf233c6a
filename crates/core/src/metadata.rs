// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target metadata: the credential and `keep`-on-failure options.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Options recognized for a single URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Opaque string passed through to the resource adapter (typically a
    /// path to a service-account key or similar credential material).
    pub credential: Option<String>,
    /// If true, failure cleanup must not delete this target.
    pub keep: bool,
}

impl Metadata {
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self { credential: Some(credential.into()), keep: false }
    }

    pub fn keep() -> Self {
        Self { credential: None, keep: true }
    }
}

/// Mapping from URI string to its [`Metadata`]. Unregistered URIs behave as
/// if they carried the default (no credential, not kept).
#[derive(Debug, Default)]
pub struct MetadataTable {
    inner: RwLock<HashMap<String, Metadata>>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record options for a URI. Returns the URI unchanged, mirroring the
    /// `dsl.meta(uri, **kwargs)` convenience of declaring metadata inline
    /// with a dependency list.
    pub fn set(&self, uri: impl Into<String>, metadata: Metadata) -> String {
        let uri = uri.into();
        self.inner.write().insert(uri.clone(), metadata);
        uri
    }

    pub fn get(&self, uri: &str) -> Metadata {
        self.inner.read().get(uri).cloned().unwrap_or_default()
    }

    pub fn credential(&self, uri: &str) -> Option<String> {
        self.inner.read().get(uri).and_then(|m| m.credential.clone())
    }

    pub fn keep(&self, uri: &str) -> bool {
        self.inner.read().get(uri).map(|m| m.keep).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
