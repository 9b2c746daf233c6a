// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter for object-store-backed schemes (e.g. `gs://bucket/key`).
//!
//! The client internals are incidental — what matters is the
//! `{mtime, rm}` capability set and that `use_hash` gets a real content
//! digest. We talk to the store over plain HTTP: a `HEAD` for metadata
//! (`Last-Modified`, `ETag` as the digest), `DELETE` for `rm`. A
//! production deployment would swap this transport for the provider's
//! own SDK without touching the rest of the engine.

use crate::error::AdapterError;
use crate::registry::ResourceAdapter;
use chrono::DateTime;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strata_core::Uri;
use strata_storage::HashCache;

/// One entry per `(credential, bucket)` pair: the client-connection
/// cache every adapter is expected to keep.
#[derive(Default)]
struct ClientCache {
    agents: Mutex<HashMap<(Option<String>, String), ureq::Agent>>,
}

impl ClientCache {
    fn agent_for(&self, credential: Option<&str>, bucket: &str) -> ureq::Agent {
        let key = (credential.map(str::to_string), bucket.to_string());
        let mut agents = self.agents.lock();
        agents
            .entry(key)
            .or_insert_with(|| {
                ureq::AgentBuilder::new().timeout(Duration::from_secs(30)).build()
            })
            .clone()
    }
}

pub struct ObjectStoreAdapter {
    clients: ClientCache,
    cache: Arc<HashCache>,
    /// Base URL template; `{netloc}` is the bucket, `{path}` the object key.
    endpoint: String,
}

impl ObjectStoreAdapter {
    pub fn new(cache: Arc<HashCache>) -> Self {
        Self { clients: ClientCache::default(), cache, endpoint: "https://storage.googleapis.com".to_string() }
    }

    pub fn with_endpoint(cache: Arc<HashCache>, endpoint: impl Into<String>) -> Self {
        Self { clients: ClientCache::default(), cache, endpoint: endpoint.into() }
    }

    fn object_url(&self, uri: &Uri) -> String {
        format!("{}/{}{}", self.endpoint, uri.netloc, uri.path)
    }
}

struct HeadMeta {
    last_modified_epoch: f64,
    etag: Option<String>,
}

fn head(agent: &ureq::Agent, url: &str, uri: &str) -> Result<HeadMeta, AdapterError> {
    let response = agent.head(url).call().map_err(|e| map_ureq_error(uri, e))?;
    let last_modified_epoch = response
        .header("Last-Modified")
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .map(|dt| dt.timestamp() as f64)
        .unwrap_or(0.0);
    let etag = response.header("ETag").map(|v| v.trim_matches('"').to_string());
    Ok(HeadMeta { last_modified_epoch, etag })
}

fn map_ureq_error(uri: &str, err: ureq::Error) -> AdapterError {
    match err {
        ureq::Error::Status(404, _) => AdapterError::NotFound { uri: uri.to_string() },
        other => AdapterError::Transport { uri: uri.to_string(), reason: other.to_string() },
    }
}

impl ResourceAdapter for ObjectStoreAdapter {
    fn mtime(&self, uri: &Uri, credential: Option<&str>, use_hash: bool) -> Result<f64, AdapterError> {
        let agent = self.clients.agent_for(credential, &uri.netloc);
        let url = self.object_url(uri);
        let uri_string = uri.to_string();
        let meta = head(&agent, &url, &uri_string)?;

        if !use_hash {
            return Ok(meta.last_modified_epoch);
        }
        let etag = meta.etag.clone().unwrap_or_default();
        self.cache
            .resolve(&uri.scheme, &uri.netloc, uri.path(), meta.last_modified_epoch, move || Ok(etag))
            .map_err(|e| AdapterError::Transport { uri: uri_string, reason: e.to_string() })
    }

    fn rm(&self, uri: &Uri, credential: Option<&str>) -> Result<(), AdapterError> {
        let agent = self.clients.agent_for(credential, &uri.netloc);
        let url = self.object_url(uri);
        let uri_string = uri.to_string();
        agent.delete(&url).call().map_err(|e| map_ureq_error(&uri_string, e))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "object_store_adapter_tests.rs"]
mod tests;
