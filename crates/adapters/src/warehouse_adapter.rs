// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter for table-warehouse-backed schemes (e.g. `bq://project.dataset.table`).
//!
//! Warehouses have no native content digest, so `use_hash` is ignored —
//! this adapter always reports the raw last-modification time, per §4.1.

use crate::error::AdapterError;
use crate::registry::ResourceAdapter;
use chrono::DateTime;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use strata_core::Uri;

#[derive(Default)]
struct ClientCache {
    agents: Mutex<HashMap<(Option<String>, String), ureq::Agent>>,
}

impl ClientCache {
    fn agent_for(&self, credential: Option<&str>, project: &str) -> ureq::Agent {
        let key = (credential.map(str::to_string), project.to_string());
        let mut agents = self.agents.lock();
        agents
            .entry(key)
            .or_insert_with(|| ureq::AgentBuilder::new().timeout(Duration::from_secs(30)).build())
            .clone()
    }
}

pub struct WarehouseAdapter {
    clients: ClientCache,
    endpoint: String,
}

impl WarehouseAdapter {
    pub fn new() -> Self {
        Self { clients: ClientCache::default(), endpoint: "https://bigquery.googleapis.com/tables".to_string() }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self { clients: ClientCache::default(), endpoint: endpoint.into() }
    }

    fn table_url(&self, uri: &Uri) -> String {
        format!("{}/{}", self.endpoint, uri.netloc)
    }
}

impl Default for WarehouseAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn map_ureq_error(uri: &str, err: ureq::Error) -> AdapterError {
    match err {
        ureq::Error::Status(404, _) => AdapterError::NotFound { uri: uri.to_string() },
        other => AdapterError::Transport { uri: uri.to_string(), reason: other.to_string() },
    }
}

impl ResourceAdapter for WarehouseAdapter {
    fn mtime(&self, uri: &Uri, credential: Option<&str>, _use_hash: bool) -> Result<f64, AdapterError> {
        let agent = self.clients.agent_for(credential, &uri.netloc);
        let url = self.table_url(uri);
        let uri_string = uri.to_string();
        let response = agent.head(&url).call().map_err(|e| map_ureq_error(&uri_string, e))?;
        let epoch = response
            .header("Last-Modified")
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.timestamp() as f64)
            .unwrap_or(0.0);
        Ok(epoch)
    }

    fn rm(&self, uri: &Uri, credential: Option<&str>) -> Result<(), AdapterError> {
        let agent = self.clients.agent_for(credential, &uri.netloc);
        let url = self.table_url(uri);
        let uri_string = uri.to_string();
        agent.delete(&url).call().map_err(|e| map_ureq_error(&uri_string, e))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "warehouse_adapter_tests.rs"]
mod tests;
