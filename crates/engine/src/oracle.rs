// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The staleness decision itself: given a job's targets and deps, does it
//! need to run again?
//!
//! The per-URI hash-cache consultation (does a dep's *content* still
//! match what was last seen) lives in the resource adapters, which call
//! into `strata_storage::HashCache`. What lives here is the comparison
//! those probed timestamps feed into, plus the per-run memoization that
//! keeps a dependency shared by many jobs from being probed once per
//! consumer.

use crate::error::EngineError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use strata_adapters::AdapterRegistry;
use strata_core::job::Job;
use strata_core::metadata::MetadataTable;
use strata_core::table::JobTable;
use strata_core::uri::Uri;

/// Per-run memo of "what time does this dependency report", keyed by URI
/// string. A per-key lock guards each entry's computation so hashing one
/// dependency never blocks a probe of an unrelated one; a short-lived
/// outer lock only guards the key's first insertion.
///
/// Mirrors the origin's cache-first-answer-wins behavior: whichever job
/// asks about a URI first fixes the answer (including the `use_hash` it
/// asked with) for every later asker in the same run.
#[derive(Default)]
pub struct TimeOfDepCache {
    cells: Mutex<HashMap<String, Arc<Mutex<Option<f64>>>>>,
}

impl TimeOfDepCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_compute(
        &self,
        key: &str,
        compute: impl FnOnce() -> Result<f64, EngineError>,
    ) -> Result<f64, EngineError> {
        let cell = {
            let mut cells = self.cells.lock();
            Arc::clone(cells.entry(key.to_string()).or_insert_with(|| Arc::new(Mutex::new(None))))
        };
        let mut slot = cell.lock();
        if let Some(value) = *slot {
            return Ok(value);
        }
        let value = compute()?;
        *slot = Some(value);
        Ok(value)
    }
}

pub struct StalenessOracle {
    registry: Arc<AdapterRegistry>,
    metadata: Arc<MetadataTable>,
    table: Arc<JobTable>,
}

impl StalenessOracle {
    pub fn new(registry: Arc<AdapterRegistry>, metadata: Arc<MetadataTable>, table: Arc<JobTable>) -> Self {
        Self { registry, metadata, table }
    }

    /// `true` iff `job` must be (re-)executed: a target is missing, or
    /// the newest dependency is strictly newer than the oldest target.
    /// Phony jobs are always stale — they have no filesystem identity to
    /// compare against.
    pub fn needs_update(&self, job: &Job, cache: &TimeOfDepCache) -> Result<bool, EngineError> {
        if job.kind.is_phony() {
            return Ok(true);
        }

        let t_targets = match self.min_target_mtime(job) {
            Ok(t) => t,
            Err(_) => {
                // A missing target means a rebuild regardless, but still
                // warm the hash cache for every dependency so a
                // subsequent no-op run has something to compare against.
                for dep in &job.deps_unique {
                    let _ = self.time_of_dep(job, dep, cache);
                }
                return Ok(true);
            }
        };

        let mut t_deps_max = f64::NEG_INFINITY;
        for dep in &job.deps_unique {
            match self.time_of_dep(job, dep, cache) {
                Ok(t) => t_deps_max = t_deps_max.max(t),
                Err(_) => return Ok(true),
            }
        }
        Ok(t_deps_max > t_targets)
    }

    fn min_target_mtime(&self, job: &Job) -> Result<f64, EngineError> {
        let mut min = f64::INFINITY;
        for target in &job.targets {
            let uri = Uri::parse(target)?;
            let credential = self.metadata.credential(target);
            let t = self.registry.mtime(&uri, credential.as_deref(), false)?;
            min = min.min(t);
        }
        Ok(min)
    }

    /// A dep that names another declared job's phony target is a grouping
    /// or ordering node, not a resource — it has no mtime of its own and
    /// never makes a dependent stale on its own account. Only deps backed
    /// by a real resource (a file job's target, or a name nobody declares
    /// a rule for) go through the adapter mtime probe.
    fn time_of_dep(&self, job: &Job, dep: &str, cache: &TimeOfDepCache) -> Result<f64, EngineError> {
        if self.table.job_of_target(dep).is_some_and(|j| j.kind.is_phony()) {
            return Ok(f64::NEG_INFINITY);
        }
        cache.get_or_compute(dep, || {
            let uri = Uri::parse(dep)?;
            let credential = self.metadata.credential(dep);
            Ok(self.registry.mtime(&uri, credential.as_deref(), job.use_hash())?)
        })
    }
}

#[cfg(test)]
#[path = "oracle_tests.rs"]
mod tests;
