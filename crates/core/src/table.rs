// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `job_of_target` registry: maps every declared target to the job
//! that produces it.

use crate::error::CoreError;
use crate::job::Job;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all declared jobs, indexed by target.
///
/// Re-registering a target is only permitted when it names the exact same
/// job (the identical `Arc`, e.g. from re-running a build script that
/// re-declares the same rule) — a no-op. Any other re-registration, even
/// one that looks equivalent, is rejected: two distinct job declarations
/// fighting over one target is almost always a build-script bug.
#[derive(Default)]
pub struct JobTable {
    by_target: RwLock<HashMap<String, Arc<Job>>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every target of `job`. Returns `job` back for chaining.
    pub fn register(&self, job: Arc<Job>) -> Result<Arc<Job>, CoreError> {
        let mut by_target = self.by_target.write();
        for target in &job.targets {
            if let Some(existing) = by_target.get(target) {
                if Arc::ptr_eq(existing, &job) {
                    continue;
                }
                return Err(CoreError::DuplicateTarget { target: target.clone() });
            }
        }
        for target in &job.targets {
            by_target.insert(target.clone(), Arc::clone(&job));
        }
        Ok(job)
    }

    pub fn job_of_target(&self, target: &str) -> Option<Arc<Job>> {
        self.by_target.read().get(target).cloned()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.by_target.read().contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.by_target.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All distinct jobs currently registered, deduplicated by pointer
    /// identity (a multi-target job would otherwise be counted once per
    /// target).
    pub fn jobs(&self) -> Vec<Arc<Job>> {
        let by_target = self.by_target.read();
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for job in by_target.values() {
            let ptr = Arc::as_ptr(job) as *const ();
            if seen.insert(ptr) {
                out.push(Arc::clone(job));
            }
        }
        out
    }

    pub fn targets(&self) -> Vec<String> {
        self.by_target.read().keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
