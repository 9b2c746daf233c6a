// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level orchestration: build the graph for a set of root targets,
//! wire up the coordinator and worker pool, push the roots, and wait.
//!
//! Declaration and graph-shape errors (cycles, `--cut` conflicts) surface
//! before a single action runs. Everything after that point — staleness
//! probe failures, action failures — is absorbed into the run's report
//! rather than returned as an `Err`, matching the policy that only a
//! build-script bug is fatal-before-actions; everything else is a build
//! outcome to report.

use crate::coordinator::{Coordinator, JobSink};
use crate::error::EngineError;
use crate::graph::Node;
use crate::pool::{Shutdown, WorkerPool, WorkerPoolConfig};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use strata_adapters::AdapterRegistry;
use strata_core::metadata::MetadataTable;
use strata_core::table::JobTable;

pub struct DriverConfig {
    pub n_max: usize,
    pub n_serial: usize,
    pub load_average: f64,
    pub keep_going: bool,
    pub dry_run: bool,
    pub cut: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { n_max: 1, n_serial: 1, load_average: f64::INFINITY, keep_going: false, dry_run: false, cut: Vec::new() }
    }
}

/// Outcome of a build run. `fatal_error` is set only when `keep_going`
/// was off and an action failed — or an internal invariant was violated
/// (worker spawn failure) after execution had already started, the two
/// cases this crate treats as unrecoverable mid-run.
pub struct RunReport {
    pub executed: Vec<String>,
    pub deferred_errors: Vec<(String, String)>,
    pub fatal_error: Option<String>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.fatal_error.is_none() && self.deferred_errors.is_empty()
    }
}

pub struct Driver {
    table: Arc<JobTable>,
    metadata: Arc<MetadataTable>,
    registry: Arc<AdapterRegistry>,
    config: DriverConfig,
}

impl Driver {
    pub fn new(
        table: Arc<JobTable>,
        metadata: Arc<MetadataTable>,
        registry: Arc<AdapterRegistry>,
        config: DriverConfig,
    ) -> Self {
        Self { table, metadata, registry, config }
    }

    /// Resolve `roots` into a dependency graph without running anything.
    /// Used directly by the description/dependency-dump CLI modes.
    pub fn build_graph(&self, roots: &[String]) -> Result<Vec<Arc<Node>>, EngineError> {
        crate::graph::GraphBuilder::new(&self.table, &self.metadata, &self.config.cut).build(roots)
    }

    pub fn run(&self, roots: &[String]) -> Result<RunReport, EngineError> {
        let nodes = self.build_graph(roots)?;

        let shutdown = Shutdown::new();
        let coordinator = Coordinator::new();
        let pool_config = WorkerPoolConfig {
            n_max: self.config.n_max,
            n_serial: self.config.n_serial,
            load_average: self.config.load_average,
            keep_going: self.config.keep_going,
            dry_run: self.config.dry_run,
        };
        let pool = WorkerPool::new(
            pool_config,
            Arc::clone(&coordinator),
            Arc::clone(&self.registry),
            Arc::clone(&self.metadata),
            Arc::clone(&self.table),
            Arc::clone(&shutdown),
        );
        let coordinator_handle = coordinator.start(Arc::clone(&pool) as Arc<dyn JobSink>)?;

        for node in &nodes {
            if let Some(task) = node.task.lock().clone() {
                coordinator.enqueue(task);
            }
        }

        for node in &nodes {
            while !node.done.wait_timeout(Duration::from_secs(1)) {
                if shutdown.is_stopped() {
                    break;
                }
            }
        }

        pool.wait();
        coordinator.shutdown();
        let _ = coordinator_handle.join();

        Ok(RunReport {
            executed: collect_executed(&nodes),
            deferred_errors: pool.take_deferred_errors(),
            fatal_error: shutdown.fatal_error(),
        })
    }
}

fn collect_executed(roots: &[Arc<Node>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut stack: Vec<Arc<Node>> = roots.to_vec();
    while let Some(node) = stack.pop() {
        let ptr = Arc::as_ptr(&node) as *const ();
        if !seen.insert(ptr) {
            continue;
        }
        if node.was_executed() {
            out.push(node.primary_target().to_string());
        }
        stack.extend(node.children.iter().cloned());
    }
    out
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
