// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by this crate's own tests and by downstream crates'
//! test suites (gated behind the `test-support` feature so production
//! builds never pull it in).

use crate::job::{Action, ActionError, FileJobBuilder, Job, PhonyJobBuilder};
use crate::table::JobTable;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An action that records how many times it ran, for assertions like
/// "this job executed exactly once even though three dependents reached it".
#[derive(Default)]
pub struct RecordingAction {
    pub runs: AtomicUsize,
}

impl RecordingAction {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Action for RecordingAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An action that always fails, for exercising `--keep-going` and error
/// propagation paths.
pub struct AlwaysFailAction {
    pub message: &'static str,
}

impl Action for AlwaysFailAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        Err(self.message.into())
    }
}

/// Build a trivial diamond graph: `all` depends on `b` and `c`, both of
/// which depend on `a`. Useful as a quick fixture for graph/oracle/
/// coordinator tests that don't care about the specific shape.
pub fn diamond_graph() -> (Arc<JobTable>, Arc<RecordingAction>) {
    let table = Arc::new(JobTable::new());
    let action = RecordingAction::new();

    let a = FileJobBuilder::new(vec!["a".to_string()], Vec::<String>::new())
        .build()
        .expect("valid job");
    table.register(a).expect("register a");

    let b = FileJobBuilder::new(vec!["b".to_string()], vec!["a".to_string()])
        .build()
        .expect("valid job");
    table.register(b).expect("register b");

    let c = FileJobBuilder::new(vec!["c".to_string()], vec!["a".to_string()])
        .build()
        .expect("valid job");
    table.register(c).expect("register c");

    let all = PhonyJobBuilder::new("all", vec!["b".to_string(), "c".to_string()]).build();
    table.register(all).expect("register all");

    (table, action)
}

/// A job table containing a direct cycle: `x` depends on `y`, `y` depends
/// on `x`.
pub fn cyclic_graph() -> Arc<JobTable> {
    let table = Arc::new(JobTable::new());
    let x = FileJobBuilder::new(vec!["x".to_string()], vec!["y".to_string()])
        .build()
        .expect("valid job");
    table.register(x).expect("register x");
    let y = FileJobBuilder::new(vec!["y".to_string()], vec!["x".to_string()])
        .build()
        .expect("valid job");
    table.register(y).expect("register y");
    table
}
