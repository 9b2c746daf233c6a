// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency graph construction: turn a set of root targets and a job
//! table into a tree of [`Node`]s, synthesizing leaf jobs for dependencies
//! that have no producing rule and rejecting cycles.
//!
//! A declared [`Job`] is immutable and may be shared across every ancestry
//! that reaches it; a [`Node`] is the one-per-run wrapper that carries its
//! execution state (`done`, `executed`, `successed`) and its resolved
//! children, in the priority order the coordinator should wait on them.

use crate::error::EngineError;
use crate::task::Task;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use strata_core::job::{Job, JobKind, NoopAction};
use strata_core::metadata::{Metadata, MetadataTable};
use strata_core::table::JobTable;

/// Signals a job's terminal state has been reached. Distinct from
/// [`crate::task::Task`]'s own internal done flag: this one is set by a
/// worker thread once an action has run (or been skipped), the task's is
/// set by the coordinator once its generator-equivalent state machine has
/// finished stepping.
#[derive(Default)]
pub struct DoneFlag {
    state: Mutex<bool>,
    cond: Condvar,
}

impl DoneFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        *self.state.lock() = true;
        self.cond.notify_all();
    }

    pub fn is_set(&self) -> bool {
        *self.state.lock()
    }

    /// Block until set, re-checking every second so a caller can also poll
    /// a shutdown signal in between (see `Driver::run`).
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if !*state {
            self.cond.wait_for(&mut state, timeout);
        }
        *state
    }
}

/// A singly linked list of targets currently being resolved, threaded
/// through the recursive descent rather than held in a `Vec` so each
/// recursive call only needs to extend-and-share, not clone-and-own.
#[derive(Clone)]
pub enum CallChain {
    Nil,
    Cons(String, Rc<CallChain>),
}

impl CallChain {
    pub fn push(self: &Rc<Self>, target: impl Into<String>) -> Rc<Self> {
        Rc::new(CallChain::Cons(target.into(), Rc::clone(self)))
    }

    pub fn contains(&self, target: &str) -> bool {
        match self {
            CallChain::Nil => false,
            CallChain::Cons(t, rest) => t == target || rest.contains(target),
        }
    }

    pub fn render(&self) -> String {
        let mut targets = Vec::new();
        let mut cur = self;
        loop {
            match cur {
                CallChain::Nil => break,
                CallChain::Cons(t, rest) => {
                    targets.push(t.as_str());
                    cur = rest;
                }
            }
        }
        targets.reverse();
        targets.join(" -> ")
    }
}

/// Per-run wrapper around a declared [`Job`]: resolved children plus
/// mutable execution state.
pub struct Node {
    pub job: Arc<Job>,
    /// Resolved dependency nodes, sorted by `(priority, declaration order)`.
    pub children: Vec<Arc<Node>>,
    pub done: DoneFlag,
    pub executed: Mutex<bool>,
    pub successed: Mutex<bool>,
    /// The cooperative task driving this node's invocation. Populated once,
    /// by the same call that builds this `Node`, before it is shared.
    pub task: Mutex<Option<Arc<Task>>>,
}

impl Node {
    pub fn primary_target(&self) -> &str {
        self.job.primary_target()
    }

    pub fn was_executed(&self) -> bool {
        *self.executed.lock()
    }

    pub fn succeeded(&self) -> bool {
        *self.successed.lock()
    }
}

/// Resolves root targets into a graph of [`Node`]s.
pub struct GraphBuilder<'a> {
    table: &'a JobTable,
    metadata: &'a MetadataTable,
    cut: &'a [String],
}

impl<'a> GraphBuilder<'a> {
    pub fn new(table: &'a JobTable, metadata: &'a MetadataTable, cut: &'a [String]) -> Self {
        Self { table, metadata, cut }
    }

    /// Build nodes for every root target, reusing one `Node` per target
    /// across the whole traversal (a diamond dependency is visited once).
    pub fn build(&self, roots: &[String]) -> Result<Vec<Arc<Node>>, EngineError> {
        let mut built: HashMap<String, Arc<Node>> = HashMap::new();
        let chain = Rc::new(CallChain::Nil);
        roots.iter().map(|root| self.resolve(root, &chain, &mut built, None)).collect()
    }

    fn resolve(
        &self,
        target: &str,
        chain: &Rc<CallChain>,
        built: &mut HashMap<String, Arc<Node>>,
        required_by: Option<&str>,
    ) -> Result<Arc<Node>, EngineError> {
        if let Some(node) = built.get(target) {
            return Ok(Arc::clone(node));
        }
        if chain.contains(target) {
            return Err(EngineError::Cycle(chain.push(target).render()));
        }

        let job = if self.cut.iter().any(|c| c == target) {
            self.metadata.set(target, Metadata::keep());
            external_input_job(target)
        } else {
            match self.table.job_of_target(target) {
                Some(job) => job,
                None => {
                    self.metadata.set(target, Metadata::keep());
                    no_rule_to_make_job(target, required_by)
                }
            }
        };

        let next_chain = chain.push(target);
        let mut children: Vec<Arc<Node>> = job
            .deps_unique
            .iter()
            .map(|dep| self.resolve(dep, &next_chain, built, Some(target)))
            .collect::<Result<_, _>>()?;
        children.sort_by_key(|c| c.job.priority);

        let node = Arc::new(Node {
            job,
            children,
            done: DoneFlag::new(),
            executed: Mutex::new(false),
            successed: Mutex::new(false),
            task: Mutex::new(None),
        });
        // Every node gets its driving task as soon as it exists, so the
        // coordinator never has to special-case "not wired up yet" when a
        // sibling reaches this node first through a shared dependency.
        *node.task.lock() = Some(Task::new(Arc::clone(&node)));
        built.insert(target.to_string(), Arc::clone(&node));
        Ok(node)
    }
}

/// A job synthesized for a dependency nobody declared a rule for. Marked
/// `keep` via the caller's metadata table so cleanup after a failed
/// sibling never tries to delete something we never built.
fn no_rule_to_make_job(target: &str, required_by: Option<&str>) -> Arc<Job> {
    Arc::new(Job {
        kind: JobKind::File { serial: false, use_hash: false },
        targets: vec![target.to_string()],
        deps: Vec::new(),
        deps_unique: Vec::new(),
        action: missing_rule_action(target, required_by),
        priority: 0,
        desc: None,
        data: parking_lot::Mutex::new(std::collections::HashMap::new()),
    })
}

/// `--cut TARGET`: treat a target as externally provided. It keeps
/// whatever state it already has; the build never runs an action for it
/// and never recurses into what used to produce it.
fn external_input_job(target: &str) -> Arc<Job> {
    Arc::new(Job {
        kind: JobKind::File { serial: false, use_hash: false },
        targets: vec![target.to_string()],
        deps: Vec::new(),
        deps_unique: Vec::new(),
        action: Arc::new(NoopAction),
        priority: 0,
        desc: Some("cut: treated as an external input".to_string()),
        data: parking_lot::Mutex::new(std::collections::HashMap::new()),
    })
}

fn missing_rule_action(target: &str, required_by: Option<&str>) -> Arc<dyn strata_core::job::Action> {
    struct MissingRule {
        target: String,
        required_by: Option<String>,
    }
    impl strata_core::job::Action for MissingRule {
        fn run(&self, _job: &Job) -> Result<(), strata_core::job::ActionError> {
            match &self.required_by {
                Some(parent) => Err(format!(
                    "no rule to make target {:?}, required by {:?}",
                    self.target, parent
                )
                .into()),
                None => Err(format!("no rule to make target {:?}", self.target).into()),
            }
        }
    }
    Arc::new(MissingRule { target: target.to_string(), required_by: required_by.map(str::to_string) })
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
