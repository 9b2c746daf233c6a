// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job declarations: the immutable "what to build" half of a job.
//!
//! Mutable execution state (the cooperative task, the `done` signal,
//! whether the job executed/succeeded) belongs to the graph node that
//! wraps a job at run time — see `strata_engine::graph`. Splitting it this
//! way means a declared [`Job`] can be shared (via `Arc`) across every
//! root ancestry that reaches it without any run-specific state leaking
//! between invocations.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Error surfaced by a user-provided [`Action`]. Actions are arbitrary
/// code (shell-outs, in-process work); we box rather than thread a generic
/// parameter through the whole engine for it.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The callable that does a job's actual work.
///
/// Runs on a worker thread, never on the coordinator. `run` takes `&Job`
/// so an action can read its own declared targets/deps/data bag.
pub trait Action: Send + Sync {
    fn run(&self, job: &Job) -> Result<(), ActionError>;
}

/// Default action for a job with nothing to execute (a pure grouping
/// phony, or a target whose only purpose is to gate its dependents).
pub struct NoopAction;

impl Action for NoopAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        Ok(())
    }
}

impl<F> Action for F
where
    F: Fn(&Job) -> Result<(), ActionError> + Send + Sync,
{
    fn run(&self, job: &Job) -> Result<(), ActionError> {
        self(job)
    }
}

/// File jobs and phony jobs share most of their shape; this carries the
/// handful of fields that only make sense for one or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Produces concrete URI targets on disk/remote storage.
    File {
        /// Must run under the global serial-admission semaphore.
        serial: bool,
        /// Consult the content-hash cache in addition to raw mtime.
        use_hash: bool,
    },
    /// A single symbolic target; execution is purely informational
    /// (grouping other jobs). Always considered stale — it has no
    /// filesystem identity to compare mtimes against.
    Phony,
}

impl JobKind {
    pub fn is_file(&self) -> bool {
        matches!(self, JobKind::File { .. })
    }

    pub fn is_phony(&self) -> bool {
        matches!(self, JobKind::Phony)
    }

    pub fn serial(&self) -> bool {
        matches!(self, JobKind::File { serial: true, .. })
    }

    pub fn use_hash(&self) -> bool {
        matches!(self, JobKind::File { use_hash: true, .. })
    }
}

/// A declared job: one or more targets produced from zero or more
/// dependencies by running `action`.
pub struct Job {
    pub kind: JobKind,
    pub targets: Vec<String>,
    pub deps: Vec<String>,
    /// `deps` deduplicated, preserving the first occurrence of each
    /// dependency — this is the order used to break scheduling ties.
    pub deps_unique: Vec<String>,
    pub action: Arc<dyn Action>,
    /// Lower values are scheduled earlier among otherwise-ready jobs.
    pub priority: i64,
    pub desc: Option<String>,
    /// Open, rule-specific key/value bag. The engine never reads this;
    /// only user actions do.
    pub data: Mutex<HashMap<String, serde_json::Value>>,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("kind", &self.kind)
            .field("targets", &self.targets)
            .field("deps", &self.deps)
            .field("priority", &self.priority)
            .finish()
    }
}

fn dedup_preserve_order(items: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item.clone());
        }
    }
    out
}

impl Job {
    /// The first target, used for logs/errors that want a single name to
    /// print (every job, file or phony, has at least one).
    pub fn primary_target(&self) -> &str {
        self.targets.first().map(String::as_str).unwrap_or("")
    }

    pub fn is_serial(&self) -> bool {
        self.kind.serial()
    }

    pub fn use_hash(&self) -> bool {
        self.kind.use_hash()
    }
}

/// Builder for a file job declaration. Mirrors the shape suggested for a
/// language-neutral declaration surface: `engine.file(targets, deps)
/// .action(f).register(&table)`.
pub struct FileJobBuilder {
    targets: Vec<String>,
    deps: Vec<String>,
    desc: Option<String>,
    use_hash: bool,
    serial: bool,
    priority: i64,
    action: Arc<dyn Action>,
}

impl FileJobBuilder {
    pub fn new<T, D>(targets: T, deps: D) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            deps: deps.into_iter().map(Into::into).collect(),
            desc: None,
            use_hash: false,
            serial: false,
            priority: 0,
            action: Arc::new(NoopAction),
        }
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn use_hash(mut self, use_hash: bool) -> Self {
        self.use_hash = use_hash;
        self
    }

    pub fn serial(mut self, serial: bool) -> Self {
        self.serial = serial;
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn action(mut self, action: impl Action + 'static) -> Self {
        self.action = Arc::new(action);
        self
    }

    pub fn build(self) -> Result<Arc<Job>, crate::error::CoreError> {
        if self.targets.is_empty() {
            return Err(crate::error::CoreError::NoTargets);
        }
        let deps_unique = dedup_preserve_order(&self.deps);
        Ok(Arc::new(Job {
            kind: JobKind::File { serial: self.serial, use_hash: self.use_hash },
            targets: self.targets,
            deps: self.deps,
            deps_unique,
            action: self.action,
            priority: self.priority,
            desc: self.desc,
            data: Mutex::new(HashMap::new()),
        }))
    }
}

/// Builder for a phony job declaration: exactly one symbolic target.
pub struct PhonyJobBuilder {
    target: String,
    deps: Vec<String>,
    desc: Option<String>,
    priority: i64,
    action: Arc<dyn Action>,
}

impl PhonyJobBuilder {
    pub fn new<D>(target: impl Into<String>, deps: D) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            target: target.into(),
            deps: deps.into_iter().map(Into::into).collect(),
            desc: None,
            priority: 0,
            action: Arc::new(NoopAction),
        }
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn action(mut self, action: impl Action + 'static) -> Self {
        self.action = Arc::new(action);
        self
    }

    pub fn build(self) -> Arc<Job> {
        let deps_unique = dedup_preserve_order(&self.deps);
        Arc::new(Job {
            kind: JobKind::Phony,
            targets: vec![self.target],
            deps: self.deps,
            deps_unique,
            action: self.action,
            priority: self.priority,
            desc: self.desc,
            data: Mutex::new(HashMap::new()),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct JobBuilder => Job {
        set {
            kind: JobKind = JobKind::File { serial: false, use_hash: false },
            targets: Vec<String> = vec!["test-target".to_string()],
            deps: Vec<String> = Vec::new(),
            deps_unique: Vec<String> = Vec::new(),
            action: Arc<dyn Action> = Arc::new(NoopAction),
            priority: i64 = 0,
        }
        option {
            desc: String = None,
        }
        computed {
            data: Mutex<HashMap<String, serde_json::Value>> = Mutex::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
