// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The elastic worker pool: one general priority queue plus a serial
//! queue gated by a counting semaphore, serviced by threads that spawn on
//! demand (up to `n_max`, below a load-average ceiling) and exit once the
//! general queue runs dry.

use crate::coordinator::{Coordinator, JobSink};
use crate::error::EngineError;
use crate::graph::Node;
use crate::oracle::{StalenessOracle, TimeOfDepCache};
use crate::task::Task;
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;
use strata_adapters::AdapterRegistry;
use strata_core::metadata::MetadataTable;
use strata_core::table::JobTable;
use strata_core::uri::Uri;
use tracing::{error, info, warn};

struct JobQueueItem {
    priority: i64,
    seq: u64,
    node: Arc<Node>,
}

impl PartialEq for JobQueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}
impl Eq for JobQueueItem {}
impl PartialOrd for JobQueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}
impl Ord for JobQueueItem {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other.priority.cmp(&self.priority).then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct JobQueue {
    heap: Mutex<BinaryHeap<JobQueueItem>>,
    cond: Condvar,
}

impl JobQueue {
    fn push(&self, node: Arc<Node>, priority: i64, seq: u64) {
        self.heap.lock().push(JobQueueItem { priority, seq, node });
        self.cond.notify_one();
    }

    fn try_pop(&self) -> Option<Arc<Node>> {
        self.heap.lock().pop().map(|item| item.node)
    }

    /// Pop, blocking up to `timeout`. `None` means the queue stayed empty
    /// the whole time — the elastic-pool signal to let this worker exit.
    fn pop_timeout(&self, timeout: Duration) -> Option<Arc<Node>> {
        let mut heap = self.heap.lock();
        if heap.is_empty() {
            self.cond.wait_for(&mut heap, timeout);
        }
        heap.pop().map(|item| item.node)
    }
}

/// A plain counting semaphore: `n_serial` admits at most that many serial
/// jobs running concurrently. Only `try_acquire` is needed — the worker
/// loop never blocks on it, it falls back to the general queue instead.
struct Semaphore {
    permits: AtomicUsize,
    capacity: usize,
}

impl Semaphore {
    fn new(capacity: usize) -> Self {
        Self { permits: AtomicUsize::new(0), capacity }
    }

    fn try_acquire(&self) -> bool {
        loop {
            let current = self.permits.load(Ordering::Acquire);
            if current >= self.capacity {
                return false;
            }
            if self
                .permits
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    fn release(&self) {
        self.permits.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Shared stop/fatal-error signal the coordinator, pool, and driver all
/// watch. Standing in for `thread.interrupt_main()`: there is no signal
/// to deliver to a specific blocked thread in safe Rust, so callers
/// blocked on a `DoneFlag` or this condvar re-check it on every wake.
#[derive(Default)]
pub struct Shutdown {
    stop: AtomicBool,
    fatal: Mutex<Option<String>>,
    cond: Condvar,
}

impl Shutdown {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn fatal_error(&self) -> Option<String> {
        self.fatal.lock().clone()
    }

    fn die(&self, reason: String) {
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(reason);
        }
        drop(fatal);
        self.stop.store(true, Ordering::Release);
        self.cond.notify_all();
    }

    pub fn wait_timeout(&self, timeout: Duration) {
        let mut fatal = self.fatal.lock();
        if fatal.is_none() && !self.stop.load(Ordering::Acquire) {
            self.cond.wait_for(&mut fatal, timeout);
        }
    }
}

pub struct WorkerPoolConfig {
    pub n_max: usize,
    pub n_serial: usize,
    pub load_average: f64,
    pub keep_going: bool,
    pub dry_run: bool,
}

pub struct WorkerPool {
    general: JobQueue,
    serial: JobQueue,
    serial_semaphore: Semaphore,
    config: WorkerPoolConfig,
    active_threads: AtomicI64,
    handles: Mutex<Vec<JoinHandle<()>>>,
    n_running: AtomicUsize,
    seq: AtomicU64,
    coordinator: Arc<Coordinator>,
    registry: Arc<AdapterRegistry>,
    metadata: Arc<MetadataTable>,
    oracle: StalenessOracle,
    time_cache: TimeOfDepCache,
    shutdown: Arc<Shutdown>,
    deferred_errors: Mutex<Vec<(String, String)>>,
    self_ref: Weak<WorkerPool>,
}

impl WorkerPool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: WorkerPoolConfig,
        coordinator: Arc<Coordinator>,
        registry: Arc<AdapterRegistry>,
        metadata: Arc<MetadataTable>,
        table: Arc<JobTable>,
        shutdown: Arc<Shutdown>,
    ) -> Arc<Self> {
        let n_serial = config.n_serial.max(1);
        let oracle = StalenessOracle::new(Arc::clone(&registry), Arc::clone(&metadata), table);
        Arc::new_cyclic(|weak| Self {
            general: JobQueue::default(),
            serial: JobQueue::default(),
            serial_semaphore: Semaphore::new(n_serial),
            config,
            active_threads: AtomicI64::new(0),
            handles: Mutex::new(Vec::new()),
            n_running: AtomicUsize::new(0),
            seq: AtomicU64::new(0),
            coordinator,
            registry,
            metadata,
            oracle,
            time_cache: TimeOfDepCache::new(),
            shutdown,
            deferred_errors: Mutex::new(Vec::new()),
            self_ref: weak.clone(),
        })
    }

    /// Queue `node` for execution and, if the elastic-spawn condition
    /// allows it, start a new worker thread.
    pub fn push(&self, node: Arc<Node>, _task: Arc<Task>) {
        // `node.task` is wired up once, by the graph builder; the task
        // handed back here is always that same task.
        let priority = node.job.priority;
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        if node.job.is_serial() {
            self.serial.push(Arc::clone(&node), priority, seq);
        } else {
            self.general.push(node, priority, seq);
        }

        let current = self.active_threads.load(Ordering::Acquire);
        let n_max = self.config.n_max.max(1) as i64;
        if current < 1 || (current < n_max && load_average_now() <= self.config.load_average) {
            self.spawn_worker();
        }
    }

    fn spawn_worker(&self) {
        let Some(pool) = self.self_ref.upgrade() else { return };
        self.active_threads.fetch_add(1, Ordering::AcqRel);
        let handle = std::thread::Builder::new()
            .name("strata-worker".to_string())
            .spawn(move || {
                pool.worker_loop();
                pool.active_threads.fetch_sub(1, Ordering::AcqRel);
            });
        match handle {
            Ok(handle) => self.handles.lock().push(handle),
            Err(err) => {
                self.active_threads.fetch_sub(1, Ordering::AcqRel);
                warn!(error = %err, "failed to spawn a worker thread, continuing with fewer workers");
            }
        }
    }

    /// Block until every spawned worker thread has exited. Re-checks for
    /// newly spawned threads added while draining, since `push` can still
    /// be racing with this call.
    pub fn wait(&self) {
        loop {
            let handle = self.handles.lock().pop();
            match handle {
                Some(handle) => {
                    let _ = handle.join();
                }
                None => break,
            }
        }
    }

    pub fn take_deferred_errors(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.deferred_errors.lock())
    }

    fn worker_loop(&self) {
        loop {
            if self.shutdown.is_stopped() {
                return;
            }

            let node = if self.serial_semaphore.try_acquire() {
                match self.serial.try_pop() {
                    Some(node) => Some((node, true)),
                    None => {
                        self.serial_semaphore.release();
                        None
                    }
                }
            } else {
                None
            };

            let (node, is_serial) = match node {
                Some(pair) => pair,
                None => match self.general.pop_timeout(Duration::from_millis(10)) {
                    Some(node) => (node, false),
                    None => return, // elastic shrink: nothing to do
                },
            };

            self.run_one(&node);

            node.done.set();
            if let Some(task) = node.task.lock().clone() {
                self.coordinator.enqueue(task);
            }
            if is_serial {
                self.serial_semaphore.release();
            }
        }
    }

    fn run_one(&self, node: &Arc<Node>) {
        let needs_update = if self.config.dry_run && node.children.iter().any(Node::was_executed) {
            true
        } else {
            match self.oracle.needs_update(&node.job, &self.time_cache) {
                Ok(v) => v,
                Err(err) => {
                    warn!(job_target = node.primary_target(), error = %err, "staleness probe failed, rebuilding");
                    true
                }
            }
        };

        if !needs_update {
            *node.successed.lock() = true;
            return;
        }

        if self.config.load_average.is_finite() {
            while self.n_running.load(Ordering::Acquire) > 0
                && load_average_now() > self.config.load_average
            {
                std::thread::sleep(Duration::from_secs(1));
            }
        }

        self.n_running.fetch_add(1, Ordering::AcqRel);
        let result = if self.config.dry_run {
            info!(job_target = node.primary_target(), "would execute (dry run)");
            Ok(())
        } else {
            node.job.action.run(&node.job).map_err(|e| e.to_string())
        };
        self.n_running.fetch_sub(1, Ordering::AcqRel);

        match result {
            Ok(()) => {
                *node.executed.lock() = true;
                *node.successed.lock() = true;
            }
            Err(reason) => {
                error!(job_target = node.primary_target(), error = %reason, "action failed");
                if node.job.kind.is_file() {
                    self.rm_targets(&node.job.targets);
                }
                if self.config.keep_going {
                    self.deferred_errors.lock().push((node.primary_target().to_string(), reason));
                } else {
                    self.die(format!("{}: {reason}", node.primary_target()));
                }
            }
        }
    }

    fn rm_targets(&self, targets: &[String]) {
        for target in targets {
            if self.metadata.keep(target) {
                continue;
            }
            let uri = match Uri::parse(target) {
                Ok(uri) => uri,
                Err(err) => {
                    warn!(job_target = %target, error = %err, "failed to remove target: could not parse its URI");
                    continue;
                }
            };
            let credential = self.metadata.credential(target);
            match self.registry.rm(&uri, credential.as_deref()) {
                Ok(()) | Err(strata_adapters::AdapterError::NotFound { .. }) => {}
                Err(err) => warn!(job_target = %target, error = %err, "failed to remove target after a failed action"),
            }
        }
    }

    /// The `_die` sequence: log, stop the world, terminate anything an
    /// action spawned, and let callers observe the fatal reason through
    /// [`Shutdown::fatal_error`].
    fn die(&self, reason: String) {
        error!(reason = %reason, "stopping the build after a fatal action failure");
        self.shutdown.die(reason);
        self.coordinator.shutdown();
        terminate_subprocesses();
    }
}

impl JobSink for WorkerPool {
    fn push(&self, node: Arc<Node>, task: Arc<Task>) {
        WorkerPool::push(self, node, task)
    }
}

/// One-minute load average, or `0.0` on platforms/environments where it
/// cannot be read (containers without `/proc/loadavg`, for instance) —
/// treated as "no load", never blocking admission.
fn load_average_now() -> f64 {
    sysinfo::System::load_average().one
}

/// Walk the OS process tree rooted at our own pid and send every
/// descendant `SIGTERM`. We never track spawned child pids ourselves —
/// an action is arbitrary code and may itself fork — so cleanup asks the
/// OS who our descendants are rather than trusting our own bookkeeping.
fn terminate_subprocesses() {
    let Ok(own) = sysinfo::get_current_pid() else { return };
    let system = sysinfo::System::new_all();

    let mut descendants = Vec::new();
    let mut frontier = vec![own];
    while let Some(parent) = frontier.pop() {
        for (pid, process) in system.processes() {
            if process.parent() == Some(parent) && !descendants.contains(pid) {
                descendants.push(*pid);
                frontier.push(*pid);
            }
        }
    }

    for pid in descendants {
        let raw = nix::unistd::Pid::from_raw(pid.as_u32() as i32);
        if let Err(err) = nix::sys::signal::kill(raw, nix::sys::signal::Signal::SIGTERM) {
            warn!(pid = pid.as_u32(), error = %err, "failed to terminate a child process during shutdown");
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
