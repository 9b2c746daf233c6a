// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-threaded cooperative runtime that steps every [`Task`] in
//! the graph: a priority queue of runnable tasks, serviced by one
//! dedicated thread, re-enqueuing waiters once the task they waited on
//! reports done.

use crate::graph::Node;
use crate::task::{Step, Task};
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Where a task goes once its wait chain is satisfied and it is ready to
/// actually run its node. The worker pool implements this; tests can
/// stand in a bare closure-backed sink.
pub trait JobSink: Send + Sync {
    fn push(&self, node: Arc<Node>, task: Arc<Task>);
}

struct QueueItem {
    priority: i64,
    seq: u64,
    task: Arc<Task>,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}
impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    /// `BinaryHeap` is a max-heap; invert priority and sequence so the
    /// item popped first is the lowest priority, and among equal
    /// priorities the one enqueued first (declaration-order tiebreak).
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other.priority.cmp(&self.priority).then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Coordinator {
    queue: Mutex<BinaryHeap<QueueItem>>,
    cond: Condvar,
    seq: AtomicU64,
    stop: AtomicBool,
}

impl Coordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(BinaryHeap::new()),
            cond: Condvar::new(),
            seq: AtomicU64::new(0),
            stop: AtomicBool::new(false),
        })
    }

    /// Start the dedicated stepping thread. `sink` receives every node
    /// whose task has finished waiting on its children and is ready to
    /// run.
    pub fn start(self: &Arc<Self>, sink: Arc<dyn JobSink>) -> std::io::Result<JoinHandle<()>> {
        let this = Arc::clone(self);
        std::thread::Builder::new().name("strata-coordinator".to_string()).spawn(move || this.run(sink))
    }

    pub fn enqueue(&self, task: Arc<Task>) {
        if self.stop.load(Ordering::Acquire) {
            return;
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let priority = task.priority;
        self.queue.lock().push(QueueItem { priority, seq, task });
        self.cond.notify_one();
    }

    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
        self.cond.notify_all();
    }

    fn run(&self, sink: Arc<dyn JobSink>) {
        loop {
            let item = {
                let mut queue = self.queue.lock();
                loop {
                    if self.stop.load(Ordering::Acquire) {
                        return;
                    }
                    if let Some(item) = queue.pop() {
                        break item;
                    }
                    self.cond.wait(&mut queue);
                }
            };
            let task = item.task;
            let mut push = |node: Arc<Node>, task: Arc<Task>| sink.push(node, task);
            match task.step(&mut push) {
                Step::Continue => self.enqueue(task),
                Step::Yield(_child) => {
                    // Registered as a waiter in `step`; the child's
                    // completion re-enqueues us, nothing to do here.
                }
                Step::Parked => {
                    // Handed to the worker pool; it re-enqueues us
                    // directly once the node is done.
                }
                Step::Done => {
                    for waiter in task.complete() {
                        self.enqueue(waiter);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
