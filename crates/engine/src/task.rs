// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cooperative task that drives one [`Node`]'s invocation: wait on
//! each child in turn, then (if all children succeeded) hand the node to
//! the worker pool and wait for it to come back done.
//!
//! This is the explicit state machine standing in for a generator-based
//! coroutine: each call to [`Task::step`] advances exactly one state and
//! reports what the coordinator should do next. Every field here is only
//! ever touched by the coordinator's single dedicated thread, except
//! `waited` (appended to by whichever task calls `wait` on this one,
//! always itself running on the coordinator thread) and the `Node`
//! fields reached through `node`, which worker threads also write.

use crate::graph::Node;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

enum State {
    WaitChildren,
    Enqueue,
    WaitWorker,
    Finished,
}

/// What the coordinator should do after a [`Task::step`] call.
pub enum Step {
    /// Re-enqueue this task immediately; it has more to do right now.
    Continue,
    /// This task registered itself as a waiter on `child` and must not be
    /// re-enqueued until `child` reports done.
    Yield(Arc<Task>),
    /// This task has been handed to the worker pool. It will be
    /// re-enqueued directly by whichever worker finishes the node, not
    /// through the waiter mechanism.
    Parked,
    /// This task's generator-equivalent has run to completion.
    Done,
}

pub struct Task {
    pub node: Arc<Node>,
    pub priority: i64,
    remaining: Mutex<VecDeque<Arc<Node>>>,
    state: Mutex<State>,
    waited: Mutex<Vec<Arc<Task>>>,
    done: AtomicBool,
}

impl Task {
    pub fn new(node: Arc<Node>) -> Arc<Self> {
        let remaining = node.children.iter().cloned().collect();
        Arc::new(Self {
            node,
            priority: 0,
            remaining: Mutex::new(remaining),
            state: Mutex::new(State::WaitChildren),
            waited: Mutex::new(Vec::new()),
            done: AtomicBool::new(false),
        })
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Register `waiter` to be re-enqueued once this task finishes. Only
    /// valid to call while this task is not yet done — callers check
    /// `is_done` first and take the immediate-continue path instead.
    fn register_waiter(&self, waiter: Arc<Task>) {
        self.waited.lock().push(waiter);
    }

    fn finish(&self) -> Vec<Arc<Task>> {
        self.done.store(true, Ordering::Release);
        std::mem::take(&mut *self.waited.lock())
    }

    /// Advance this task by exactly one state transition.
    ///
    /// `enqueue` is called when the node is ready to run; it is the
    /// worker pool's `push` in production and a plain closure in tests.
    pub fn step(self: &Arc<Self>, enqueue: &mut dyn FnMut(Arc<Node>, Arc<Task>)) -> Step {
        let mut state = self.state.lock();
        match *state {
            State::WaitChildren => {
                let next_child = self.remaining.lock().pop_front();
                match next_child {
                    Some(child) => {
                        let child_task = child.task.lock().clone();
                        let child_task = match child_task {
                            Some(t) => t,
                            None => return Step::Continue, // leaf with no task: nothing to wait on
                        };
                        if child_task.is_done() {
                            Step::Continue
                        } else {
                            child_task.register_waiter(Arc::clone(self));
                            Step::Yield(child_task)
                        }
                    }
                    None => {
                        let all_ok = self.node.children.iter().all(|c| c.succeeded());
                        if all_ok {
                            *state = State::Enqueue;
                        } else {
                            self.node.done.set();
                            *state = State::Finished;
                        }
                        Step::Continue
                    }
                }
            }
            State::Enqueue => {
                *state = State::WaitWorker;
                drop(state);
                enqueue(Arc::clone(&self.node), Arc::clone(self));
                Step::Parked
            }
            State::WaitWorker => {
                *state = State::Finished;
                Step::Done
            }
            State::Finished => Step::Done,
        }
    }

    /// Waiters to wake now that this task has finished. Coordinator-only.
    pub fn complete(self: &Arc<Self>) -> Vec<Arc<Task>> {
        self.finish()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
