// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised while building the dependency graph or driving a build.
//!
//! Declaration-time errors ([`CoreError`]) and probe-time errors
//! ([`AdapterError`]) are folded in here rather than threaded through as a
//! separate type at every call site — callers further up (the CLI) only
//! ever need one error type to report and exit on.

use strata_adapters::AdapterError;
use strata_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Declaration(#[from] CoreError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("dependency cycle: {0}")]
    Cycle(String),

    #[error("no rule to make target {target:?}, required by {required_by:?}")]
    NoRuleToMake { target: String, required_by: String },

    #[error("target {target:?} named by --cut is also named by a root")]
    CutRoot { target: String },

    #[error("action for {target:?} failed: {reason}")]
    ActionFailed { target: String, reason: String },

    #[error("build failed")]
    ExecutionFailed,

    #[error("failed to start a worker thread: {0}")]
    Io(#[from] std::io::Error),
}
