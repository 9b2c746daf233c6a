// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declaration-time errors: anything that can go wrong while jobs are
//! being registered, before a single action has run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("target {target:?} is already produced by another job")]
    DuplicateTarget { target: String },

    #[error("phony job with multiple targets is not supported: {targets:?}")]
    PhonyMultipleTargets { targets: Vec<String> },

    #[error("job must declare at least one target")]
    NoTargets,

    #[error("invalid URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },
}
