// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by a resource adapter. Distinguishing `NotFound` from
/// `Transport` matters to callers: the staleness oracle treats both as
/// "force rebuild" during mtime probes, but a caller cleaning up targets
/// after a failed action treats `NotFound` as already-done and
/// `Transport` as worth retrying or reporting.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no adapter registered for scheme {scheme:?}")]
    UnsupportedScheme { scheme: String },

    #[error("{uri} not found")]
    NotFound { uri: String },

    #[error("transport error for {uri}: {reason}")]
    Transport { uri: String, reason: String },
}
