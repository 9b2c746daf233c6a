// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads job declarations from a TOML manifest.
//!
//! The declaration surface itself (decorators, a build-script DSL, argv
//! parsing of rule definitions) is incidental to a build engine — what
//! matters is that the engine ends up with a populated [`JobTable`]. A
//! manifest is the least ceremonious way to get one into this binary;
//! an embedding program can just as well build a [`JobTable`] directly
//! against `strata-core`'s builders instead of going through a file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use strata_core::job::{Action, ActionError, FileJobBuilder, Job, PhonyJobBuilder};
use strata_core::metadata::{Metadata, MetadataTable};
use strata_core::table::JobTable;

/// Runs a job's action as a shell command via `sh -c`.
///
/// This is the manifest format's only action kind; it is not part of the
/// stable library surface, just the convenience this binary offers for
/// declaring work without writing Rust.
pub struct ShAction {
    command: String,
}

impl ShAction {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl Action for ShAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        let status = std::process::Command::new("sh").arg("-c").arg(&self.command).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("`{}` exited with {status}", self.command).into())
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ManifestFile {
    #[serde(default, rename = "file")]
    files: Vec<FileEntry>,
    #[serde(default, rename = "phony")]
    phonies: Vec<PhonyEntry>,
    #[serde(default, rename = "meta")]
    meta: Vec<MetaEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    targets: Vec<String>,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    use_hash: bool,
    #[serde(default)]
    serial: bool,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    sh: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhonyEntry {
    target: String,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    sh: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaEntry {
    uri: String,
    #[serde(default)]
    credential: Option<String>,
    #[serde(default)]
    keep: bool,
}

/// Parses `path` and registers every declared job and metadata entry.
pub fn load(path: &Path) -> Result<(JobTable, MetadataTable)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    let manifest: ManifestFile =
        toml::from_str(&text).with_context(|| format!("parsing manifest {}", path.display()))?;

    let table = JobTable::new();
    let metadata = MetadataTable::new();

    for entry in manifest.meta {
        metadata.set(entry.uri, Metadata { credential: entry.credential, keep: entry.keep });
    }

    for entry in manifest.files {
        let mut builder = FileJobBuilder::new(entry.targets, entry.deps)
            .use_hash(entry.use_hash)
            .serial(entry.serial)
            .priority(entry.priority);
        if let Some(desc) = entry.desc {
            builder = builder.desc(desc);
        }
        if let Some(sh) = entry.sh {
            builder = builder.action(ShAction::new(sh));
        }
        table.register(builder.build()?)?;
    }

    for entry in manifest.phonies {
        let mut builder = PhonyJobBuilder::new(entry.target, entry.deps).priority(entry.priority);
        if let Some(desc) = entry.desc {
            builder = builder.desc(desc);
        }
        if let Some(sh) = entry.sh {
            builder = builder.action(ShAction::new(sh));
        }
        table.register(builder.build())?;
    }

    Ok((table, metadata))
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
