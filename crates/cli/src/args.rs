// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface: the stable flags a build invocation accepts.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Warning,
    Info,
    Error,
    Critical,
}

/// A dependency-graph build engine.
///
/// Jobs are declared in a manifest file (`--file`, TOML) rather than on
/// the command line — the command line only controls how the engine
/// schedules and reports on the graph the manifest describes.
#[derive(Parser, Debug)]
#[command(
    name = "strata",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")"),
    about,
    styles = crate::color::styles()
)]
pub struct Cli {
    /// Root goals to build.
    #[arg(default_value = "all")]
    pub targets: Vec<String>,

    /// Manifest describing the job declarations to build.
    #[arg(short = 'f', long = "file", default_value = "build.toml")]
    pub file: PathBuf,

    /// Max general-worker parallelism.
    #[arg(short = 'j', long = "jobs", default_value_t = 1)]
    pub jobs: usize,

    /// Max concurrent serial jobs.
    #[arg(long = "n-serial", default_value_t = 1)]
    pub n_serial: usize,

    /// No new job starts while the load average exceeds this threshold.
    #[arg(short = 'l', long = "load-average", default_value_t = f64::INFINITY)]
    pub load_average: f64,

    /// Keep going on unrelated jobs even if some jobs fail.
    #[arg(short = 'k', long = "keep-going")]
    pub keep_going: bool,

    /// Print target descriptions, then exit.
    #[arg(short = 'D', long = "descriptions")]
    pub descriptions: bool,

    /// Print dependencies, then exit.
    #[arg(short = 'P', long = "dependencies")]
    pub dependencies: bool,

    /// Print dependencies in Graphviz DOT format to PATH (default: stdout), then exit.
    #[arg(short = 'Q', long = "dependencies-dot", num_args = 0..=1, default_missing_value = "-")]
    pub dependencies_dot: Option<String>,

    /// Print dependencies as JSON to PATH (default: stdout), then exit.
    #[arg(short = 'J', long = "dependencies-json", num_args = 0..=1, default_missing_value = "-")]
    pub dependencies_json: Option<String>,

    /// Print what would be executed without running any action.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Treat TARGET as an externally-provided input, cutting the DAG there.
    /// May be repeated.
    #[arg(long = "cut", value_name = "TARGET")]
    pub cut: Vec<String>,

    /// Set the log level.
    #[arg(long = "log", default_value = "warning")]
    pub log: LogLevel,
}

impl Cli {
    /// Mirrors the original tool's `assert`s on its parsed arguments:
    /// these are invariants of the flags themselves, not of the build.
    pub fn validate(&self) -> Result<(), String> {
        if self.jobs == 0 {
            return Err("--jobs must be greater than 0".to_string());
        }
        if self.n_serial == 0 {
            return Err("--n-serial must be greater than 0".to_string());
        }
        if !(self.load_average > 0.0) {
            return Err("--load-average must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
