// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_match_the_documented_surface() {
    let cli = Cli::parse_from(["strata"]);
    assert_eq!(cli.targets, vec!["all".to_string()]);
    assert_eq!(cli.jobs, 1);
    assert_eq!(cli.n_serial, 1);
    assert_eq!(cli.load_average, f64::INFINITY);
    assert!(!cli.keep_going);
    assert!(!cli.dry_run);
    assert!(cli.cut.is_empty());
    assert_eq!(cli.log, LogLevel::Warning);
}

#[test]
fn targets_accepts_multiple_positionals() {
    let cli = Cli::parse_from(["strata", "a", "b", "c"]);
    assert_eq!(cli.targets, vec!["a", "b", "c"]);
}

#[test]
fn cut_is_repeatable() {
    let cli = Cli::parse_from(["strata", "--cut", "x", "--cut", "y"]);
    assert_eq!(cli.cut, vec!["x", "y"]);
}

#[test]
fn dependencies_dot_defaults_to_stdout_marker_when_bare() {
    let cli = Cli::parse_from(["strata", "-Q"]);
    assert_eq!(cli.dependencies_dot.as_deref(), Some("-"));
}

#[test]
fn dependencies_dot_accepts_an_explicit_path() {
    let cli = Cli::parse_from(["strata", "-Q", "out.dot"]);
    assert_eq!(cli.dependencies_dot.as_deref(), Some("out.dot"));
}

#[test]
fn dependencies_json_absent_by_default() {
    let cli = Cli::parse_from(["strata"]);
    assert_eq!(cli.dependencies_json, None);
}

#[test]
fn validate_rejects_zero_jobs() {
    let mut cli = Cli::parse_from(["strata"]);
    cli.jobs = 0;
    assert!(cli.validate().is_err());
}

#[test]
fn validate_rejects_zero_n_serial() {
    let mut cli = Cli::parse_from(["strata"]);
    cli.n_serial = 0;
    assert!(cli.validate().is_err());
}

#[test]
fn validate_rejects_non_positive_load_average() {
    let mut cli = Cli::parse_from(["strata"]);
    cli.load_average = 0.0;
    assert!(cli.validate().is_err());
}

#[test]
fn validate_accepts_defaults() {
    let cli = Cli::parse_from(["strata"]);
    assert!(cli.validate().is_ok());
}