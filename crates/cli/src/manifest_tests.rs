// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

fn manifest_path(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("build.toml");
    let mut file = std::fs::File::create(&path).expect("create manifest");
    file.write_all(contents.as_bytes()).expect("write manifest");
    path
}

#[test]
fn loads_file_and_phony_jobs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = manifest_path(
        &dir,
        r#"
        [[file]]
        targets = ["out.txt"]
        deps = ["in.txt"]
        desc = "builds out.txt"
        sh = "cp in.txt out.txt"

        [[phony]]
        target = "all"
        deps = ["out.txt"]
        "#,
    );

    let (table, _metadata) = load(&path).expect("load manifest");
    assert!(table.contains("out.txt"));
    assert!(table.contains("all"));

    let job = table.job_of_target("out.txt").expect("out.txt job");
    assert_eq!(job.deps, vec!["in.txt".to_string()]);
    assert_eq!(job.desc.as_deref(), Some("builds out.txt"));
}

#[test]
fn loads_metadata_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = manifest_path(
        &dir,
        r#"
        [[meta]]
        uri = "gs://bucket/object"
        credential = "/etc/creds.json"
        keep = true
        "#,
    );

    let (_table, metadata) = load(&path).expect("load manifest");
    let entry = metadata.get("gs://bucket/object");
    assert_eq!(entry.credential.as_deref(), Some("/etc/creds.json"));
    assert!(entry.keep);
}

#[test]
fn rejects_a_file_job_with_no_targets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = manifest_path(
        &dir,
        r#"
        [[file]]
        targets = []
        "#,
    );

    assert!(load(&path).is_err());
}

#[test]
fn missing_manifest_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.toml");
    assert!(load(&path).is_err());
}

#[test]
fn sh_action_reports_a_nonzero_exit() {
    let job = strata_core::job::PhonyJobBuilder::new("x", Vec::<String>::new())
        .action(ShAction::new("exit 3"))
        .build();
    let err = job.action.run(&job).expect_err("nonzero exit is an error");
    assert!(err.to_string().contains("exit 3"));
}

#[test]
fn sh_action_succeeds_on_zero_exit() {
    let job = strata_core::job::PhonyJobBuilder::new("x", Vec::<String>::new())
        .action(ShAction::new("true"))
        .build();
    assert!(job.action.run(&job).is_ok());
}