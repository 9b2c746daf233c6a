// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::CoreError;

struct CountingAction {
    calls: std::sync::atomic::AtomicUsize,
}

impl Action for CountingAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

struct FailingAction;

impl Action for FailingAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        Err("boom".into())
    }
}

#[test]
fn file_job_requires_at_least_one_target() {
    let err = FileJobBuilder::new(Vec::<String>::new(), vec!["dep".to_string()])
        .build()
        .unwrap_err();
    assert!(matches!(err, CoreError::NoTargets));
}

#[test]
fn file_job_dedups_deps_preserving_first_occurrence() {
    let job = FileJobBuilder::new(
        vec!["out.o".to_string()],
        vec!["a.c".to_string(), "b.h".to_string(), "a.c".to_string()],
    )
    .build()
    .unwrap();
    assert_eq!(job.deps, vec!["a.c", "b.h", "a.c"]);
    assert_eq!(job.deps_unique, vec!["a.c", "b.h"]);
}

#[test]
fn phony_job_always_has_exactly_one_target() {
    let job = PhonyJobBuilder::new("all", vec!["out.o".to_string()]).build();
    assert_eq!(job.targets, vec!["all"]);
    assert!(job.kind.is_phony());
    assert!(!job.is_serial());
}

#[test]
fn serial_and_use_hash_flags_round_trip() {
    let job = FileJobBuilder::new(vec!["out.bin".to_string()], Vec::<String>::new())
        .serial(true)
        .use_hash(true)
        .build()
        .unwrap();
    assert!(job.is_serial());
    assert!(job.use_hash());
}

#[test]
fn noop_action_succeeds() {
    let job = PhonyJobBuilder::new("noop", Vec::<String>::new()).build();
    job.action.run(&job).unwrap();
}

#[test]
fn custom_action_runs_and_can_fail() {
    let counting = FileJobBuilder::new(vec!["out.o".to_string()], Vec::<String>::new())
        .action(CountingAction { calls: std::sync::atomic::AtomicUsize::new(0) })
        .build()
        .unwrap();
    counting.action.run(&counting).unwrap();

    let failing = FileJobBuilder::new(vec!["out.o".to_string()], Vec::<String>::new())
        .action(FailingAction)
        .build()
        .unwrap();
    assert!(failing.action.run(&failing).is_err());
}

#[test]
fn closure_implements_action() {
    let job = FileJobBuilder::new(vec!["out.o".to_string()], Vec::<String>::new())
        .action(|_job: &Job| Ok(()))
        .build()
        .unwrap();
    job.action.run(&job).unwrap();
}

#[test]
fn primary_target_is_first_target() {
    let job = FileJobBuilder::new(
        vec!["out.o".to_string(), "out.d".to_string()],
        Vec::<String>::new(),
    )
    .build()
    .unwrap();
    assert_eq!(job.primary_target(), "out.o");
}

#[test]
fn test_builder_produces_usable_job() {
    let job = Job::builder().priority(5).build();
    assert_eq!(job.priority, 5);
    assert_eq!(job.targets, vec!["test-target"]);
}