// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level end-to-end scenarios, driven against the engine and
//! adapter crates directly rather than through the `strata` binary (that
//! coverage lives in `crates/cli/tests/cli.rs`, alongside the manifest
//! format and dump rendering it owns).

use std::fs;
use std::sync::Arc;
use strata_adapters::default_registry;
use strata_core::job::{Action, ActionError, FileJobBuilder, Job, PhonyJobBuilder};
use strata_core::metadata::MetadataTable;
use strata_core::table::JobTable;
use strata_engine::{Driver, DriverConfig};
use strata_storage::HashCache;

fn uri(path: &std::path::Path) -> String {
    path.to_str().expect("utf8 path").to_string()
}

fn driver(table: JobTable, metadata: MetadataTable, cache_dir: &std::path::Path, config: DriverConfig) -> Driver {
    let cache = Arc::new(HashCache::new(cache_dir));
    let registry = Arc::new(default_registry(cache));
    Driver::new(Arc::new(table), Arc::new(metadata), registry, config)
}

struct CopyAction {
    from: std::path::PathBuf,
    to: std::path::PathBuf,
}

impl Action for CopyAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        fs::copy(&self.from, &self.to)?;
        Ok(())
    }
}

struct FailingAction;

impl Action for FailingAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        Err("action raised".into())
    }
}

#[test]
fn fresh_build_runs_each_action_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    fs::write(&c, "c\n").expect("seed c");

    let table = JobTable::new();
    table
        .register(
            FileJobBuilder::new([uri(&a)], [uri(&b)])
                .action(CopyAction { from: b.clone(), to: a.clone() })
                .build()
                .expect("register a"),
        )
        .expect("register a");
    table
        .register(
            FileJobBuilder::new([uri(&b)], [uri(&c)])
                .action(CopyAction { from: c.clone(), to: b.clone() })
                .build()
                .expect("register b"),
        )
        .expect("register b");

    let driver = driver(table, MetadataTable::new(), &dir.path().join(".cache"), DriverConfig::default());
    let report = driver.run(&[uri(&a)]).expect("run");

    assert!(report.succeeded());
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn no_op_rebuild_performs_no_actions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("out.txt");
    let input = dir.path().join("in.txt");
    fs::write(&input, "hello\n").expect("seed input");

    let build = |table: JobTable| {
        table
            .register(
                FileJobBuilder::new([uri(&out)], [uri(&input)])
                    .action(CopyAction { from: input.clone(), to: out.clone() })
                    .build()
                    .expect("register out"),
            )
            .expect("register out");
        table
    };

    let cache_dir = dir.path().join(".cache");
    let first = driver(build(JobTable::new()), MetadataTable::new(), &cache_dir, DriverConfig::default());
    let first_report = first.run(&[uri(&out)]).expect("first run");
    assert!(!first_report.executed.is_empty());

    let second = driver(build(JobTable::new()), MetadataTable::new(), &cache_dir, DriverConfig::default());
    let second_report = second.run(&[uri(&out)]).expect("second run");
    assert!(second_report.executed.is_empty(), "no-op rebuild must perform no actions");
}

#[test]
fn cycle_is_rejected_before_any_action_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");

    let table = JobTable::new();
    table
        .register(FileJobBuilder::new([uri(&a)], [uri(&b)]).build().expect("register a"))
        .expect("register a");
    table
        .register(FileJobBuilder::new([uri(&b)], [uri(&a)]).build().expect("register b"))
        .expect("register b");

    let driver = driver(table, MetadataTable::new(), &dir.path().join(".cache"), DriverConfig::default());
    let err = driver.run(&[uri(&a)]).expect_err("cycle must fail the run");
    assert!(matches!(err, strata_engine::EngineError::Cycle(_)));
}

#[test]
fn keep_going_lets_an_independent_job_finish_after_a_sibling_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let x = dir.path().join("x.txt");
    let y = dir.path().join("y.txt");

    let table = JobTable::new();
    table.register(PhonyJobBuilder::new("x", Vec::<String>::new()).action(FailingAction).build()).expect("register phony x");
    table
        .register(
            FileJobBuilder::new([uri(&x)], ["x".to_string()])
                .action(CopyAction { from: x.clone(), to: x.clone() })
                .build()
                .expect("register x"),
        )
        .expect("register x");
    table
        .register(
            FileJobBuilder::new([uri(&y)], Vec::<String>::new())
                .action(TouchAction(y.clone()))
                .build()
                .expect("register y"),
        )
        .expect("register y");

    let config = DriverConfig { keep_going: true, ..DriverConfig::default() };
    let driver = driver(table, MetadataTable::new(), &dir.path().join(".cache"), config);
    let report = driver.run(&[uri(&x), uri(&y)]).expect("run");

    assert!(!report.succeeded());
    assert!(y.exists(), "independent job must still complete under keep_going");
}

struct TouchAction(std::path::PathBuf);

impl Action for TouchAction {
    fn run(&self, _job: &Job) -> Result<(), ActionError> {
        fs::write(&self.0, b"")?;
        Ok(())
    }
}

#[test]
fn serial_jobs_never_run_concurrently() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SerialCheck {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Action for SerialCheck {
        fn run(&self, _job: &Job) -> Result<(), ActionError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let table = JobTable::new();
    let mut targets = Vec::new();
    for name in ["p.txt", "q.txt", "r.txt"] {
        let target = dir.path().join(name);
        table
            .register(
                FileJobBuilder::new([uri(&target)], Vec::<String>::new())
                    .serial(true)
                    .action(SerialCheck { active: Arc::clone(&active), peak: Arc::clone(&peak) })
                    .build()
                    .expect("register serial file job"),
            )
            .expect("register serial file job");
        targets.push(uri(&target));
    }

    let config = DriverConfig { n_max: 4, n_serial: 1, ..DriverConfig::default() };
    let driver = driver(table, MetadataTable::new(), &dir.path().join(".cache"), config);
    let report = driver.run(&targets).expect("run");

    assert!(report.succeeded());
    assert_eq!(peak.load(Ordering::SeqCst), 1, "at most one serial action may run at a time");
}
