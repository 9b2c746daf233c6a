// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point: parse arguments, load the manifest, and either dump the
//! declared graph or drive a build.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use strata_cli::args::{Cli, LogLevel};
use strata_cli::exit_error::ExitError;
use strata_cli::{dump, manifest};
use strata_engine::{Driver, DriverConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(message) = cli.validate() {
        eprintln!("strata: {message}");
        return ExitCode::from(2);
    }
    init_logging(cli.log);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("strata: {err:#}");
            match err.downcast_ref::<ExitError>() {
                Some(exit) => exit_code(exit.code),
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, 255) as u8)
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let (table, metadata) = manifest::load(&cli.file)?;

    if cli.descriptions {
        print!("{}", dump::render_descriptions(&table.jobs()));
        return Ok(ExitCode::SUCCESS);
    }
    if cli.dependencies {
        print!("{}", dump::render_dependencies(&table.jobs()));
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(path) = &cli.dependencies_dot {
        write_output(path, &dump::render_dependencies_dot(&table.jobs()))?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(path) = &cli.dependencies_json {
        write_output(path, &dump::render_dependencies_json(&table.jobs())?)?;
        return Ok(ExitCode::SUCCESS);
    }

    let cache_dir =
        std::env::var("STRATA_CACHE_DIR").unwrap_or_else(|_| strata_storage::DEFAULT_CACHE_DIR.to_string());
    let cache = Arc::new(strata_storage::HashCache::new(cache_dir));
    let registry = Arc::new(strata_adapters::default_registry(cache));

    let driver = Driver::new(
        Arc::new(table),
        Arc::new(metadata),
        registry,
        DriverConfig {
            n_max: cli.jobs,
            n_serial: cli.n_serial,
            load_average: cli.load_average,
            keep_going: cli.keep_going,
            dry_run: cli.dry_run,
            cut: cli.cut.clone(),
        },
    );

    let report = driver.run(&cli.targets)?;
    if let Some(reason) = &report.fatal_error {
        return Err(ExitError::new(1, reason.clone()).into());
    }
    if !report.deferred_errors.is_empty() {
        for (target, reason) in &report.deferred_errors {
            eprintln!("strata: {target}: {reason}");
        }
        return Err(ExitError::new(1, "build failed").into());
    }
    Ok(ExitCode::SUCCESS)
}

fn write_output(path: &str, content: &str) -> anyhow::Result<()> {
    if path == "-" || path == "/dev/stdout" {
        print!("{content}");
        Ok(())
    } else {
        std::fs::write(path, content).map_err(anyhow::Error::from)
    }
}

fn init_logging(level: LogLevel) {
    let default_filter = match level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warning => "warn",
        // tracing has no level above ERROR; CRITICAL collapses to it.
        LogLevel::Error | LogLevel::Critical => "error",
    };
    // RUST_LOG, when set, takes precedence over --log.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
