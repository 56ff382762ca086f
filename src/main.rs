// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! binder CLI
//!
//! Runs every workload unit found under a root directory, or opens an
//! interactive console over a single execution context with `--console`.

mod repl;

use anyhow::Context as _;
use binder_core::runtime::DiagnosticKind;
use binder_core::{BinderConfig, QuickJsFactory, RunReport, WorkerSupervisor, VERSION};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "binder",
    about = "Hosts isolated script workloads that bind to each other's modules by name",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Directory holding the workload units
    root: PathBuf,

    /// Configuration file (defaults to <ROOT>/binder.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Entry file name inside each unit directory
    #[arg(long)]
    entry_file: Option<String>,

    /// Function invoked in each entry file
    #[arg(long)]
    entry_function: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Open an interactive console instead of running the units
    #[arg(long)]
    console: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<BinderConfig> {
        let mut config = match &self.config {
            Some(path) => BinderConfig::from_file(path)?,
            None => BinderConfig::discover(&self.root)?,
        };

        if let Some(entry_file) = &self.entry_file {
            config.entry_file = entry_file.clone();
        }
        if let Some(entry_function) = &self.entry_function {
            config.entry_function = entry_function.clone();
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    init_logging(&config, cli.verbose);

    if cli.console {
        let root = config.module_root_for(&cli.root);
        let mut console = repl::Repl::new(config, &root).context("failed to start console")?;
        console.run()?;
        return Ok(ExitCode::SUCCESS);
    }

    let supervisor = WorkerSupervisor::new(QuickJsFactory, config);
    let report = supervisor
        .discover_and_run(&cli.root)
        .with_context(|| format!("cannot read workload root '{}'", cli.root.display()))?;

    print_report(&report);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// `RUST_LOG` wins over the configured filter; `--verbose` overrides both.
fn init_logging(config: &BinderConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("binder=debug,binder_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_report(report: &RunReport) {
    // worker failures are listed with their outcome below
    for diagnostic in report
        .diagnostics
        .iter()
        .filter(|d| d.kind != DiagnosticKind::WorkerFailed)
    {
        eprintln!("{}: {}", "warning".yellow().bold(), diagnostic);
    }

    let failed = report.failed().count();
    let summary = format!("{} unit(s) run, {} failed", report.outcomes.len(), failed);

    if failed == 0 {
        eprintln!("{}", summary.green());
    } else {
        for outcome in report.failed() {
            if let Err(err) = &outcome.result {
                eprintln!("{} {}: {}", "Error".red().bold(), outcome.unit.cyan(), err);
            }
        }
        eprintln!("{}", summary.red());
    }
}
