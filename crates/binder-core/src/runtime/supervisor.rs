// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Worker supervisor
//!
//! Discovers workload units under a root directory and runs every isolated
//! unit on a dedicated OS thread with its own execution context. The engine
//! factory is an explicit value owned by the supervisor and shared with the
//! workers; nothing is reached through global state.

use crate::config::BinderConfig;
use crate::engine::EngineFactory;
use crate::error::{BinderError, Result};
use crate::runtime::context::ExecutionContext;
use crate::runtime::unit::{discover, UnitKind, WorkUnit};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Why a unit produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Shared-runtime unit; not supported yet
    ServiceUnsupported,
    /// Name carries no known prefix
    InvalidName,
    /// The worker ran but its unit failed
    WorkerFailed,
}

/// A non-fatal problem reported during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Unit directory name
    pub unit: String,
    /// Category
    pub kind: DiagnosticKind,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.unit, self.message)
    }
}

/// Final state of one spawned worker
#[derive(Debug)]
pub struct UnitOutcome {
    /// Unit directory name
    pub unit: String,
    /// What the worker's entry run returned
    pub result: Result<()>,
}

/// Summary of a `discover_and_run` pass
#[derive(Debug, Default)]
pub struct RunReport {
    /// Units a worker was spawned for, in discovery order
    pub spawned: Vec<String>,
    /// Diagnostics, in the order they were raised
    pub diagnostics: Vec<Diagnostic>,
    /// One outcome per spawned worker
    pub outcomes: Vec<UnitOutcome>,
}

impl RunReport {
    /// Whether every spawned worker finished cleanly
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    /// Units whose worker failed
    pub fn failed(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    fn diagnose(&mut self, unit: &str, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            unit: unit.to_string(),
            kind,
            message: message.into(),
        };
        match kind {
            DiagnosticKind::WorkerFailed => tracing::error!("{diagnostic}"),
            _ => tracing::warn!("{diagnostic}"),
        }
        self.diagnostics.push(diagnostic);
    }
}

/// Spawns one isolated execution context per workload unit
pub struct WorkerSupervisor<F> {
    factory: Arc<F>,
    config: Arc<BinderConfig>,
}

impl<F> WorkerSupervisor<F>
where
    F: EngineFactory + 'static,
{
    /// Create a supervisor owning `factory`
    pub fn new(factory: F, config: BinderConfig) -> Self {
        Self {
            factory: Arc::new(factory),
            config: Arc::new(config),
        }
    }

    /// The configuration handed to every worker
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Discover the units under `root`, run every isolated unit on its own
    /// thread and wait for all of them.
    ///
    /// Only discovery failures are returned as errors; unit failures end up
    /// in the report.
    pub fn discover_and_run(&self, root: &Path) -> Result<RunReport> {
        let units = discover(root, &self.config)?;
        let module_root = self.config.module_root_for(root);
        let mut report = RunReport::default();
        let mut workers = Vec::new();

        tracing::info!(root = %root.display(), units = units.len(), "discovered workload units");

        for unit in units {
            match unit.kind {
                UnitKind::IsolatedThread => {
                    tracing::info!(unit = %unit.name, "loading thread unit");
                    match self.spawn(&unit, module_root.clone()) {
                        Ok(handle) => {
                            report.spawned.push(unit.name.clone());
                            workers.push((unit.name, handle));
                        }
                        Err(err) => {
                            let message = err.to_string();
                            report.diagnose(&unit.name, DiagnosticKind::WorkerFailed, message);
                            report.outcomes.push(UnitOutcome {
                                unit: unit.name,
                                result: Err(err),
                            });
                        }
                    }
                }
                UnitKind::SharedService => {
                    let err = BinderError::ServiceUnsupported(unit.name.clone());
                    let message = err.to_string();
                    report.diagnose(&unit.name, DiagnosticKind::ServiceUnsupported, message);
                }
                UnitKind::Invalid => {
                    report.diagnose(
                        &unit.name,
                        DiagnosticKind::InvalidName,
                        format!(
                            "unit name should start with \"{}\" or \"{}\"",
                            self.config.service_prefix, self.config.thread_prefix
                        ),
                    );
                }
            }
        }

        for (name, handle) in workers {
            let result = handle
                .join()
                .unwrap_or_else(|_| Err(BinderError::WorkerPanicked(name.clone())));

            match &result {
                Ok(()) => tracing::info!(unit = %name, "unit finished"),
                Err(err) => report.diagnose(&name, DiagnosticKind::WorkerFailed, err.to_string()),
            }
            report.outcomes.push(UnitOutcome { unit: name, result });
        }

        Ok(report)
    }

    fn spawn(&self, unit: &WorkUnit, module_root: PathBuf) -> Result<JoinHandle<Result<()>>> {
        let factory = Arc::clone(&self.factory);
        let config = Arc::clone(&self.config);
        let entry = unit.entry_path(&config);

        let handle = thread::Builder::new()
            .name(format!("binder-{}", unit.name))
            .spawn(move || run_unit(factory.as_ref(), &config, &module_root, &entry))?;

        Ok(handle)
    }
}

/// Body of a worker thread
fn run_unit<F: EngineFactory>(
    factory: &F,
    config: &BinderConfig,
    root: &Path,
    entry: &Path,
) -> Result<()> {
    let context = ExecutionContext::new(factory, config, root)?;
    context.run(entry)
}
