// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # binder-core
//!
//! Hosts independently executing script modules and lets them find and call
//! each other's exported functions by name.
//!
//! Every workload unit runs on its own thread inside an
//! [`ExecutionContext`]: one QuickJS engine plus one module registry. Hosted
//! code reaches the registry through the `binder` global:
//!
//! ```js
//! export function entry() {
//!     binder.import("@shared/math.js");
//!     console.log(binder.call("math", "add", 1, 2));
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use binder_core::{BinderConfig, QuickJsFactory, WorkerSupervisor};
//!
//! let supervisor = WorkerSupervisor::new(QuickJsFactory, BinderConfig::default());
//! let report = supervisor.discover_and_run(Path::new("units"))?;
//! assert!(report.is_success());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod globals;
pub mod module_system;
pub mod runtime;

// Re-exports
pub use config::BinderConfig;
pub use engine::{Engine, EngineFactory, QuickJsEngine, QuickJsFactory};
pub use error::{BinderError, Result};
pub use module_system::{ModuleRegistry, ModuleScope};
pub use runtime::{ExecutionContext, RunReport, WorkerSupervisor};

/// Version of the binder runtime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
