// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution contexts and the worker supervisor

mod context;
mod supervisor;
mod unit;

pub use context::{ContextState, ExecutionContext};
pub use supervisor::{Diagnostic, DiagnosticKind, RunReport, UnitOutcome, WorkerSupervisor};
pub use unit::{discover, UnitKind, WorkUnit};
