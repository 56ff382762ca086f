// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script engine capability interface
//!
//! The runtime never looks inside the engine. It needs three things:
//!
//! - a [`Session`] to load modules and call their exports while the engine
//!   is executing on its owning thread,
//! - an [`Engine`] instance per execution context,
//! - an [`EngineFactory`] the supervisor hands to each worker thread.
//!
//! [`quickjs`] is the production engine.

pub mod loader;
pub mod quickjs;

#[cfg(test)]
pub(crate) mod mock;

use crate::config::BinderConfig;
use crate::error::Result;
use crate::module_system::ModuleScope;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

pub use quickjs::{JsSession, JsUnit, QuickJsEngine, QuickJsFactory};

/// Failure reported by the engine (exception text, read error, ...)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineFault(pub String);

impl EngineFault {
    /// Create a fault from anything printable
    pub fn new(message: impl ToString) -> Self {
        Self(message.to_string())
    }
}

/// Engine operations available while script code is executing
pub trait Session {
    /// Compiled-unit handle. Dropping it releases the engine-side value.
    type Unit;
    /// Argument and return value of exported functions
    type Value;

    /// Read, compile and evaluate the module at `path`
    fn load(&self, path: &Path) -> std::result::Result<Self::Unit, EngineFault>;

    /// Load a workload's entry file. Engines that distinguish entry modules
    /// from imported ones override this.
    fn load_entry(&self, path: &Path) -> std::result::Result<Self::Unit, EngineFault> {
        self.load(path)
    }

    /// Call the exported function `function` of `unit` with positional `args`
    fn call_export(
        &self,
        unit: &Self::Unit,
        function: &str,
        args: Vec<Self::Value>,
    ) -> std::result::Result<Self::Value, EngineFault>;
}

/// One engine instance, bound to one execution context
pub trait Engine {
    /// Compiled-unit handle stored in the context's registry
    type Unit: 'static;

    /// Evaluate a workload's entry file and invoke its entry function
    fn run_entry(&self, path: &Path) -> Result<()>;

    /// Evaluate a script snippet and return its printable form
    fn eval(&self, source: &str) -> Result<String>;
}

/// Creates engine instances; shared by every worker thread
pub trait EngineFactory: Send + Sync {
    /// Engine type produced by this factory
    type Engine: Engine;

    /// Create an engine whose host functions operate on `modules`
    fn create(
        &self,
        config: &BinderConfig,
        modules: Rc<ModuleScope<<Self::Engine as Engine>::Unit>>,
    ) -> Result<Self::Engine>;
}
