// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! QuickJS engine (via `rquickjs`)
//!
//! Each [`QuickJsEngine`] owns its own QuickJS runtime and context, so two
//! engines never share a heap. A compiled unit is the persisted namespace
//! object of an evaluated ES module.

use super::loader::{self, ModuleFileLoader, ModuleFileResolver};
use super::{Engine, EngineFactory, EngineFault, Session};
use crate::config::BinderConfig;
use crate::error::{BinderError, Result};
use crate::globals;
use crate::module_system::ModuleScope;
use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{CatchResultExt, Context, Ctx, Object, Persistent, Runtime, Value};
use std::fmt::Display;
use std::path::Path;
use std::rc::Rc;

/// Compiled unit: a module namespace kept alive outside any `Ctx` borrow
pub type JsUnit = Persistent<Object<'static>>;

/// Session over a live QuickJS context
pub struct JsSession<'js> {
    ctx: Ctx<'js>,
}

impl<'js> JsSession<'js> {
    /// Wrap a context handle
    pub fn new(ctx: Ctx<'js>) -> Self {
        Self { ctx }
    }
}

fn fault(err: impl Display) -> EngineFault {
    EngineFault::new(err)
}

impl JsSession<'_> {
    /// Compile and evaluate a module file, keeping its namespace.
    ///
    /// QuickJS keeps every compiled module record until its context is
    /// freed, so releasing a unit frees the namespace but not the record.
    fn evaluate(&self, path: &Path, main: bool) -> std::result::Result<JsUnit, EngineFault> {
        let declared = loader::declare(&self.ctx, path, main)
            .catch(&self.ctx)
            .map_err(fault)?;
        let (module, evaluation) = declared.eval().catch(&self.ctx).map_err(fault)?;
        evaluation
            .finish::<Value>()
            .catch(&self.ctx)
            .map_err(fault)?;

        let namespace = module.namespace().catch(&self.ctx).map_err(fault)?;
        Ok(Persistent::save(&self.ctx, namespace))
    }
}

impl<'js> Session for JsSession<'js> {
    type Unit = JsUnit;
    type Value = Value<'js>;

    fn load(&self, path: &Path) -> std::result::Result<JsUnit, EngineFault> {
        self.evaluate(path, false)
    }

    fn load_entry(&self, path: &Path) -> std::result::Result<JsUnit, EngineFault> {
        self.evaluate(path, true)
    }

    fn call_export(
        &self,
        unit: &JsUnit,
        function: &str,
        args: Vec<Value<'js>>,
    ) -> std::result::Result<Value<'js>, EngineFault> {
        let namespace = unit.clone().restore(&self.ctx).map_err(fault)?;
        let export: Value = namespace.get(function).catch(&self.ctx).map_err(fault)?;
        let callable = export
            .as_function()
            .ok_or_else(|| EngineFault::new(format!("'{function}' is not an exported function")))?;

        callable
            .call::<_, Value>((Rest(args),))
            .catch(&self.ctx)
            .map_err(fault)
    }
}

/// One QuickJS runtime plus context, bound to a module scope
pub struct QuickJsEngine {
    modules: Rc<ModuleScope<JsUnit>>,
    entry_function: String,
    context: Context,
    // declared last so it is dropped after the context
    runtime: Runtime,
}

impl QuickJsEngine {
    /// Create an engine whose `binder` global operates on `modules`
    pub fn new(config: &BinderConfig, modules: Rc<ModuleScope<JsUnit>>) -> Result<Self> {
        let runtime = Runtime::new()?;
        let resolver = ModuleFileResolver::new(modules.resolver().root());
        runtime.set_loader(resolver, ModuleFileLoader);

        let context = Context::full(&runtime)?;
        context.with(|ctx| globals::install(&ctx, &modules))?;

        Ok(Self {
            modules,
            entry_function: config.entry_function.clone(),
            context,
            runtime,
        })
    }

    /// Bytes currently allocated by this engine's QuickJS runtime
    pub fn memory_usage(&self) -> i64 {
        self.runtime.memory_usage().malloc_size
    }
}

impl Engine for QuickJsEngine {
    type Unit = JsUnit;

    fn run_entry(&self, path: &Path) -> Result<()> {
        self.context.with(|ctx| {
            let session = JsSession::new(ctx);
            self.modules
                .run_entry(&session, path, &self.entry_function)
                .map(|_| ())
        })
    }

    fn eval(&self, source: &str) -> Result<String> {
        self.context.with(|ctx| {
            ctx.eval::<Coerced<String>, _>(source)
                .catch(&ctx)
                .map(|printable| printable.0)
                .map_err(|err| BinderError::Engine(err.to_string()))
        })
    }
}

impl Drop for QuickJsEngine {
    fn drop(&mut self) {
        // persisted namespaces must go before the runtime does
        self.modules.teardown();
    }
}

/// Creates one [`QuickJsEngine`] per execution context
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickJsFactory;

impl EngineFactory for QuickJsFactory {
    type Engine = QuickJsEngine;

    fn create(
        &self,
        config: &BinderConfig,
        modules: Rc<ModuleScope<JsUnit>>,
    ) -> Result<QuickJsEngine> {
        QuickJsEngine::new(config, modules)
    }
}
