// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution context: one engine instance plus its module registry
//!
//! ```text
//! Created --run/eval--> Running --run returns / terminate--> Terminated
//! ```
//!
//! Terminating releases every registered module before the engine itself
//! is dropped, so no compiled unit outlives the engine that produced it.

use crate::config::BinderConfig;
use crate::engine::{Engine, EngineFactory};
use crate::error::{BinderError, Result};
use crate::module_system::ModuleScope;
use std::path::Path;
use std::rc::Rc;

/// Lifecycle state of an execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Engine and empty registry allocated
    Created,
    /// Script code may be executing
    Running,
    /// Modules released, engine dropped
    Terminated,
}

/// The unit of isolation: one engine, one registry, one thread
pub struct ExecutionContext<E: Engine> {
    state: ContextState,
    modules: Rc<ModuleScope<E::Unit>>,
    engine: Option<E>,
}

impl<E: Engine> ExecutionContext<E> {
    /// Create a context whose root-relative specifiers resolve against `root`
    pub fn new<F>(factory: &F, config: &BinderConfig, root: &Path) -> Result<Self>
    where
        F: EngineFactory<Engine = E>,
    {
        let modules = Rc::new(ModuleScope::new(root, config.root_sigil));
        let engine = factory.create(config, Rc::clone(&modules))?;

        tracing::trace!(root = %root.display(), "execution context created");

        Ok(Self {
            state: ContextState::Created,
            modules,
            engine: Some(engine),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// The context's module scope
    pub fn modules(&self) -> &ModuleScope<E::Unit> {
        &self.modules
    }

    /// Run a workload's entry file to completion, then terminate.
    pub fn run(mut self, entry: &Path) -> Result<()> {
        let result = self.engine()?.run_entry(entry);
        self.terminate();
        result
    }

    /// Evaluate a script snippet, leaving the context running
    pub fn eval(&mut self, source: &str) -> Result<String> {
        self.engine()?.eval(source)
    }

    /// Release all modules and drop the engine. Idempotent.
    pub fn terminate(&mut self) {
        if self.state == ContextState::Terminated {
            return;
        }

        self.modules.teardown();
        self.engine = None;
        self.state = ContextState::Terminated;
        tracing::trace!("execution context terminated");
    }

    fn engine(&mut self) -> Result<&E> {
        match (&self.engine, self.state) {
            (Some(engine), ContextState::Created | ContextState::Running) => {
                self.state = ContextState::Running;
                Ok(engine)
            }
            _ => Err(BinderError::Engine("execution context has terminated".to_string())),
        }
    }
}

impl<E: Engine> Drop for ExecutionContext<E> {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{MockEngine, MockFactory, MockModule};
    use std::path::PathBuf;
    use std::sync::Barrier;

    fn context(factory: &MockFactory) -> ExecutionContext<MockEngine> {
        ExecutionContext::new(factory, &BinderConfig::default(), Path::new("/app")).unwrap()
    }

    fn factory() -> MockFactory {
        MockFactory::new()
            .with_module("/app/x.js", MockModule::new().sum("add"))
            .with_module("/app/thread_a/module.js", MockModule::new().constant("entry", 1))
            .with_module("/app/thread_b/module.js", MockModule::new().failing("entry", "oops"))
    }

    #[test]
    fn test_lifecycle() {
        let factory = factory();
        let mut context = context(&factory);
        assert_eq!(context.state(), ContextState::Created);

        assert_eq!(context.eval("import @x.js").unwrap(), "x");
        assert_eq!(context.state(), ContextState::Running);
        assert_eq!(context.modules().modules(), vec!["x"]);

        context.terminate();
        assert_eq!(context.state(), ContextState::Terminated);
        assert!(context.modules().modules().is_empty());
        assert!(context.eval("import @x.js").is_err());
    }

    #[test]
    fn test_run_invokes_entry_once() {
        let factory = factory();
        let context = context(&factory);

        context.run(Path::new("/app/thread_a/module.js")).unwrap();
        assert_eq!(factory.entries_run(), vec![PathBuf::from("/app/thread_a/module.js")]);
    }

    #[test]
    fn test_run_reports_entry_failure() {
        let factory = factory();
        let context = context(&factory);

        assert!(matches!(
            context.run(Path::new("/app/thread_b/module.js")),
            Err(BinderError::EvaluationFailed { function, .. }) if function == "entry"
        ));
    }

    #[test]
    fn test_contexts_are_isolated() {
        let factory = factory();
        let imported = Barrier::new(2);
        let checked = Barrier::new(2);

        std::thread::scope(|s| {
            s.spawn(|| {
                let mut a = context(&factory);
                a.eval("import @x.js").unwrap();
                imported.wait();
                checked.wait();
                assert_eq!(a.modules().modules(), vec!["x"]);
            });
            s.spawn(|| {
                let b = context(&factory);
                imported.wait();
                assert!(b.modules().registry().lookup("x").is_none());
                assert!(b.modules().modules().is_empty());
                checked.wait();
            });
        });
    }
}
