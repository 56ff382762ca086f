// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Deterministic in-memory engine used by unit tests

use super::{Engine, EngineFactory, EngineFault, Session};
use crate::config::BinderConfig;
use crate::error::Result;
use crate::module_system::ModuleScope;
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

/// Behaviour of one exported function
#[derive(Debug, Clone)]
enum Export {
    Sum,
    Constant(i64),
    Fail(String),
}

/// A scripted module: export name to behaviour
#[derive(Debug, Clone, Default)]
pub struct MockModule {
    exports: HashMap<String, Export>,
}

impl MockModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export returning the sum of its arguments
    pub fn sum(mut self, name: &str) -> Self {
        self.exports.insert(name.to_string(), Export::Sum);
        self
    }

    /// Export returning `value`
    pub fn constant(mut self, name: &str, value: i64) -> Self {
        self.exports.insert(name.to_string(), Export::Constant(value));
        self
    }

    /// Export that throws `message`
    pub fn failing(mut self, name: &str, message: &str) -> Self {
        self.exports.insert(name.to_string(), Export::Fail(message.to_string()));
        self
    }
}

/// Compiled unit; counts its own release
#[derive(Debug)]
pub struct MockUnit {
    pub path: PathBuf,
    released: Rc<Cell<usize>>,
}

impl Drop for MockUnit {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

/// Session over a fixed set of modules
pub struct MockSession {
    modules: Arc<HashMap<PathBuf, MockModule>>,
    loads: Cell<usize>,
    calls: Cell<usize>,
    released: Rc<Cell<usize>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::from_modules(Arc::new(HashMap::new()))
    }

    fn from_modules(modules: Arc<HashMap<PathBuf, MockModule>>) -> Self {
        Self {
            modules,
            loads: Cell::new(0),
            calls: Cell::new(0),
            released: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_module(mut self, path: impl Into<PathBuf>, module: MockModule) -> Self {
        Arc::make_mut(&mut self.modules).insert(path.into(), module);
        self
    }

    /// Number of `load` calls, failed ones included
    pub fn loads(&self) -> usize {
        self.loads.get()
    }

    /// Number of `call_export` calls
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Number of units dropped so far
    pub fn released(&self) -> usize {
        self.released.get()
    }
}

impl Session for MockSession {
    type Unit = MockUnit;
    type Value = i64;

    fn load(&self, path: &Path) -> std::result::Result<MockUnit, EngineFault> {
        self.loads.set(self.loads.get() + 1);
        if !self.modules.contains_key(path) {
            let message = format!("could not load module filename '{}'", path.display());
            return Err(EngineFault::new(message));
        }
        Ok(MockUnit {
            path: path.to_path_buf(),
            released: Rc::clone(&self.released),
        })
    }

    fn call_export(
        &self,
        unit: &MockUnit,
        function: &str,
        args: Vec<i64>,
    ) -> std::result::Result<i64, EngineFault> {
        self.calls.set(self.calls.get() + 1);
        let export = self
            .modules
            .get(&unit.path)
            .and_then(|module| module.exports.get(function))
            .ok_or_else(|| EngineFault::new(format!("{function} is not a function")))?;

        match export {
            Export::Sum => Ok(args.iter().sum()),
            Export::Constant(value) => Ok(*value),
            Export::Fail(message) => Err(EngineFault::new(message)),
        }
    }
}

/// Engine recording which entry files it ran
pub struct MockEngine {
    session: MockSession,
    modules: Rc<ModuleScope<MockUnit>>,
    entry_function: String,
    log: Arc<Mutex<Vec<PathBuf>>>,
}

impl Engine for MockEngine {
    type Unit = MockUnit;

    fn run_entry(&self, path: &Path) -> Result<()> {
        self.log.lock().push(path.to_path_buf());
        self.modules
            .run_entry(&self.session, path, &self.entry_function)
            .map(|_| ())
    }

    fn eval(&self, source: &str) -> Result<String> {
        // `import <specifier>` is the only statement the mock understands
        let specifier = source.trim().trim_start_matches("import").trim();
        self.modules.import(&self.session, specifier)
    }
}

/// Factory shared across worker threads
#[derive(Clone, Default)]
pub struct MockFactory {
    modules: Arc<HashMap<PathBuf, MockModule>>,
    log: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: impl Into<PathBuf>, module: MockModule) -> Self {
        Arc::make_mut(&mut self.modules).insert(path.into(), module);
        self
    }

    /// Entry files started so far
    pub fn entries_run(&self) -> Vec<PathBuf> {
        self.log.lock().clone()
    }
}

impl EngineFactory for MockFactory {
    type Engine = MockEngine;

    fn create(
        &self,
        config: &BinderConfig,
        modules: Rc<ModuleScope<MockUnit>>,
    ) -> Result<MockEngine> {
        Ok(MockEngine {
            session: MockSession::from_modules(Arc::clone(&self.modules)),
            modules,
            entry_function: config.entry_function.clone(),
            log: Arc::clone(&self.log),
        })
    }
}
