// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The module state of one execution context
//!
//! A [`ModuleScope`] pairs the context's resolver with its registry and
//! implements the `import` / `release` / `call` operations exposed to
//! hosted scripts. It is shared (via `Rc`) between the context and the host
//! functions installed into the engine, and never leaves its thread.

use crate::engine::Session;
use crate::error::{BinderError, Result};
use crate::module_system::dispatch;
use crate::module_system::registry::ModuleRegistry;
use crate::module_system::resolver::{canonical_name, ModuleResolver};
use std::path::{Path, PathBuf};

/// Resolver and registry of one execution context
pub struct ModuleScope<U> {
    resolver: ModuleResolver,
    registry: ModuleRegistry<U>,
}

impl<U> ModuleScope<U> {
    /// Create an empty scope resolving `@`-style specifiers against `root`
    pub fn new(root: impl Into<PathBuf>, sigil: char) -> Self {
        Self {
            resolver: ModuleResolver::new(root, sigil),
            registry: ModuleRegistry::new(),
        }
    }

    /// The scope's resolver
    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// The scope's registry
    pub fn registry(&self) -> &ModuleRegistry<U> {
        &self.registry
    }

    /// Import a module, loading it only if its canonical name is new.
    ///
    /// Returns the canonical name the module is registered under.
    pub fn import<S>(&self, session: &S, specifier: &str) -> Result<String>
    where
        S: Session<Unit = U>,
    {
        let resolved = self.resolver.resolve(specifier)?;

        self.registry.import_or_get(&resolved.name, || {
            tracing::debug!(
                module = %resolved.name,
                path = %resolved.load_path.display(),
                "loading module"
            );
            session
                .load(&resolved.load_path)
                .map_err(|fault| BinderError::load_failed(resolved.load_path.clone(), fault))
        })?;

        Ok(resolved.name)
    }

    /// Release a module by canonical name or by the specifier it was
    /// imported with. Returns `false` if nothing was loaded under that name.
    pub fn release(&self, name: &str) -> bool {
        if self.registry.remove(name) {
            return true;
        }

        match self.resolver.canonical_name(name) {
            Ok(canonical) if canonical != name => self.registry.remove(&canonical),
            _ => false,
        }
    }

    /// Call an exported function of a registered module
    pub fn call<S>(
        &self,
        session: &S,
        module: &str,
        function: &str,
        args: Vec<S::Value>,
    ) -> Result<S::Value>
    where
        S: Session<Unit = U>,
    {
        dispatch::invoke(session, &self.registry, module, function, args)
    }

    /// Load a workload's entry file and run its entry function once.
    ///
    /// The entry module is not registered; its unit is released when this
    /// returns.
    pub fn run_entry<S>(&self, session: &S, path: &Path, entry_function: &str) -> Result<S::Value>
    where
        S: Session<Unit = U>,
    {
        let unit = session
            .load_entry(path)
            .map_err(|fault| BinderError::load_failed(path, fault))?;

        let label = path.to_string_lossy();
        let module = canonical_name(&label).unwrap_or(&*label);
        dispatch::invoke_unit(session, &unit, module, entry_function, Vec::new())
    }

    /// Names of loaded modules in import order
    pub fn modules(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Release every loaded module
    pub fn teardown(&self) {
        let remaining = self.registry.len();
        if remaining > 0 {
            tracing::debug!(remaining, "releasing modules");
        }
        self.registry.clear();
    }
}
