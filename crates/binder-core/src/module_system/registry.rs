// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Per-context module registry
//!
//! Entries are kept in insertion order and looked up by exact name. The
//! registry is neither `Send` nor `Sync`: it belongs to the thread that owns
//! its execution context.
//!
//! Borrows of the entry list never outlive a single method call, so loaders
//! and engine code running on behalf of a module may re-enter the registry.

use crate::error::{BinderError, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A loaded module
pub struct ModuleEntry<U> {
    /// Canonical module name, unique within the registry
    name: String,
    /// Compiled-unit handle owned by this entry
    unit: Rc<U>,
}

impl<U> ModuleEntry<U> {
    /// The entry's canonical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entry's compiled unit
    pub fn unit(&self) -> &Rc<U> {
        &self.unit
    }
}

impl<U> fmt::Debug for ModuleEntry<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Insertion-ordered table of loaded modules
pub struct ModuleRegistry<U> {
    entries: RefCell<Vec<ModuleEntry<U>>>,
    /// Names whose loader is currently running
    loading: RefCell<Vec<String>>,
}

/// Marks a name as loading until dropped
struct LoadingGuard<'a> {
    loading: &'a RefCell<Vec<String>>,
    name: String,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut loading = self.loading.borrow_mut();
        if let Some(pos) = loading.iter().rposition(|name| *name == self.name) {
            loading.remove(pos);
        }
    }
}

impl<U> ModuleRegistry<U> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            loading: RefCell::new(Vec::new()),
        }
    }

    /// Get the compiled unit registered under `name`
    pub fn lookup(&self, name: &str) -> Option<Rc<U>> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Rc::clone(&entry.unit))
    }

    /// Position of `name` in insertion order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|entry| entry.name == name)
    }

    /// Check if a module is registered
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Append a module, taking ownership of `unit`.
    ///
    /// Callers check `lookup` first. If `name` is already present the
    /// existing entry wins and `unit` is dropped.
    pub fn insert(&self, name: impl Into<String>, unit: U) -> Rc<U> {
        let name = name.into();
        let mut entries = self.entries.borrow_mut();

        let existing = entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Rc::clone(&entry.unit));

        if let Some(existing) = existing {
            tracing::debug!(module = %name, "module registered concurrently, keeping first");
            drop(entries);
            drop(unit);
            return existing;
        }

        let unit = Rc::new(unit);
        entries.push(ModuleEntry {
            name,
            unit: Rc::clone(&unit),
        });
        unit
    }

    /// Remove a module and release its compiled unit.
    ///
    /// Returns `false` if no entry matched.
    pub fn remove(&self, name: &str) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            entries
                .iter()
                .position(|entry| entry.name == name)
                .map(|pos| entries.remove(pos))
        };

        match removed {
            Some(entry) => {
                tracing::debug!(module = %entry.name, "released module");
                drop(entry);
                true
            }
            None => false,
        }
    }

    /// Return the registered unit, or run `loader` and register its result.
    ///
    /// `loader` runs at most once per name for as long as the entry lives.
    /// A failing loader leaves the registry untouched. Importing a name
    /// from inside its own loader fails with
    /// [`BinderError::CircularImport`].
    pub fn import_or_get<F>(&self, name: &str, loader: F) -> Result<Rc<U>>
    where
        F: FnOnce() -> Result<U>,
    {
        if let Some(unit) = self.lookup(name) {
            return Ok(unit);
        }
        if self.is_loading(name) {
            return Err(BinderError::CircularImport(name.to_string()));
        }

        let _guard = self.begin_loading(name);
        let unit = loader()?;
        Ok(self.insert(name, unit))
    }

    /// Check if `name`'s loader is running
    pub fn is_loading(&self, name: &str) -> bool {
        self.loading.borrow().iter().any(|loading| loading == name)
    }

    fn begin_loading(&self, name: &str) -> LoadingGuard<'_> {
        self.loading.borrow_mut().push(name.to_string());
        LoadingGuard {
            loading: &self.loading,
            name: name.to_string(),
        }
    }

    /// Names of all registered modules in insertion order
    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|entry| entry.name.clone()).collect()
    }

    /// Remove every entry, oldest first
    pub fn clear(&self) {
        loop {
            let next = {
                let mut entries = self.entries.borrow_mut();
                if entries.is_empty() {
                    None
                } else {
                    Some(entries.remove(0))
                }
            };

            match next {
                Some(entry) => {
                    tracing::debug!(module = %entry.name, "released module on teardown");
                    drop(entry);
                }
                None => break,
            }
        }
    }

    /// Get the number of registered modules
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<U> Default for ModuleRegistry<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> fmt::Debug for ModuleRegistry<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Counts how many times it has been dropped
    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let registry = ModuleRegistry::new();
        registry.insert("math", 1);
        registry.insert("strings", 2);

        assert_eq!(registry.lookup("math").as_deref(), Some(&1));
        assert_eq!(registry.lookup("strings").as_deref(), Some(&2));
        assert!(registry.lookup("Math").is_none());
        assert_eq!(registry.names(), vec!["math", "strings"]);
        assert_eq!(registry.position("strings"), Some(1));
    }

    #[test]
    fn test_import_or_get_loads_once() {
        let registry = ModuleRegistry::new();
        let calls = Cell::new(0);
        let loader = || {
            calls.set(calls.get() + 1);
            Ok(42)
        };

        registry.import_or_get("math", loader).unwrap();
        registry
            .import_or_get("math", || {
                calls.set(calls.get() + 1);
                Ok(7)
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("math").as_deref(), Some(&42));
    }

    #[test]
    fn test_failed_loader_leaves_registry_untouched() {
        let registry: ModuleRegistry<i32> = ModuleRegistry::new();
        let result = registry.import_or_get("broken", || {
            Err(BinderError::load_failed("broken.js", "syntax error"))
        });

        assert!(matches!(result, Err(BinderError::LoadFailed { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_circular_import_loads_each_once() {
        let registry = ModuleRegistry::new();
        let a_loads = Cell::new(0);
        let b_loads = Cell::new(0);

        let result = registry.import_or_get("a", || {
            a_loads.set(a_loads.get() + 1);
            registry.import_or_get("b", || {
                b_loads.set(b_loads.get() + 1);
                registry.import_or_get("a", || Ok(0))?;
                Ok(2)
            })?;
            Ok(1)
        });

        assert!(matches!(result, Err(BinderError::CircularImport(name)) if name == "a"));
        assert_eq!((a_loads.get(), b_loads.get()), (1, 1));
        assert!(registry.is_empty());
        assert!(!registry.is_loading("a"));
        assert!(!registry.is_loading("b"));
    }

    #[test]
    fn test_caught_circular_import_completes() {
        let registry = ModuleRegistry::new();

        let a = registry.import_or_get("a", || {
            assert!(registry.is_loading("a"));
            let inner = registry.import_or_get("b", || {
                let cycle = registry.import_or_get("a", || Ok(0));
                assert!(matches!(cycle, Err(BinderError::CircularImport(_))));
                Ok(2)
            });
            assert_eq!(inner.unwrap().as_ref(), &2);
            Ok(1)
        });

        assert_eq!(a.unwrap().as_ref(), &1);
        assert_eq!(registry.names(), vec!["b", "a"]);
        // once registered, importing again is a plain lookup
        assert_eq!(registry.import_or_get("a", || Ok(9)).unwrap().as_ref(), &1);
    }

    #[test]
    fn test_remove_releases_once() {
        let drops = Rc::new(Cell::new(0));
        let registry = ModuleRegistry::new();
        registry.insert("math", Tracked(Rc::clone(&drops)));

        assert!(registry.remove("math"));
        assert_eq!(drops.get(), 1);
        assert!(!registry.remove("math"));
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let registry: ModuleRegistry<i32> = ModuleRegistry::new();
        assert!(!registry.remove("missing"));
    }

    #[test]
    fn test_release_then_reimport_reloads() {
        let drops = Rc::new(Cell::new(0));
        let loads = Cell::new(0);
        let registry = ModuleRegistry::new();
        let load = || {
            loads.set(loads.get() + 1);
            Ok(Tracked(Rc::clone(&drops)))
        };

        registry.import_or_get("math", load).unwrap();
        registry.remove("math");
        registry
            .import_or_get("math", || {
                loads.set(loads.get() + 1);
                Ok(Tracked(Rc::clone(&drops)))
            })
            .unwrap();

        assert_eq!(loads.get(), 2);
        assert_eq!(drops.get(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_duplicate_keeps_first() {
        let drops = Rc::new(Cell::new(0));
        let registry = ModuleRegistry::new();
        let first = registry.insert("math", Tracked(Rc::clone(&drops)));
        let second = registry.insert("math", Tracked(Rc::clone(&drops)));

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(drops.get(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_releases_everything() {
        let drops = Rc::new(Cell::new(0));
        let registry = ModuleRegistry::new();
        for name in ["a", "b", "c"] {
            registry.insert(name, Tracked(Rc::clone(&drops)));
        }

        registry.clear();
        assert_eq!(drops.get(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_outstanding_handle_defers_release() {
        let drops = Rc::new(Cell::new(0));
        let registry = ModuleRegistry::new();
        registry.insert("math", Tracked(Rc::clone(&drops)));

        let in_flight = registry.lookup("math").unwrap();
        registry.remove("math");
        assert_eq!(drops.get(), 0);

        drop(in_flight);
        assert_eq!(drops.get(), 1);
    }
}
