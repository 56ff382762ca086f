// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module specifier resolution
//!
//! Turns an import specifier into the path the engine loads and the
//! canonical name the registry is keyed by. Resolution never touches the
//! file system; a missing file surfaces later as a load failure.

use crate::error::{BinderError, Result};
use std::path::{is_separator, Path, PathBuf};

/// Result of resolving a specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Path handed to the engine loader
    pub load_path: PathBuf,
    /// Registry key
    pub name: String,
}

/// Resolves specifiers against one context's root path
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// Root for root-relative specifiers
    root: PathBuf,
    /// Leading character marking a root-relative specifier
    sigil: char,
}

impl ModuleResolver {
    /// Create a resolver rooted at `root`
    pub fn new(root: impl Into<PathBuf>, sigil: char) -> Self {
        Self {
            root: root.into(),
            sigil,
        }
    }

    /// The root path root-relative specifiers resolve against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a module specifier
    pub fn resolve(&self, specifier: &str) -> Result<ResolvedModule> {
        resolve(specifier, &self.root, self.sigil)
    }

    /// Canonical name of a specifier, without computing its load path
    pub fn canonical_name(&self, specifier: &str) -> Result<String> {
        canonical_name(self.strip_sigil(specifier).unwrap_or(specifier))
            .map(str::to_string)
            .ok_or_else(|| BinderError::invalid_specifier(specifier))
    }

    fn strip_sigil<'a>(&self, specifier: &'a str) -> Option<&'a str> {
        specifier.strip_prefix(self.sigil)
    }
}

/// Resolve `specifier` against `root`.
///
/// Root-relative specifiers (`@utils/math.js`) load from `root` joined with
/// the text after the sigil; anything else is used as given.
pub fn resolve(specifier: &str, root: &Path, sigil: char) -> Result<ResolvedModule> {
    if specifier.is_empty() {
        return Err(BinderError::invalid_specifier(specifier));
    }

    let (load_path, relative) = match specifier.strip_prefix(sigil) {
        Some(rest) => (root.join(rest.trim_start_matches(is_separator)), rest),
        None => (PathBuf::from(specifier), specifier),
    };

    let name = canonical_name(relative).ok_or_else(|| BinderError::invalid_specifier(specifier))?;

    Ok(ResolvedModule {
        load_path,
        name: name.to_string(),
    })
}

/// The last path component with one trailing extension removed.
///
/// Returns `None` when nothing is left, e.g. for `"."`, `"dir/"` or `".js"`.
pub fn canonical_name(specifier: &str) -> Option<&str> {
    let file = match specifier.rfind(is_separator) {
        Some(pos) => &specifier[pos + 1..],
        None => specifier,
    };

    let stem = match file.rfind('.') {
        Some(pos) => &file[..pos],
        None => file,
    };

    (!stem.is_empty()).then_some(stem)
}
