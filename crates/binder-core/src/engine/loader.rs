// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! File-system resolver and loader for ES `import` statements
//!
//! Relative imports resolve against the importing module's directory, bare
//! names against the context's module root. Paths are joined with
//! `std::path`, so absolute roots work as expected.

use rquickjs::loader::{Loader, Resolver};
use rquickjs::module::Declared;
use rquickjs::{Ctx, Error, Module};
use std::path::{Component, Path, PathBuf};

/// Resolves `import` specifiers to file paths
#[derive(Debug, Clone)]
pub struct ModuleFileResolver {
    root: PathBuf,
}

impl ModuleFileResolver {
    /// Create a resolver whose bare names load from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `name` as imported from the module called `base`
    pub fn resolve_path(&self, base: &str, name: &str) -> Option<PathBuf> {
        let joined = if name.starts_with("./") || name.starts_with("../") {
            Path::new(base).parent().unwrap_or(Path::new("")).join(name)
        } else {
            self.root.join(name)
        };

        let path = normalize(&joined);
        if path.is_file() {
            return Some(path);
        }

        let with_extension = PathBuf::from(format!("{}.js", path.display()));
        with_extension.is_file().then_some(with_extension)
    }
}

impl Resolver for ModuleFileResolver {
    fn resolve<'js>(
        &mut self,
        _ctx: &Ctx<'js>,
        base: &str,
        name: &str,
    ) -> rquickjs::Result<String> {
        self.resolve_path(base, name)
            .map(|path| path.to_string_lossy().into_owned())
            .ok_or_else(|| Error::new_resolving(base, name))
    }
}

/// Loads resolved module files and sets their `import.meta`
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleFileLoader;

impl Loader for ModuleFileLoader {
    fn load<'js>(&mut self, ctx: &Ctx<'js>, name: &str) -> rquickjs::Result<Module<'js, Declared>> {
        declare(ctx, Path::new(name), false)
    }
}

/// Compile the module file at `path` without evaluating it.
///
/// `import.meta.url` is the `file://` URL of the file and `import.meta.main`
/// tells entry files apart from imported ones.
pub fn declare<'js>(
    ctx: &Ctx<'js>,
    path: &Path,
    main: bool,
) -> rquickjs::Result<Module<'js, Declared>> {
    let source = std::fs::read(path)?;
    let module = Module::declare(ctx.clone(), path.to_string_lossy().into_owned(), source)?;

    let meta = module.meta()?;
    meta.set("url", file_url(path))?;
    meta.set("main", main)?;

    Ok(module)
}

fn file_url(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/app/./lib/../math.js")), PathBuf::from("/app/math.js"));
        assert_eq!(normalize(Path::new("units/a/../../b.js")), PathBuf::from("b.js"));
        assert_eq!(normalize(Path::new("../b.js")), PathBuf::from("../b.js"));
    }

    #[test]
    fn test_resolve_against_absolute_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/helper.js"), "").unwrap();
        fs::write(dir.path().join("shared.js"), "").unwrap();

        let resolver = ModuleFileResolver::new(dir.path());
        let base = dir.path().join("lib/scale.js");
        let base = base.to_string_lossy();

        assert_eq!(
            resolver.resolve_path(&base, "./helper.js"),
            Some(dir.path().join("lib/helper.js"))
        );
        assert_eq!(
            resolver.resolve_path(&base, "./helper"),
            Some(dir.path().join("lib/helper.js"))
        );
        assert_eq!(
            resolver.resolve_path(&base, "../shared.js"),
            Some(dir.path().join("shared.js"))
        );
        assert_eq!(
            resolver.resolve_path(&base, "shared.js"),
            Some(dir.path().join("shared.js"))
        );
        assert_eq!(resolver.resolve_path(&base, "./absent.js"), None);
    }
}
