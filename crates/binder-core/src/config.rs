// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime configuration.
//!
//! Every field has a default, so an empty or partial `binder.toml` is valid.

use crate::error::{BinderError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the optional configuration file looked up in the workload root.
pub const CONFIG_FILE_NAME: &str = "binder.toml";

/// Configuration shared by the supervisor and every execution context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Leading character marking a root-relative specifier
    pub root_sigil: char,

    /// File evaluated as a workload unit's program
    pub entry_file: String,

    /// Zero-argument export invoked once the entry file is loaded
    pub entry_function: String,

    /// Directory prefix of isolated (one thread each) units
    pub thread_prefix: String,

    /// Directory prefix of shared-runtime units (reserved)
    pub service_prefix: String,

    /// Root for `@`-specifiers; the discovery directory when unset
    pub module_root: Option<PathBuf>,

    /// Default tracing filter directive
    pub log_filter: String,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            root_sigil: '@',
            entry_file: "module.js".to_string(),
            entry_function: "entry".to_string(),
            thread_prefix: "thread".to_string(),
            service_prefix: "service".to_string(),
            module_root: None,
            log_filter: "binder=info,binder_core=info".to_string(),
        }
    }
}

impl BinderConfig {
    /// Load `binder.toml` from `root` if present, otherwise defaults.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|reason| BinderError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Root path used to resolve root-relative specifiers.
    pub fn module_root_for(&self, discovery_root: &Path) -> PathBuf {
        match &self.module_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => discovery_root.join(root),
            None => discovery_root.to_path_buf(),
        }
    }
}
