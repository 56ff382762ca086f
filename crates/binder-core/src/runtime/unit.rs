// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Workload unit discovery

use crate::config::BinderConfig;
use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of a workload unit, decided by its directory name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Runs on its own thread in its own execution context
    IsolatedThread,
    /// Shares one runtime with other services (reserved)
    SharedService,
    /// Name matches no known prefix
    Invalid,
}

impl UnitKind {
    /// Classify a directory entry name.
    ///
    /// Returns `None` for the `.` and `..` pseudo-entries. A prefix only
    /// matches names strictly longer than itself, so a directory called
    /// just `thread` is invalid.
    pub fn classify(name: &str, config: &BinderConfig) -> Option<Self> {
        if name == "." || name == ".." {
            return None;
        }

        let has_prefix = |prefix: &str| name.len() > prefix.len() && name.starts_with(prefix);

        Some(if has_prefix(&config.thread_prefix) {
            UnitKind::IsolatedThread
        } else if has_prefix(&config.service_prefix) {
            UnitKind::SharedService
        } else {
            UnitKind::Invalid
        })
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::IsolatedThread => write!(f, "thread"),
            UnitKind::SharedService => write!(f, "service"),
            UnitKind::Invalid => write!(f, "invalid"),
        }
    }
}

/// A discovered workload unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// Directory name
    pub name: String,
    /// Directory path
    pub path: PathBuf,
    /// Classification of `name`
    pub kind: UnitKind,
}

impl WorkUnit {
    /// The unit's entry file
    pub fn entry_path(&self, config: &BinderConfig) -> PathBuf {
        self.path.join(&config.entry_file)
    }
}

/// List and classify the immediate entries of `root`, sorted by name.
///
/// A missing or unreadable `root` is an error.
pub fn discover(root: &Path, config: &BinderConfig) -> Result<Vec<WorkUnit>> {
    let mut units = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if let Some(kind) = UnitKind::classify(&name, config) {
            units.push(WorkUnit {
                path: entry.path(),
                name,
                kind,
            });
        }
    }

    units.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(units)
}
