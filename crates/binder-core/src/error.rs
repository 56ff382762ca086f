// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the binder runtime

use std::path::PathBuf;
use thiserror::Error;

/// Result type for binder operations
pub type Result<T> = std::result::Result<T, BinderError>;

/// Errors that can occur while hosting modules
#[derive(Debug, Error)]
pub enum BinderError {
    /// Malformed or empty import specifier
    #[error("Invalid module specifier '{0}'")]
    InvalidSpecifier(String),

    /// The target file could not be read, compiled or evaluated
    #[error("Failed to load module '{}': {reason}", path.display())]
    LoadFailed {
        /// Load path derived from the specifier
        path: PathBuf,
        /// Reason for failure
        reason: String,
    },

    /// The module is imported again while its own evaluation is running
    #[error("Circular import of module '{0}'")]
    CircularImport(String),

    /// Dispatcher target absent from the registry
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// The callee threw, or the export does not exist
    #[error("Error calling '{module}.{function}': {reason}")]
    EvaluationFailed {
        /// Module the function was looked up in
        module: String,
        /// Exported function name
        function: String,
        /// Reason for failure
        reason: String,
    },

    /// Shared-runtime units are reserved but not implemented
    #[error("Service unit '{0}' is not supported yet")]
    ServiceUnsupported(String),

    /// A worker thread panicked before reporting an outcome
    #[error("Worker for '{0}' panicked")]
    WorkerPanicked(String),

    /// Configuration file could not be parsed
    #[error("Invalid configuration in '{}': {reason}", path.display())]
    Config {
        /// Configuration file
        path: PathBuf,
        /// Reason for failure
        reason: String,
    },

    /// The engine instance could not be created
    #[error("Engine error: {0}")]
    Engine(String),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

impl BinderError {
    /// Create an invalid specifier error
    pub fn invalid_specifier(specifier: impl Into<String>) -> Self {
        Self::InvalidSpecifier(specifier.into())
    }

    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Create a load failure for `path`
    pub fn load_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::LoadFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an evaluation failure for `module.function`
    pub fn evaluation_failed(
        module: impl Into<String>,
        function: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::EvaluationFailed {
            module: module.into(),
            function: function.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<rquickjs::Error> for BinderError {
    fn from(err: rquickjs::Error) -> Self {
        Self::Engine(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BinderError::module_not_found("missing").to_string(),
            "Cannot find module 'missing'"
        );
        assert_eq!(
            BinderError::evaluation_failed("math", "add", "boom").to_string(),
            "Error calling 'math.add': boom"
        );
        assert_eq!(
            BinderError::load_failed("/app/x.js", "no such file").to_string(),
            "Failed to load module '/app/x.js': no such file"
        );
        assert_eq!(
            BinderError::CircularImport("a".into()).to_string(),
            "Circular import of module 'a'"
        );
    }
}
