// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Cross-module call dispatch

use crate::engine::Session;
use crate::error::{BinderError, Result};
use crate::module_system::registry::ModuleRegistry;

/// Call `module.function(args...)` through `registry`.
///
/// A missing module is reported as [`BinderError::ModuleNotFound`]; the
/// engine is not consulted in that case. The module's unit stays alive for
/// the duration of the call even if the callee releases it.
pub fn invoke<S: Session>(
    session: &S,
    registry: &ModuleRegistry<S::Unit>,
    module: &str,
    function: &str,
    args: Vec<S::Value>,
) -> Result<S::Value> {
    let unit = registry
        .lookup(module)
        .ok_or_else(|| BinderError::module_not_found(module))?;

    invoke_unit(session, &unit, module, function, args)
}

/// Call an export of a unit that is not necessarily registered.
///
/// `module` is only used to label failures.
pub fn invoke_unit<S: Session>(
    session: &S,
    unit: &S::Unit,
    module: &str,
    function: &str,
    args: Vec<S::Value>,
) -> Result<S::Value> {
    tracing::trace!(module, function, argc = args.len(), "dispatching call");

    session
        .call_export(unit, function, args)
        .map_err(|fault| BinderError::evaluation_failed(module, function, fault))
}
