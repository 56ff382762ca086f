// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Globals installed into every QuickJS context
//!
//! Implements:
//! - `binder` - `hello`, `import`, `release`, `call`, `modules`
//! - `console` - `log`, `info`, `debug`, `warn`, `error`
//! - `print` - alias of `console.log`

pub mod binder;
pub mod console;

use crate::engine::JsUnit;
use crate::module_system::ModuleScope;
use rquickjs::{Ctx, Function};
use std::rc::Rc;

/// Install all globals into `ctx`
pub fn install<'js>(ctx: &Ctx<'js>, modules: &Rc<ModuleScope<JsUnit>>) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    globals.set("binder", binder::create_binder_object(ctx, modules)?)?;
    globals.set("console", console::create_console_object(ctx)?)?;
    globals.set("print", Function::new(ctx.clone(), console::log)?)?;

    Ok(())
}
