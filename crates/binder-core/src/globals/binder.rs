// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `binder` object: what hosted scripts use to reach each other
//!
//! ```js
//! binder.import("@shared/math.js");      // -> "math"
//! binder.call("math", "add", 1, 2);      // -> 3
//! binder.release("math");                // -> true
//! ```
//!
//! Failures are thrown as JS errors carrying the runtime's error message.

use crate::engine::{JsSession, JsUnit};
use crate::error::BinderError;
use crate::module_system::ModuleScope;
use rquickjs::function::Rest;
use rquickjs::{Ctx, Exception, Function, Object, Value};
use std::rc::Rc;

/// Create the `binder` object bound to `modules`
pub fn create_binder_object<'js>(
    ctx: &Ctx<'js>,
    modules: &Rc<ModuleScope<JsUnit>>,
) -> rquickjs::Result<Object<'js>> {
    let binder = Object::new(ctx.clone())?;

    binder.set("hello", Function::new(ctx.clone(), hello)?)?;

    let scope = Rc::clone(modules);
    binder.set(
        "import",
        Function::new(ctx.clone(), move |ctx: Ctx<'js>, specifier: String| {
            scope
                .import(&JsSession::new(ctx.clone()), &specifier)
                .map_err(|err| throw(&ctx, err))
        })?,
    )?;

    let scope = Rc::clone(modules);
    binder.set(
        "release",
        Function::new(ctx.clone(), move |name: String| scope.release(&name))?,
    )?;

    let scope = Rc::clone(modules);
    binder.set(
        "call",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, module: String, function: String, args: Rest<Value<'js>>| {
                scope
                    .call(&JsSession::new(ctx.clone()), &module, &function, args.0)
                    .map_err(|err| throw(&ctx, err))
            },
        )?,
    )?;

    let scope = Rc::clone(modules);
    binder.set("modules", Function::new(ctx.clone(), move || scope.modules())?)?;

    Ok(binder)
}

/// Implementation of binder.hello
fn hello() {
    tracing::debug!("binder.hello()");
    println!("hello, binder");
}

fn throw(ctx: &Ctx<'_>, err: BinderError) -> rquickjs::Error {
    Exception::throw_message(ctx, &err.to_string())
}
