// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Console object for hosted scripts

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object};

/// Create the console object
pub fn create_console_object<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<Object<'js>> {
    let console = Object::new(ctx.clone())?;

    console.set("log", Function::new(ctx.clone(), log)?)?;
    console.set("info", Function::new(ctx.clone(), log)?)?;
    console.set("debug", Function::new(ctx.clone(), debug)?)?;
    console.set("warn", Function::new(ctx.clone(), warn)?)?;
    console.set("error", Function::new(ctx.clone(), error)?)?;

    Ok(console)
}

/// Implementation of console.log
pub fn log(args: Rest<Coerced<String>>) {
    println!("{}", format_args(&args));
}

/// Implementation of console.debug
pub fn debug(args: Rest<Coerced<String>>) {
    tracing::debug!(target: "binder_core::script", "{}", format_args(&args));
}

/// Implementation of console.warn
pub fn warn(args: Rest<Coerced<String>>) {
    eprintln!("{}", format_args(&args));
}

/// Implementation of console.error
pub fn error(args: Rest<Coerced<String>>) {
    eprintln!("{}", format_args(&args));
}

/// Join arguments the way console.log does
fn format_args(args: &Rest<Coerced<String>>) -> String {
    args.0
        .iter()
        .map(|arg| arg.0.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
