// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module system
//!
//! - `resolver` - specifier to load path and canonical name
//! - `registry` - insertion-ordered table of loaded modules, one per context
//! - `dispatch` - routes `call(module, function, ...args)` to the engine
//! - `scope` - the three bundled per execution context

pub mod dispatch;
mod registry;
mod resolver;
mod scope;

pub use registry::{ModuleEntry, ModuleRegistry};
pub use resolver::{canonical_name, resolve, ModuleResolver, ResolvedModule};
pub use scope::ModuleScope;
