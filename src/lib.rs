// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! # cmplog-routines
//!
//! Comparison-routine logging instrumentation for fuzzing, over a small LLVM-shaped IR.
//!
//! Coverage-guided fuzzers stall on checks like `if (memcmp(buf, "MAGIC", 5) == 0)` because
//! every wrong guess looks the same to the coverage map. This crate rewrites a program module
//! so that a logging hook runs right before each call to a comparison routine, receiving both
//! operands (and the length, for bounded compares). A runtime can then record the operands
//! and feed them back to the mutator.
//!
//! ## Features
//!
//! - **Eight comparison categories** - `memcmp`/`strcmp`/`strncmp` families, generic
//!   two-pointer routines and four C++ `std::string` comparison flavours
//! - **Signature-checked classification** - a call is only hooked when the callee's
//!   parameter types fit the hook's ABI
//! - **Lazy hook declaration** - modules without comparisons are left untouched
//! - **Verification** - every rewritten module is checked before it is handed back
//! - **Structured events** - every decision is recorded in a lock-free [`compiler::EventLog`]
//!
//! ## Quick Start
//!
//! ```rust
//! use cmplog_routines::prelude::*;
//!
//! let mut module = Module::new("target");
//! let memcmp = module.add_function(
//!     "memcmp",
//!     FunctionType::new(
//!         vec![IrType::i8_ptr(), IrType::i8_ptr(), IrType::i64()],
//!         IrType::i32(),
//!     ),
//! )?;
//! let check = module.add_function(
//!     "check",
//!     FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32()),
//! )?;
//! let entry = module.function_mut(check)?.append_block();
//!
//! let mut builder = IrBuilder::at_end(&mut module, check, entry);
//! let (a, b) = (builder.arg(0)?, builder.arg(1)?);
//! let len = builder.const_int(IrType::i64(), 5)?;
//! let result = builder.create_call(memcmp, &[a, b, len])?;
//! builder.create_ret(result)?;
//!
//! let events = EventLog::new();
//! let report = CmpLogRoutinesPass::default().instrument(&mut module, &events)?;
//! assert_eq!(report.count(Category::MemCompareN), 1);
//! println!("{module}");
//! # Ok::<(), cmplog_routines::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - Modules, functions, blocks, instructions, the [`ir::IrBuilder`] and the
//!   structural [`ir::Verifier`]
//! - [`compiler`] - The [`compiler::ModulePass`] trait, [`compiler::PassManager`] and the
//!   event log
//! - [`cmplog`] - Classification, hook declaration, call-site rewriting and the
//!   [`cmplog::CmpLogRoutinesPass`] itself
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with the crate's [`Error`] type. Failures
//! discovered after rewriting are wrapped in [`Error::InstrumentationFault`], which names the
//! pass and carries the verifier's findings.

#[macro_use]
pub(crate) mod error;

pub mod cmplog;
pub mod compiler;
pub mod ir;
pub mod prelude;

#[cfg(test)]
pub(crate) mod test;

/// The error type for all fallible operations in this crate.
pub use error::Error;

/// `Result<T, Error>`, used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
