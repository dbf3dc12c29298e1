//! Comparison-routine logging instrumentation.
//!
//! Fuzzers make progress past "magic value" checks much faster when they can see the operands
//! of comparisons that fail. This module recognises calls to comparison routines (C library
//! `memcmp`/`strcmp` families, popular third-party equivalents, C++ `std::string` operators
//! and generic two-pointer routines) and inserts a call to a logging hook in front of each
//! one. The hook receives the compared operands as byte pointers, plus a 64-bit length for the
//! bounded routines.
//!
//! # Architecture
//!
//! - [`Category`] - The eight comparison categories and their hook ABI
//! - [`patterns`] - Exact-name sets and the versioned managed-string [`MarkerTable`]
//! - [`classify()`] / [`Classifier`] - Call-site classification into [`Worklists`]
//! - [`HookTable`] - Lazy hook declaration
//! - [`rewrite`] - Argument adaptation and hook insertion
//! - [`IgnorePredicate`] / [`RuntimeFunctionFilter`] - Functions excluded from instrumentation
//! - [`CmpLogRoutinesPass`] - The module pass tying it together
//!
//! # Hook ABI
//!
//! | Category | Hook | Parameters |
//! |---|---|---|
//! | `GenericPointerBinary` | `__cmplog_rtn_hook` | `(i8*, i8*)` |
//! | `MemCompareN` | `__cmplog_rtn_hook_n` | `(i8*, i8*, i64)` |
//! | `StrCompare` | `__cmplog_rtn_hook_str` | `(i8*, i8*)` |
//! | `StrNCompare` | `__cmplog_rtn_hook_strn` | `(i8*, i8*, i64)` |
//! | `GccStdStringStdString` | `__cmplog_rtn_gcc_stdstring_stdstring` | `(i8*, i8*)` |
//! | `GccStdStringCString` | `__cmplog_rtn_gcc_stdstring_cstring` | `(i8*, i8*)` |
//! | `LlvmStdStringStdString` | `__cmplog_rtn_llvm_stdstring_stdstring` | `(i8*, i8*)` |
//! | `LlvmStdStringCString` | `__cmplog_rtn_llvm_stdstring_cstring` | `(i8*, i8*)` |
//!
//! All hooks return `void`. With [`CmpLogConfig::extended_header`] set, every name carries
//! an `_extended` suffix.

mod category;
mod classify;
mod config;
mod hooks;
mod ignore;
mod pass;
pub mod patterns;
pub mod rewrite;

pub use category::{Category, CategoryCounts, HookArgs};
pub use classify::{classify, CallSite, Classifier, SignatureFlags, Worklists};
pub use config::{CmpLogConfig, EXTENDED_FLAG};
pub use hooks::HookTable;
pub use ignore::{IgnorePredicate, RuntimeFunctionFilter};
pub use pass::{CmpLogRoutinesPass, InstrumentationReport};
pub use patterns::{ArgShape, MarkerRule, MarkerTable};
