//! Selection of functions that must not be instrumented.
//!
//! Sanitizer runtimes, fuzzer drivers and compiler-generated glue call comparison routines
//! too, but hooking them would log comparisons the fuzzer never controls (or recurse into
//! the logging runtime itself).

use crate::ir::Function;

/// Decides whether a function's body is excluded from instrumentation.
///
/// Implemented for any `Fn(&Function) -> bool + Send + Sync` closure.
pub trait IgnorePredicate: Send + Sync {
    /// Returns `true` if calls inside `function` must not be hooked.
    fn is_ignored(&self, function: &Function) -> bool;
}

impl<F> IgnorePredicate for F
where
    F: Fn(&Function) -> bool + Send + Sync,
{
    fn is_ignored(&self, function: &Function) -> bool {
        self(function)
    }
}

const IGNORED_PREFIXES: &[&str] = &[
    "asan.",
    "llvm.",
    "sancov.",
    "__ubsan",
    "ign.",
    "__afl",
    "_fini",
    "__libc_",
    "__asan",
    "__msan",
    "__cmplog",
    "__sancov",
    "__san",
    "__cxx_",
    "__decide_deferred",
    "_GLOBAL__",
    "_ZN6__asan",
    "_ZN6__lsan",
    "_ZN6__msan",
    "_ZN5__tsan",
    "_ZN6__tsan",
    "_ZN7__ubsan",
    "msan.",
    "LLVMFuzzerM",
    "LLVMFuzzerC",
    "LLVMFuzzerI",
    "maybe_duplicate_stderr",
    "discard_output",
    "close_fd_mask",
    "ExecuteFilesOnyByOne",
];

const IGNORED_SUBSTRINGS: &[&str] = &[
    "__asan",
    "__msan",
    "__ubsan",
    "__lsan",
    "__san",
    "__sanitize",
    "DebugCounter",
    "DwarfDebug",
    "DebugLoc",
];

/// Ignores instrumentation runtimes, sanitizers and fuzzer driver code by symbol name.
///
/// `LLVMFuzzerTestOneInput` is the fuzz target itself; the builtin lists do not match it.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::cmplog::RuntimeFunctionFilter;
///
/// let filter = RuntimeFunctionFilter::new().with_prefix("my_runtime_");
/// assert!(filter.ignores_name("__asan_report_load1"));
/// assert!(filter.ignores_name("my_runtime_init"));
/// assert!(!filter.ignores_name("LLVMFuzzerTestOneInput"));
/// assert!(!filter.ignores_name("parse_header"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFunctionFilter {
    prefixes: Vec<String>,
    substrings: Vec<String>,
}

impl RuntimeFunctionFilter {
    /// Creates the filter with the builtin prefix and substring lists.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefixes: IGNORED_PREFIXES.iter().map(ToString::to_string).collect(),
            substrings: IGNORED_SUBSTRINGS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Creates a filter that ignores nothing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            substrings: Vec::new(),
        }
    }

    /// Adds a name prefix to ignore.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Adds a name substring to ignore.
    #[must_use]
    pub fn with_substring(mut self, substring: impl Into<String>) -> Self {
        self.substrings.push(substring.into());
        self
    }

    /// Returns `true` if a function with this symbol name is ignored.
    #[must_use]
    pub fn ignores_name(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.substrings.iter().any(|s| name.contains(s.as_str()))
    }
}

impl Default for RuntimeFunctionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl IgnorePredicate for RuntimeFunctionFilter {
    fn is_ignored(&self, function: &Function) -> bool {
        self.ignores_name(function.name())
    }
}
