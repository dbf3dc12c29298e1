//! Event recording for module passes.
//!
//! A pass reports what it decided through an [`EventLog`]: functions it skipped, call sites
//! it classified, hooks it declared and inserted, and whether the result verified. Callers
//! query the log by kind after a run, or drop it.
//!
//! # Example
//!
//! ```rust
//! use cmplog_routines::compiler::{EventKind, EventLog};
//! use cmplog_routines::ir::{BlockId, FuncId};
//!
//! let log = EventLog::new();
//! log.record(EventKind::HookInserted)
//!     .at(FuncId::new(0), BlockId::new(0))
//!     .message("__cmplog_rtn_hook_str before %3");
//!
//! assert!(log.has(EventKind::HookInserted));
//! assert_eq!(log.filter_kind(EventKind::HookInserted).count(), 1);
//! ```

use crate::ir::{BlockId, FuncId};

/// What an [`Event`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A pass manager started a pass.
    PassStarted,
    /// A pass returned successfully.
    PassCompleted,
    /// A pass returned an error.
    PassFailed,
    /// A function was excluded by the ignore predicate.
    FunctionSkipped,
    /// A call site was assigned a comparison category.
    CallClassified,
    /// A hook routine was added to the module.
    HookDeclared,
    /// A hook call was placed before a call site.
    HookInserted,
    /// The rewritten module was accepted by the verifier.
    ModuleVerified,
}

impl EventKind {
    /// Message used when an event is recorded without one.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::PassStarted => "pass started",
            Self::PassCompleted => "pass completed",
            Self::PassFailed => "pass failed",
            Self::FunctionSkipped => "function skipped",
            Self::CallClassified => "call classified",
            Self::HookDeclared => "hook declared",
            Self::HookInserted => "hook inserted",
            Self::ModuleVerified => "module verified",
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Function concerned, if any.
    pub function: Option<FuncId>,
    /// Block within [`Event::function`], if any.
    pub block: Option<BlockId>,
    /// Free-form detail.
    pub message: String,
    /// Name of the reporting pass, if any.
    pub pass: Option<String>,
}

/// Fluent constructor returned by [`EventLog::record`].
///
/// The event is appended to the log when the builder is dropped, so a statement like
/// `log.record(kind).function(id);` records it.
pub struct EventBuilder<'a> {
    log: &'a EventLog,
    event: Event,
}

impl EventBuilder<'_> {
    /// Locates the event at a block of a function.
    pub fn at(mut self, function: FuncId, block: BlockId) -> Self {
        self.event.function = Some(function);
        self.event.block = Some(block);
        self
    }

    /// Locates the event at a function.
    pub fn function(mut self, function: FuncId) -> Self {
        self.event.function = Some(function);
        self
    }

    /// Replaces the default message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.event.message = message.into();
        self
    }

    /// Names the reporting pass.
    pub fn pass(mut self, name: impl Into<String>) -> Self {
        self.event.pass = Some(name.into());
        self
    }
}

impl Drop for EventBuilder<'_> {
    fn drop(&mut self) {
        let kind = self.event.kind;
        let event = std::mem::replace(
            &mut self.event,
            Event {
                kind,
                function: None,
                block: None,
                message: String::new(),
                pass: None,
            },
        );
        self.log.events.push(event);
    }
}

/// Append-only log shared by the passes of one run.
///
/// Recording takes `&self`, so a log can be handed to passes alongside a `&mut Module`.
#[derive(Debug, Default)]
pub struct EventLog {
    events: boxcar::Vec<Event>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.count() == 0
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.count()
    }

    /// Starts an event of `kind`; it is recorded when the builder drops.
    pub fn record(&self, kind: EventKind) -> EventBuilder<'_> {
        EventBuilder {
            log: self,
            event: Event {
                kind,
                function: None,
                block: None,
                message: kind.description().to_string(),
                pass: None,
            },
        }
    }

    /// Returns `true` if an event of `kind` was recorded.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.iter().any(|e| e.kind == kind)
    }

    /// Counts the events of `kind`.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.filter_kind(kind).count()
    }

    /// Iterates all events in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().map(|(_, e)| e)
    }

    /// Iterates the events of `kind` in recording order.
    pub fn filter_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(move |e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_records_on_drop() {
        let log = EventLog::new();
        log.record(EventKind::CallClassified)
            .at(FuncId::new(2), BlockId::new(1))
            .pass("CmpLogRoutines");

        let event = log.iter().next().unwrap();
        assert_eq!(event.kind, EventKind::CallClassified);
        assert_eq!(event.function, Some(FuncId::new(2)));
        assert_eq!(event.block, Some(BlockId::new(1)));
        assert_eq!(event.message, "call classified");
        assert_eq!(event.pass.as_deref(), Some("CmpLogRoutines"));
    }

    #[test]
    fn test_queries_by_kind() {
        let log = EventLog::new();
        assert!(log.is_empty());

        log.record(EventKind::HookDeclared).function(FuncId::new(0));
        log.record(EventKind::HookInserted).message("first");
        log.record(EventKind::HookInserted).message("second");

        assert_eq!(log.len(), 3);
        assert!(!log.has(EventKind::ModuleVerified));
        assert_eq!(log.count_kind(EventKind::HookInserted), 2);
        let messages: Vec<_> = log
            .filter_kind(EventKind::HookInserted)
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(messages, ["first", "second"]);
    }

    #[test]
    fn test_shared_recording() {
        let log = EventLog::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    log.record(EventKind::FunctionSkipped);
                });
            }
        });
        assert_eq!(log.count_kind(EventKind::FunctionSkipped), 4);
    }
}
