//! Sequential execution of module passes.

use std::time::Instant;

use crate::{
    compiler::{EventKind, EventLog, ModulePass},
    ir::Module,
    Result,
};

/// Runs an ordered list of module passes, each exactly once.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::cmplog::CmpLogRoutinesPass;
/// use cmplog_routines::compiler::{EventLog, PassManager};
/// use cmplog_routines::ir::Module;
///
/// let mut manager = PassManager::new();
/// manager.add(CmpLogRoutinesPass::default());
///
/// let mut module = Module::new("empty");
/// let log = EventLog::new();
/// assert!(!manager.run(&mut module, &log)?);
/// # Ok::<(), cmplog_routines::Error>(())
/// ```
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn ModulePass>>,
}

impl PassManager {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Appends a pass to the pipeline.
    pub fn add(&mut self, pass: impl ModulePass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Appends an already boxed pass to the pipeline.
    pub fn add_boxed(&mut self, pass: Box<dyn ModulePass>) -> &mut Self {
        self.passes.push(pass);
        self
    }

    /// Returns the names of the scheduled passes in execution order.
    #[must_use]
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Returns the number of scheduled passes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Returns `true` if no passes are scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Runs every pass once, in order.
    ///
    /// Returns `true` if any pass modified the module.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first pass error. An error event naming the pass is recorded
    /// before returning.
    pub fn run(&self, module: &mut Module, events: &EventLog) -> Result<bool> {
        let mut any_changed = false;

        for pass in &self.passes {
            events
                .record(EventKind::PassStarted)
                .pass(pass.name())
                .message(format!("{}: {}", pass.name(), pass.description()));
            log::debug!("running pass {}", pass.name());

            let start = Instant::now();
            let changed = match pass.run_on_module(module, events) {
                Ok(changed) => changed,
                Err(e) => {
                    events
                        .record(EventKind::PassFailed)
                        .pass(pass.name())
                        .message(format!("{} failed: {}", pass.name(), e));
                    return Err(e);
                }
            };

            events.record(EventKind::PassCompleted).pass(pass.name()).message(format!(
                "{} {} in {:?}",
                pass.name(),
                if changed { "changed the module" } else { "made no changes" },
                start.elapsed()
            ));
            any_changed |= changed;
        }

        Ok(any_changed)
    }
}
