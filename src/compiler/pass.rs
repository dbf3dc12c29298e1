//! The module pass interface.

use crate::{compiler::EventLog, ir::Module, Result};

/// A transformation over a whole module.
///
/// Passes must be thread-safe (Send + Sync) so a configured pipeline can be shared.
/// They receive exclusive access to the module for the duration of the run and a shared
/// event log to record what they did.
pub trait ModulePass: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Run the pass over every function of `module`.
    ///
    /// Returns `true` if the module was modified, `false` otherwise.
    ///
    /// # Arguments
    ///
    /// * `module` - The module to transform.
    /// * `events` - Log receiving the pass's events.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass cannot complete. The module may then be partially
    /// transformed.
    fn run_on_module(&self, module: &mut Module, events: &EventLog) -> Result<bool>;
}
