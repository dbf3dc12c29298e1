//! The routine-comparison logging pass.

use strum::IntoEnumIterator;

use crate::{
    cmplog::{
        rewrite::insert_hook, Category, CategoryCounts, Classifier, CmpLogConfig, HookTable,
        IgnorePredicate, RuntimeFunctionFilter,
    },
    compiler::{EventKind, EventLog, ModulePass},
    ir::{Module, StructuralVerifier, Verifier},
    Error, Result,
};

/// What one run of [`CmpLogRoutinesPass`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentationReport {
    /// Hooks inserted per category, indexed by [`Category::index`].
    pub sites: CategoryCounts,
    /// Names of the hooks used, in rewrite order.
    pub hooks: Vec<String>,
    /// Number of functions excluded by the ignore predicate.
    pub functions_skipped: usize,
}

impl InstrumentationReport {
    /// Returns the number of hooks inserted for `category`.
    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        self.sites[category.index()]
    }

    /// Returns the total number of hooks inserted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.sites.iter().sum()
    }

    /// Returns `true` if the module was changed.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.total() > 0
    }
}

/// Inserts a logging hook before every call to a recognised comparison routine.
///
/// The pass runs in three stages over one module:
///
/// 1. **Classification**: every call of every non-ignored function is assigned at most one
///    [`Category`], without modifying the module.
/// 2. **Rewriting**: the hooks of all matched categories are checked against existing
///    declarations, then declared. For each category in order, and each site in program
///    order, a call to the category's hook is inserted immediately before the original call.
///    Arguments are adapted to the hook's `(i8*, i8*[, i64])` signature.
/// 3. **Verification**: the module is checked by the configured [`Verifier`]. A failure is
///    reported as [`Error::InstrumentationFault`].
///
/// A module without any matching call is left exactly as it was.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::cmplog::{Category, CmpLogConfig, CmpLogRoutinesPass};
/// use cmplog_routines::compiler::EventLog;
/// use cmplog_routines::ir::{FunctionType, IrBuilder, IrType, Module};
///
/// let mut module = Module::new("demo");
/// let strcmp = module.add_function(
///     "strcmp",
///     FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32()),
/// )?;
/// let check = module.add_function(
///     "check",
///     FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32()),
/// )?;
/// let entry = module.function_mut(check)?.append_block();
/// let mut builder = IrBuilder::at_end(&mut module, check, entry);
/// let (a, b) = (builder.arg(0)?, builder.arg(1)?);
/// let result = builder.create_call(strcmp, &[a, b])?;
/// builder.create_ret(result)?;
///
/// let pass = CmpLogRoutinesPass::new(CmpLogConfig::new());
/// let report = pass.instrument(&mut module, &EventLog::new())?;
/// assert_eq!(report.count(Category::StrCompare), 1);
/// assert!(module.function_by_name("__cmplog_rtn_hook_str").is_some());
/// # Ok::<(), cmplog_routines::Error>(())
/// ```
pub struct CmpLogRoutinesPass {
    config: CmpLogConfig,
    ignore: Box<dyn IgnorePredicate>,
    verifier: Box<dyn Verifier>,
}

impl CmpLogRoutinesPass {
    /// Name under which the pass reports events and faults.
    pub const NAME: &'static str = "CmpLogRoutines";

    /// Creates the pass with the runtime function filter and the structural verifier.
    #[must_use]
    pub fn new(config: CmpLogConfig) -> Self {
        Self {
            config,
            ignore: Box::new(RuntimeFunctionFilter::new()),
            verifier: Box::new(StructuralVerifier),
        }
    }

    /// Replaces the ignore predicate.
    #[must_use]
    pub fn with_ignore(mut self, ignore: impl IgnorePredicate + 'static) -> Self {
        self.ignore = Box::new(ignore);
        self
    }

    /// Replaces the post-rewrite verifier.
    #[must_use]
    pub fn with_verifier(mut self, verifier: impl Verifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CmpLogConfig {
        &self.config
    }

    /// Instruments `module` and reports what was done.
    ///
    /// # Errors
    ///
    /// - [`Error::SignatureMismatch`] if a hook name is already declared with a different
    ///   signature; the module is left unchanged
    /// - [`Error::InvalidCast`] if a length argument cannot be converted to `i64`
    /// - [`Error::InstrumentationFault`] if the rewritten module fails verification
    pub fn instrument(
        &self,
        module: &mut Module,
        events: &EventLog,
    ) -> Result<InstrumentationReport> {
        let worklists =
            Classifier::new(&self.config.markers, self.ignore.as_ref()).scan(module, events);

        let mut report = InstrumentationReport {
            functions_skipped: worklists.skipped().len(),
            ..InstrumentationReport::default()
        };

        if worklists.is_empty() {
            log::debug!("{}: no comparison routines called", module.name());
            return Ok(report);
        }

        let needed: Vec<Category> = Category::iter()
            .filter(|&category| !worklists.get(category).is_empty())
            .collect();

        let mut hooks = HookTable::new(self.config.extended_header);
        for &category in &needed {
            hooks.check(module, category)?;
        }
        let declared = needed
            .iter()
            .map(|&category| hooks.declare(module, category, events))
            .collect::<Result<Vec<_>>>()?;

        for (&category, hook) in needed.iter().zip(declared) {
            let sites = worklists.get(category);
            let hook_name = hooks.name(category);
            for site in sites {
                insert_hook(module, hook, category.hook_args(), site)?;
                events
                    .record(EventKind::HookInserted)
                    .at(site.function, site.block)
                    .pass(Self::NAME)
                    .message(format!("{hook_name} before {}", site.inst));
            }
            report.sites[category.index()] = sites.len();
            report.hooks.push(hook_name);
        }

        self.verifier
            .verify(module)
            .map_err(|source| Error::InstrumentationFault {
                pass: Self::NAME,
                source: Box::new(source),
            })?;
        events
            .record(EventKind::ModuleVerified)
            .pass(Self::NAME)
            .message(format!("{} accepted {}", self.verifier.name(), module.name()));

        log::info!(
            "{}: inserted {} comparison hooks ({} skipped functions)",
            module.name(),
            report.total(),
            report.functions_skipped
        );
        Ok(report)
    }
}

impl Default for CmpLogRoutinesPass {
    fn default() -> Self {
        Self::new(CmpLogConfig::default())
    }
}

impl ModulePass for CmpLogRoutinesPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Logs the operands of calls to comparison routines"
    }

    fn run_on_module(&self, module: &mut Module, events: &EventLog) -> Result<bool> {
        self.instrument(module, events).map(|report| report.is_modified())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{FunctionType, IrType},
        test::single_call_module,
    };

    struct Rejecting;

    impl Verifier for Rejecting {
        fn name(&self) -> &'static str {
            "Rejecting"
        }

        fn verify(&self, _module: &Module) -> Result<()> {
            Err(Error::Verification(vec!["rejected".to_string()]))
        }
    }

    fn strcmp_ty() -> FunctionType {
        FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32())
    }

    #[test]
    fn test_verification_failure_is_a_fault() {
        let (mut module, _, _) = single_call_module("strcmp", strcmp_ty());
        let pass = CmpLogRoutinesPass::default().with_verifier(Rejecting);
        let result = pass.instrument(&mut module, &EventLog::new());
        assert!(matches!(
            result,
            Err(Error::InstrumentationFault { pass: "CmpLogRoutines", .. })
        ));
    }

    #[test]
    fn test_no_match_skips_verification() {
        let (mut module, _, _) = single_call_module(
            "puts",
            FunctionType::new(vec![IrType::i8_ptr()], IrType::i32()),
        );
        let pass = CmpLogRoutinesPass::default().with_verifier(Rejecting);
        let report = pass.instrument(&mut module, &EventLog::new()).unwrap();
        assert!(!report.is_modified());
    }

    #[test]
    fn test_report_and_events() {
        let (mut module, _, _) = single_call_module("strcmp", strcmp_ty());
        let events = EventLog::new();
        let report = CmpLogRoutinesPass::default()
            .instrument(&mut module, &events)
            .unwrap();

        assert_eq!(report.total(), 1);
        assert_eq!(report.count(Category::StrCompare), 1);
        assert_eq!(report.hooks, vec!["__cmplog_rtn_hook_str".to_string()]);
        assert_eq!(events.count_kind(EventKind::CallClassified), 1);
        assert_eq!(events.count_kind(EventKind::HookDeclared), 1);
        assert_eq!(events.count_kind(EventKind::HookInserted), 1);
        assert_eq!(events.count_kind(EventKind::ModuleVerified), 1);
    }

    #[test]
    fn test_ignored_caller() {
        let (mut module, _, _) = single_call_module("strcmp", strcmp_ty());
        let pass = CmpLogRoutinesPass::default().with_ignore(|_: &crate::ir::Function| true);
        let events = EventLog::new();
        let report = pass.instrument(&mut module, &events).unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(report.functions_skipped, 1);
        assert_eq!(events.count_kind(EventKind::FunctionSkipped), 1);
    }
}
