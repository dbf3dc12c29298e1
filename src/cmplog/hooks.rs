//! Lazily declared hook routines.

use strum::EnumCount;

use crate::{
    cmplog::Category,
    compiler::{EventKind, EventLog},
    ir::{FuncId, Module},
    Error, Result,
};

/// The hook routines of one pass invocation.
///
/// Names and signatures are fixed at construction by the `extended` flag. A hook is declared
/// in the module the first time a site of its category is rewritten; declaring an existing
/// hook with the same signature reuses it.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::cmplog::{Category, HookTable};
/// use cmplog_routines::compiler::EventLog;
/// use cmplog_routines::ir::Module;
///
/// let mut module = Module::new("demo");
/// let mut hooks = HookTable::new(false);
/// let events = EventLog::new();
///
/// let first = hooks.declare(&mut module, Category::MemCompareN, &events)?;
/// let again = hooks.declare(&mut module, Category::MemCompareN, &events)?;
/// assert_eq!(first, again);
/// assert_eq!(module.function_by_name("__cmplog_rtn_hook_n"), Some(first));
/// # Ok::<(), cmplog_routines::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct HookTable {
    extended: bool,
    declared: [Option<FuncId>; Category::COUNT],
}

impl HookTable {
    /// Creates a table for the standard or the extended hook family.
    #[must_use]
    pub fn new(extended: bool) -> Self {
        Self {
            extended,
            declared: [None; Category::COUNT],
        }
    }

    /// Returns `true` if the `_extended` hook names are used.
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        self.extended
    }

    /// Returns the symbol name of a category's hook.
    #[must_use]
    pub fn name(&self, category: Category) -> String {
        category.hook_name(self.extended)
    }

    /// Returns the hook already declared by this table for `category`.
    #[must_use]
    pub fn declared(&self, category: Category) -> Option<FuncId> {
        self.declared[category.index()]
    }

    /// Checks that `module` can take the hook for `category` without a conflict.
    ///
    /// Nothing is declared, so a pass can reject a module before touching it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureMismatch`] if the module already has a function of the
    /// hook's name with a different signature.
    pub fn check(&self, module: &Module, category: Category) -> Result<()> {
        let name = self.name(category);
        let Some(existing) = module
            .function_by_name(&name)
            .and_then(|id| module.function(id))
        else {
            return Ok(());
        };

        let requested = category.hook_args().signature();
        if *existing.ty() == requested {
            return Ok(());
        }
        Err(Error::SignatureMismatch {
            name,
            existing: existing.ty().to_string(),
            requested: requested.to_string(),
        })
    }

    /// Returns the hook for `category`, declaring it in `module` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureMismatch`] if the module already has a function of the
    /// hook's name with a different signature.
    pub fn declare(
        &mut self,
        module: &mut Module,
        category: Category,
        events: &EventLog,
    ) -> Result<FuncId> {
        if let Some(id) = self.declared(category) {
            return Ok(id);
        }

        let name = self.name(category);
        let existed = module.function_by_name(&name).is_some();
        let id = module.get_or_insert_function(&name, category.hook_args().signature())?;

        if !existed {
            events
                .record(EventKind::HookDeclared)
                .function(id)
                .message(format!("declared {name}"));
            log::debug!("declared hook {name}");
        }
        self.declared[category.index()] = Some(id);
        Ok(id)
    }
}
