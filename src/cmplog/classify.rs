//! Call-site classification.
//!
//! Classification is a pure function of the callee's name and declared signature. Each
//! candidate predicate is evaluated independently, then an exclusion step picks at most one
//! category: exact-name and managed-string matches beat the generic pointer shapes, and the
//! three-argument generic shape beats the two-argument one.

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    cmplog::{
        patterns::{BOUNDED_STRING_COMPARE, MEMORY_COMPARE, STRING_COMPARE},
        Category, CategoryCounts, IgnorePredicate, MarkerTable,
    },
    compiler::{EventKind, EventLog},
    ir::{BlockId, CallingConv, FuncId, FunctionType, InstId, IrType, Module},
};

/// Signature predicates of one callee, before exclusion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignatureFlags {
    /// Non-void result; the first two of at least two parameters share one pointer type.
    pub generic_binary: bool,
    /// As `generic_binary` with a 32- or 64-bit integer third parameter.
    pub generic_ternary: bool,
    /// Memory-compare family with `i32 (ptr, ptr, int)` shape.
    pub mem_compare: bool,
    /// String-compare family with `i32 (i8*, i8*)` shape.
    pub str_compare: bool,
    /// Bounded string-compare family with `i32 (i8*, i8*, int)` shape.
    pub strn_compare: bool,
}

impl SignatureFlags {
    /// Evaluates every exact-shape predicate for a callee.
    #[must_use]
    pub fn compute(name: &str, ty: &FunctionType) -> Self {
        let params = ty.params();
        let returns_value = !ty.ret().is_void();
        let returns_i32 = ty.ret().is_integer_of(32);
        let byte_ptr = IrType::i8_ptr();

        let same_pointers = params.len() >= 2 && params[0].is_pointer() && params[0] == params[1];
        let both_pointers = params.len() >= 2 && params[0].is_pointer() && params[1].is_pointer();
        let both_byte_ptrs = params.len() >= 2 && params[0] == byte_ptr && params[1] == byte_ptr;
        let third_is_int = params.get(2).is_some_and(IrType::is_integer);

        let generic_binary = returns_value && same_pointers;
        let generic_ternary = generic_binary
            && params
                .get(2)
                .and_then(IrType::int_width)
                .is_some_and(|w| w == 32 || w == 64);

        Self {
            generic_binary,
            generic_ternary,
            mem_compare: MEMORY_COMPARE.contains(&name)
                && params.len() == 3
                && returns_i32
                && both_pointers
                && third_is_int,
            str_compare: STRING_COMPARE.contains(&name)
                && params.len() == 2
                && returns_i32
                && both_byte_ptrs,
            strn_compare: BOUNDED_STRING_COMPARE.contains(&name)
                && params.len() == 3
                && returns_i32
                && both_byte_ptrs
                && third_is_int,
        }
    }
}

/// Assigns at most one category to a callee.
///
/// Precedence: memory compare, string compare, bounded string compare, the managed-string
/// rules in table order, then the generic ternary shape (as [`Category::MemCompareN`]) and
/// finally the generic binary shape.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::cmplog::{classify, Category, MarkerTable};
/// use cmplog_routines::ir::{FunctionType, IrType};
///
/// let markers = MarkerTable::builtin();
/// let strcmp = FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32());
/// assert_eq!(classify("strcmp", &strcmp, &markers), Some(Category::StrCompare));
///
/// // Same shape, unknown name: only the generic pointer category applies.
/// assert_eq!(
///     classify("my_compare", &strcmp, &markers),
///     Some(Category::GenericPointerBinary)
/// );
///
/// let puts = FunctionType::new(vec![IrType::i8_ptr()], IrType::i32());
/// assert_eq!(classify("puts", &puts, &markers), None);
/// ```
#[must_use]
pub fn classify(name: &str, ty: &FunctionType, markers: &MarkerTable) -> Option<Category> {
    let flags = SignatureFlags::compute(name, ty);

    if flags.mem_compare {
        Some(Category::MemCompareN)
    } else if flags.str_compare {
        Some(Category::StrCompare)
    } else if flags.strn_compare {
        Some(Category::StrNCompare)
    } else if let Some(managed) = markers.classify(name, ty) {
        Some(managed)
    } else if flags.generic_ternary {
        Some(Category::MemCompareN)
    } else if flags.generic_binary {
        Some(Category::GenericPointerBinary)
    } else {
        None
    }
}

/// A classified call instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// Function containing the call.
    pub function: FuncId,
    /// Block containing the call.
    pub block: BlockId,
    /// The call instruction.
    pub inst: InstId,
    /// Statically resolved callee.
    pub callee: FuncId,
    /// Assigned category.
    pub category: Category,
}

/// Call sites grouped by category, each list in program encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worklists {
    lists: [Vec<CallSite>; Category::COUNT],
    skipped: Vec<FuncId>,
}

impl Worklists {
    /// Creates empty worklists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a site to its category's list.
    pub fn push(&mut self, site: CallSite) {
        self.lists[site.category.index()].push(site);
    }

    /// Returns the sites of one category.
    #[must_use]
    pub fn get(&self, category: Category) -> &[CallSite] {
        &self.lists[category.index()]
    }

    /// Returns `true` if no category has any site.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    /// Returns the number of sites across all categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    /// Returns the number of sites per category.
    #[must_use]
    pub fn counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for (count, list) in counts.iter_mut().zip(&self.lists) {
            *count = list.len();
        }
        counts
    }

    /// Iterates over all sites in rewrite order: category order, then encounter order.
    pub fn iter(&self) -> impl Iterator<Item = &CallSite> + '_ {
        Category::iter().flat_map(move |c| self.get(c).iter())
    }

    /// Returns the functions excluded by the ignore predicate.
    #[must_use]
    pub fn skipped(&self) -> &[FuncId] {
        &self.skipped
    }
}

/// Walks a module and collects classified call sites.
pub struct Classifier<'a> {
    markers: &'a MarkerTable,
    ignore: &'a dyn IgnorePredicate,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier using the given marker table and ignore predicate.
    #[must_use]
    pub fn new(markers: &'a MarkerTable, ignore: &'a dyn IgnorePredicate) -> Self {
        Self { markers, ignore }
    }

    /// Classifies the callee of one call instruction.
    ///
    /// Returns `None` for indirect calls, calls whose convention is not C, and callees that
    /// match no predicate.
    #[must_use]
    pub fn classify_call(
        &self,
        module: &Module,
        callee: Option<FuncId>,
        conv: CallingConv,
    ) -> Option<(FuncId, Category)> {
        if conv != CallingConv::C {
            return None;
        }
        let callee_id = callee?;
        let callee = module.function(callee_id)?;
        classify(callee.name(), callee.ty(), self.markers).map(|c| (callee_id, c))
    }

    /// Scans every non-ignored function in module order without modifying anything.
    pub fn scan(&self, module: &Module, events: &EventLog) -> Worklists {
        let mut worklists = Worklists::new();

        for func in module.functions() {
            if func.is_declaration() {
                continue;
            }
            if self.ignore.is_ignored(func) {
                events
                    .record(EventKind::FunctionSkipped)
                    .function(func.id())
                    .message(format!("{} is ignored", func.name()));
                log::trace!("skipping {}", func.name());
                worklists.skipped.push(func.id());
                continue;
            }

            for (block, instr) in func.instructions() {
                let Some(conv) = instr.calling_conv() else {
                    continue;
                };
                let Some((callee, category)) =
                    self.classify_call(module, instr.called_function(), conv)
                else {
                    continue;
                };

                let callee_name = module.function(callee).map_or("", |f| f.name());
                log::debug!(
                    "{}: call to {} classified as {}",
                    func.name(),
                    callee_name,
                    category
                );
                events
                    .record(EventKind::CallClassified)
                    .at(func.id(), block)
                    .message(format!("{callee_name}: {category}"));

                worklists.push(CallSite {
                    function: func.id(),
                    block,
                    inst: instr.id(),
                    callee,
                    category,
                });
            }
        }

        worklists
    }
}
