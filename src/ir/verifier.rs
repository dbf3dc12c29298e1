//! # Structural Verification of Modules
//!
//! A transformation that inserts instructions must leave behind a module that is still
//! well-formed. The [`Verifier`] trait is the seam through which passes check that after
//! they run; [`StructuralVerifier`] is the default implementation.
//!
//! ## Checks
//!
//! ### Module
//! - Function names are unique and every function's handle matches its position
//! - Declarations have no blocks, definitions are non-empty
//!
//! ### Blocks
//! - Every block is non-empty and ends in exactly one terminator
//! - Branch targets exist
//!
//! ### Values
//! - Every operand refers to an existing value of the function
//! - An instruction result used in its defining block is defined earlier in that block
//! - Instructions that define a value point back at themselves from the value table
//!
//! ### Typing
//! - Calls: argument count and types agree with the callee's signature, result presence and
//!   type agree with the return type, indirect callees are function pointers
//! - Casts obey their kind (width and pointer rules)
//! - Loads, stores, binary operators, comparisons, conditional branches and returns are
//!   well-typed
//!
//! ## Parallel Processing
//!
//! Functions are independent, so they are checked concurrently with [`rayon`]. Issues are
//! collected back in module order, which keeps the report deterministic.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::{
    ir::{
        BlockId, Callee, CastKind, Function, FunctionType, InstId, Instruction, IrType, Module,
        Op, Value, ValueId, ValueKind,
    },
    Error, Result,
};

static VOID: IrType = IrType::Void;

/// Checks a module for well-formedness.
pub trait Verifier: Send + Sync {
    /// Returns the verifier's name.
    fn name(&self) -> &'static str;

    /// Verifies `module`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] listing every issue found.
    fn verify(&self, module: &Module) -> Result<()>;
}

/// Default verifier: structural and type consistency of the whole module.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::ir::{FunctionType, IrBuilder, IrType, Module, StructuralVerifier, Verifier};
///
/// let mut module = Module::new("demo");
/// let main = module.add_function("main", FunctionType::new(vec![], IrType::Void))?;
/// let entry = module.function_mut(main)?.append_block();
///
/// // A block without terminator is rejected.
/// assert!(StructuralVerifier.verify(&module).is_err());
///
/// IrBuilder::at_end(&mut module, main, entry).create_ret(None)?;
/// assert!(StructuralVerifier.verify(&module).is_ok());
/// # Ok::<(), cmplog_routines::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralVerifier;

impl Verifier for StructuralVerifier {
    fn name(&self) -> &'static str {
        "StructuralVerifier"
    }

    fn verify(&self, module: &Module) -> Result<()> {
        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for (index, func) in module.functions().iter().enumerate() {
            if !seen.insert(func.name()) {
                issues.push(format!("duplicate function name '{}'", func.name()));
            }
            if func.id().index() != index {
                issues.push(format!(
                    "{}: handle {} does not match position {}",
                    func.name(),
                    func.id(),
                    index
                ));
            }
        }

        let per_function: Vec<Vec<String>> = module
            .functions()
            .par_iter()
            .map(|func| FunctionChecker::new(module, func).run())
            .collect();
        issues.extend(per_function.into_iter().flatten());

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Verification(issues))
        }
    }
}

struct FunctionChecker<'a> {
    module: &'a Module,
    func: &'a Function,
    locations: HashMap<InstId, (BlockId, usize)>,
    issues: Vec<String>,
}

impl<'a> FunctionChecker<'a> {
    fn new(module: &'a Module, func: &'a Function) -> Self {
        let mut locations = HashMap::new();
        for block in func.blocks() {
            for (pos, instr) in block.instructions().iter().enumerate() {
                locations.insert(instr.id(), (block.id(), pos));
            }
        }

        Self {
            module,
            func,
            locations,
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, message: String) {
        self.issues.push(format!("{}: {}", self.func.name(), message));
    }

    fn run(mut self) -> Vec<String> {
        let func = self.func;
        for (index, block) in func.blocks().iter().enumerate() {
            if block.id().index() != index {
                self.issue(format!("block {} stored at position {}", block.id(), index));
            }
            if block.is_empty() {
                self.issue(format!("{} is empty", block.id()));
                continue;
            }

            let last = block.instruction_count() - 1;
            for (pos, instr) in block.instructions().iter().enumerate() {
                let terminator = instr.op().is_terminator();
                if terminator && pos != last {
                    self.issue(format!("{} has a terminator before its end", block.id()));
                } else if !terminator && pos == last {
                    self.issue(format!("{} does not end in a terminator", block.id()));
                }
                self.check_instruction(block.id(), pos, instr);
            }
        }
        self.issues
    }

    fn check_instruction(&mut self, block: BlockId, pos: usize, instr: &Instruction) {
        let mut operands_ok = true;
        for operand in instr.op().operands() {
            operands_ok &= self.check_operand(block, pos, instr.id(), operand);
        }

        if let Some(result) = instr.result() {
            match self.func.value(result).map(Value::kind) {
                Some(ValueKind::Instruction(def)) if *def == instr.id() => {}
                _ => self.issue(format!(
                    "{} defines {} which is not bound to it",
                    instr.id(),
                    result
                )),
            }
        }

        for target in instr.op().successors() {
            if self.func.block(target).is_none() {
                self.issue(format!("{} branches to missing {}", instr.id(), target));
            }
        }

        if operands_ok {
            self.check_types(instr);
        }
    }

    fn check_operand(&mut self, block: BlockId, pos: usize, user: InstId, value: ValueId) -> bool {
        let Some(entry) = self.func.value(value) else {
            self.issue(format!("{user} uses missing value {value}"));
            return false;
        };

        if let Some(def) = entry.defining_instruction() {
            match self.locations.get(&def) {
                None => {
                    self.issue(format!("{user} uses {value} whose definition is detached"));
                    return false;
                }
                Some((def_block, def_pos)) if *def_block == block && *def_pos >= pos => {
                    self.issue(format!("{user} uses {value} before its definition"));
                }
                Some(_) => {}
            }
        }

        if let ValueKind::FunctionAddress(target) = entry.kind() {
            if self.module.function(*target).is_none() {
                self.issue(format!("{user} takes the address of missing {target}"));
                return false;
            }
        }
        true
    }

    fn ty(&self, value: ValueId) -> &'a IrType {
        // Operands were checked for existence before typing.
        self.func.value(value).map_or(&VOID, Value::ty)
    }

    fn result_ty(&self, instr: &Instruction) -> Option<&'a IrType> {
        instr.result().map(|r| self.ty(r))
    }

    fn expect_result(&mut self, instr: &Instruction, expected: Option<&IrType>) {
        let actual = self.result_ty(instr);
        if actual != expected {
            let show =
                |ty: Option<&IrType>| ty.map_or_else(|| "none".to_string(), ToString::to_string);
            self.issue(format!(
                "{} result is {}, expected {}",
                instr.id(),
                show(actual),
                show(expected)
            ));
        }
    }

    fn check_types(&mut self, instr: &Instruction) {
        match instr.op() {
            Op::Call { callee, args, .. } => self.check_call(instr, callee, args),
            Op::Cast { kind, value, to } => {
                let from = self.ty(*value);
                if let Err(reason) = cast_is_valid(*kind, from, to) {
                    self.issue(format!(
                        "{} invalid {} from {} to {}: {}",
                        instr.id(),
                        kind.mnemonic(),
                        from,
                        to,
                        reason
                    ));
                }
                self.expect_result(instr, Some(to));
            }
            Op::Alloca { ty } => self.expect_result(instr, Some(&ty.clone().pointer_to())),
            Op::Load { ptr } => match self.ty(*ptr).pointee() {
                Some(pointee) => self.expect_result(instr, Some(pointee)),
                None => self.issue(format!("{} loads through a non-pointer", instr.id())),
            },
            Op::Store { value, ptr } => {
                if self.ty(*ptr).pointee() != Some(self.ty(*value)) {
                    self.issue(format!(
                        "{} stores {} through {}",
                        instr.id(),
                        self.ty(*value),
                        self.ty(*ptr)
                    ));
                }
                self.expect_result(instr, None);
            }
            Op::Binary { lhs, rhs, .. } => {
                let (l, r) = (self.ty(*lhs), self.ty(*rhs));
                if !l.is_integer() || l != r {
                    self.issue(format!("{} binary operands {} and {}", instr.id(), l, r));
                }
                self.expect_result(instr, Some(l));
            }
            Op::ICmp { lhs, rhs, .. } => {
                let (l, r) = (self.ty(*lhs), self.ty(*rhs));
                if !(l.is_integer() || l.is_pointer()) || l != r {
                    self.issue(format!("{} compares {} with {}", instr.id(), l, r));
                }
                self.expect_result(instr, Some(&IrType::i1()));
            }
            Op::CondBr { cond, .. } => {
                if !self.ty(*cond).is_integer_of(1) {
                    self.issue(format!("{} branches on a non-i1 condition", instr.id()));
                }
                self.expect_result(instr, None);
            }
            Op::Ret { value } => {
                let ret = self.func.ty().ret();
                match value {
                    Some(v) if self.ty(*v) != ret => self.issue(format!(
                        "{} returns {} from a function returning {}",
                        instr.id(),
                        self.ty(*v),
                        ret
                    )),
                    None if !ret.is_void() => self.issue(format!(
                        "{} returns void from a function returning {}",
                        instr.id(),
                        ret
                    )),
                    _ => {}
                }
                self.expect_result(instr, None);
            }
            Op::Br { .. } | Op::Unreachable => self.expect_result(instr, None),
        }
    }

    fn check_call(&mut self, instr: &Instruction, callee: &Callee, args: &[ValueId]) {
        let sig: &'a FunctionType = match callee {
            Callee::Direct(target) => match self.module.function(*target) {
                Some(target) => target.ty(),
                None => {
                    self.issue(format!("{} calls missing {}", instr.id(), target));
                    return;
                }
            },
            Callee::Indirect(ptr) => match self.ty(*ptr).pointee_function() {
                Some(sig) => sig,
                None => {
                    self.issue(format!("{} calls through a non-function pointer", instr.id()));
                    return;
                }
            },
        };

        let count_ok = if sig.is_vararg() {
            args.len() >= sig.param_count()
        } else {
            args.len() == sig.param_count()
        };
        if !count_ok {
            self.issue(format!(
                "{} passes {} arguments to {}",
                instr.id(),
                args.len(),
                sig
            ));
        }

        for (index, (arg, param)) in args.iter().zip(sig.params()).enumerate() {
            let actual = self.ty(*arg);
            if actual != param {
                self.issue(format!(
                    "{} argument {} is {}, expected {}",
                    instr.id(),
                    index,
                    actual,
                    param
                ));
            }
        }

        let ret = sig.ret();
        self.expect_result(instr, (!ret.is_void()).then_some(ret));
    }
}

fn cast_is_valid(
    kind: CastKind,
    from: &IrType,
    to: &IrType,
) -> std::result::Result<(), &'static str> {
    let ok = match kind {
        CastKind::BitCast => match (from.addr_space(), to.addr_space()) {
            (Some(src), Some(dst)) => src == dst,
            (None, None) => {
                from.is_single_value()
                    && to.is_single_value()
                    && from.primitive_size_bits() != 0
                    && from.primitive_size_bits() == to.primitive_size_bits()
            }
            _ => false,
        },
        CastKind::AddrSpaceCast => matches!(
            (from.addr_space(), to.addr_space()),
            (Some(src), Some(dst)) if src != dst
        ),
        CastKind::IntToPtr => from.is_integer() && to.is_pointer(),
        CastKind::PtrToInt => from.is_pointer() && to.is_integer(),
        CastKind::ZExt | CastKind::SExt => {
            matches!((from.int_width(), to.int_width()), (Some(f), Some(t)) if f < t)
        }
        CastKind::Trunc => {
            matches!((from.int_width(), to.int_width()), (Some(f), Some(t)) if f > t)
        }
    };

    if ok {
        Ok(())
    } else {
        Err(match kind {
            CastKind::BitCast => "sizes or pointer-ness differ",
            CastKind::AddrSpaceCast => "needs pointers in different address spaces",
            CastKind::IntToPtr => "needs an integer source and pointer destination",
            CastKind::PtrToInt => "needs a pointer source and integer destination",
            CastKind::ZExt | CastKind::SExt => "destination must be a wider integer",
            CastKind::Trunc => "destination must be a narrower integer",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir::IrBuilder, test::single_call_module};

    fn issues(module: &Module) -> Vec<String> {
        match StructuralVerifier.verify(module) {
            Err(Error::Verification(issues)) => issues,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn test_well_formed_fixture_passes() {
        let (module, _, _) = single_call_module(
            "strcmp",
            FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32()),
        );
        assert!(issues(&module).is_empty(), "{:?}", issues(&module));
    }

    #[test]
    fn test_missing_terminator() {
        let mut module = Module::new("m");
        let f = module
            .add_function("f", FunctionType::new(vec![], IrType::Void))
            .unwrap();
        let entry = module.function_mut(f).unwrap().append_block();
        let g = module
            .add_function("g", FunctionType::new(vec![], IrType::Void))
            .unwrap();
        IrBuilder::at_end(&mut module, f, entry)
            .create_call(g, &[])
            .unwrap();

        let issues = issues(&module);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("does not end in a terminator"));
    }

    #[test]
    fn test_call_argument_type_mismatch() {
        let mut module = Module::new("m");
        let callee = module
            .add_function(
                "strcmp",
                FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32()),
            )
            .unwrap();
        let f = module
            .add_function(
                "f",
                FunctionType::new(vec![IrType::i32().pointer_to()], IrType::Void),
            )
            .unwrap();
        let entry = module.function_mut(f).unwrap().append_block();
        let mut builder = IrBuilder::at_end(&mut module, f, entry);
        let arg = builder.arg(0).unwrap();
        builder.create_call(callee, &[arg, arg]).unwrap();
        builder.create_ret(None).unwrap();

        let issues = issues(&module);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.contains("expected i8*")));
    }

    #[test]
    fn test_use_before_definition_in_block() {
        let mut module = Module::new("m");
        let f = module
            .add_function("f", FunctionType::new(vec![], IrType::i32()))
            .unwrap();
        let entry = module.function_mut(f).unwrap().append_block();
        let mut builder = IrBuilder::at_end(&mut module, f, entry);
        let slot = builder.create_alloca(IrType::i32()).unwrap();
        let loaded = builder.create_load(slot).unwrap();
        builder.create_ret(Some(loaded)).unwrap();

        // Move the load's use in front of its definition.
        let ret = module.function(f).unwrap().blocks()[0].instructions()[2].id();
        let mut builder = IrBuilder::before(&mut module, f, ret).unwrap();
        builder.create_store(loaded, slot).unwrap();
        assert!(issues(&module).is_empty());

        let load = module.function(f).unwrap().blocks()[0].instructions()[1].id();
        let mut builder = IrBuilder::before(&mut module, f, load).unwrap();
        builder.create_store(loaded, slot).unwrap();
        let issues = issues(&module);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("before its definition"));
    }

    #[test]
    fn test_invalid_cast_is_reported() {
        let mut module = Module::new("m");
        let f = module
            .add_function("f", FunctionType::new(vec![IrType::i64()], IrType::Void))
            .unwrap();
        let entry = module.function_mut(f).unwrap().append_block();
        let mut builder = IrBuilder::at_end(&mut module, f, entry);
        let arg = builder.arg(0).unwrap();
        builder.create_cast(CastKind::ZExt, arg, IrType::i32()).unwrap();
        builder.create_ret(None).unwrap();

        let issues = issues(&module);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("wider integer"));
    }

    #[test]
    fn test_issues_in_module_order() {
        let mut module = Module::new("m");
        for name in ["a", "b", "c"] {
            let f = module
                .add_function(name, FunctionType::new(vec![], IrType::Void))
                .unwrap();
            module.function_mut(f).unwrap().append_block();
        }
        let issues = issues(&module);
        assert_eq!(issues.len(), 3);
        assert!(issues[0].starts_with("a:"));
        assert!(issues[1].starts_with("b:"));
        assert!(issues[2].starts_with("c:"));
    }
}
