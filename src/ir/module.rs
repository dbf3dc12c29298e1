//! Modules: the unit of whole-program transformation.
//!
//! A [`Module`] owns an ordered list of functions. Function order is declaration order and is
//! the outermost iteration order of every pass, so it is part of the observable output.
//!
//! Modules implement `Display` as LLVM-like text and `Clone + PartialEq`, which makes "the
//! module is unchanged" an exact, checkable property.

use std::{collections::HashMap, fmt};

use crate::{
    ir::{Callee, FuncId, Function, FunctionType, Instruction, Op, ValueId, ValueKind},
    Error, Result,
};

/// A program module.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::ir::{FunctionType, IrType, Module};
///
/// let mut module = Module::new("demo");
/// let ty = FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32());
///
/// let first = module.get_or_insert_function("strcmp", ty.clone())?;
/// let second = module.get_or_insert_function("strcmp", ty)?;
/// assert_eq!(first, second);
/// assert_eq!(module.function_count(), 1);
/// # Ok::<(), cmplog_routines::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    name: String,
    functions: Vec<Function>,
    by_name: HashMap<String, FuncId>,
}

impl Module {
    /// Creates an empty module.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Returns the module identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the functions in declaration order.
    #[must_use]
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Returns the number of functions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Returns the function with the given handle.
    #[must_use]
    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    /// Returns the function with the given handle for modification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] if the handle is not part of this module.
    pub fn function_mut(&mut self, id: FuncId) -> Result<&mut Function> {
        self.functions
            .get_mut(id.index())
            .ok_or(Error::UnknownFunction(id))
    }

    /// Looks up a function by symbol name.
    #[must_use]
    pub fn function_by_name(&self, name: &str) -> Option<FuncId> {
        self.by_name.get(name).copied()
    }

    /// Adds a new function declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFunction`] if the name is already taken.
    pub fn add_function(&mut self, name: impl Into<String>, ty: FunctionType) -> Result<FuncId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateFunction(name));
        }

        let id = FuncId(self.functions.len());
        self.by_name.insert(name.clone(), id);
        self.functions.push(Function::new(id, name, ty));
        Ok(id)
    }

    /// Returns the function with this name, declaring it first if needed.
    ///
    /// Requesting the same name and signature twice returns the same function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureMismatch`] if a function of this name exists with a
    /// different signature.
    pub fn get_or_insert_function(&mut self, name: &str, ty: FunctionType) -> Result<FuncId> {
        let Some(id) = self.function_by_name(name) else {
            return self.add_function(name, ty);
        };

        let existing = self.function(id).ok_or(Error::UnknownFunction(id))?.ty();
        if *existing != ty {
            return Err(Error::SignatureMismatch {
                name: name.to_string(),
                existing: existing.to_string(),
                requested: ty.to_string(),
            });
        }
        Ok(id)
    }

    /// Returns the total number of instructions across all functions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.functions.iter().map(Function::instruction_count).sum()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        for func in &self.functions {
            writeln!(f)?;
            FunctionPrinter { module: self, func }.fmt(f)?;
        }
        Ok(())
    }
}

/// Renders one function with access to module-level names.
struct FunctionPrinter<'a> {
    module: &'a Module,
    func: &'a Function,
}

impl FunctionPrinter<'_> {
    fn operand(&self, id: ValueId) -> String {
        match self.func.value(id).map(crate::ir::Value::kind) {
            Some(ValueKind::Argument(_) | ValueKind::Instruction(_)) => id.to_string(),
            Some(ValueKind::Constant(c)) => c.to_string(),
            Some(ValueKind::FunctionAddress(target)) => match self.module.function(*target) {
                Some(target) => format!("@{}", target.name()),
                None => format!("@<invalid {target}>"),
            },
            None => format!("<invalid {id}>"),
        }
    }

    fn typed(&self, id: ValueId) -> String {
        match self.func.value_type(id) {
            Ok(ty) => format!("{ty} {}", self.operand(id)),
            Err(_) => self.operand(id),
        }
    }

    fn instruction(&self, f: &mut fmt::Formatter<'_>, instr: &Instruction) -> fmt::Result {
        f.write_str("  ")?;
        if let Some(result) = instr.result() {
            write!(f, "{result} = ")?;
        }

        match instr.op() {
            Op::Call { callee, args, conv } => {
                f.write_str("call ")?;
                if *conv != crate::ir::CallingConv::C {
                    write!(f, "{conv} ")?;
                }
                match instr.result().and_then(|r| self.func.value_type(r).ok()) {
                    Some(ty) => write!(f, "{ty} ")?,
                    None => f.write_str("void ")?,
                }
                match callee {
                    Callee::Direct(target) => match self.module.function(*target) {
                        Some(target) => write!(f, "@{}", target.name())?,
                        None => write!(f, "@<invalid {target}>")?,
                    },
                    Callee::Indirect(ptr) => f.write_str(&self.operand(*ptr))?,
                }
                let args: Vec<String> = args.iter().map(|a| self.typed(*a)).collect();
                write!(f, "({})", args.join(", "))
            }
            Op::Cast { kind, value, to } => {
                write!(f, "{} {} to {to}", kind.mnemonic(), self.typed(*value))
            }
            Op::Alloca { ty } => write!(f, "alloca {ty}"),
            Op::Load { ptr } => {
                let ty = self
                    .func
                    .value_type(*ptr)
                    .ok()
                    .and_then(|t| t.pointee().cloned())
                    .unwrap_or_default();
                write!(f, "load {ty}, {}", self.typed(*ptr))
            }
            Op::Store { value, ptr } => {
                write!(f, "store {}, {}", self.typed(*value), self.typed(*ptr))
            }
            Op::Binary { op, lhs, rhs } => {
                write!(f, "{} {}, {}", op.mnemonic(), self.typed(*lhs), self.operand(*rhs))
            }
            Op::ICmp { pred, lhs, rhs } => write!(
                f,
                "icmp {} {}, {}",
                pred.mnemonic(),
                self.typed(*lhs),
                self.operand(*rhs)
            ),
            Op::Br { target } => write!(f, "br label %{target}"),
            Op::CondBr {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br {}, label %{then_block}, label %{else_block}",
                self.typed(*cond)
            ),
            Op::Ret { value: Some(value) } => write!(f, "ret {}", self.typed(*value)),
            Op::Ret { value: None } => f.write_str("ret void"),
            Op::Unreachable => f.write_str("unreachable"),
        }
    }

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.func.ty();
        if self.func.is_declaration() {
            return writeln!(f, "declare {} @{}{}", ty.ret(), self.func.name(), params(ty));
        }

        let args: Vec<String> = (0..self.func.arg_count())
            .filter_map(|i| self.func.arg(i))
            .map(|arg| self.typed(arg))
            .collect();
        writeln!(
            f,
            "define {} @{}({}) {{",
            ty.ret(),
            self.func.name(),
            args.join(", ")
        )?;
        for block in self.func.blocks() {
            writeln!(f, "{}:", block.id())?;
            for instr in block.instructions() {
                self.instruction(f, instr)?;
                writeln!(f)?;
            }
        }
        writeln!(f, "}}")
    }
}

fn params(ty: &FunctionType) -> String {
    let mut parts: Vec<String> = ty.params().iter().map(ToString::to_string).collect();
    if ty.is_vararg() {
        parts.push("...".to_string());
    }
    format!("({})", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrType;

    fn strcmp_ty() -> FunctionType {
        FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32())
    }

    #[test]
    fn test_duplicate_function() {
        let mut module = Module::new("m");
        module.add_function("strcmp", strcmp_ty()).unwrap();
        assert!(matches!(
            module.add_function("strcmp", strcmp_ty()),
            Err(Error::DuplicateFunction(name)) if name == "strcmp"
        ));
    }

    #[test]
    fn test_get_or_insert_signature_mismatch() {
        let mut module = Module::new("m");
        module.add_function("hook", strcmp_ty()).unwrap();
        let other = FunctionType::new(vec![IrType::i8_ptr()], IrType::Void);
        assert!(matches!(
            module.get_or_insert_function("hook", other),
            Err(Error::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn test_display_declaration() {
        let mut module = Module::new("m");
        module
            .add_function(
                "printf",
                FunctionType::variadic(vec![IrType::i8_ptr()], IrType::i32()),
            )
            .unwrap();
        let text = module.to_string();
        assert!(text.contains("; ModuleID = 'm'"));
        assert!(text.contains("declare i32 @printf(i8*, ...)"));
    }
}
