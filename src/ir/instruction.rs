//! Instructions in `result = op(operands)` form.
//!
//! Each [`Instruction`] pairs an [`Op`] with the value it defines (if any) and a stable
//! [`InstId`]. Instruction ids never change once assigned, even when other instructions are
//! inserted into the same block, which lets passes record call sites during a read-only scan
//! and find them again while rewriting.

use std::fmt;

use crate::ir::{BlockId, CallingConv, FuncId, IrType, ValueId};

/// Stable identifier of an instruction within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(pub(crate) u32);

impl InstId {
    /// Creates an instruction id from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inst#{}", self.0)
    }
}

/// Target of a call instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callee {
    /// Statically resolved module function.
    Direct(FuncId),
    /// Call through a function pointer value.
    Indirect(ValueId),
}

impl Callee {
    /// Returns the statically known callee, if any.
    #[must_use]
    pub const fn function(&self) -> Option<FuncId> {
        match self {
            Self::Direct(func) => Some(*func),
            Self::Indirect(_) => None,
        }
    }
}

/// Kinds of value conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    /// Reinterpret the bits as another type of the same size.
    BitCast,
    /// Move a pointer to another address space.
    AddrSpaceCast,
    /// Integer to pointer.
    IntToPtr,
    /// Pointer to integer.
    PtrToInt,
    /// Zero-extend to a wider integer.
    ZExt,
    /// Sign-extend to a wider integer.
    SExt,
    /// Truncate to a narrower integer.
    Trunc,
}

impl CastKind {
    /// Returns the textual mnemonic.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::BitCast => "bitcast",
            Self::AddrSpaceCast => "addrspacecast",
            Self::IntToPtr => "inttoptr",
            Self::PtrToInt => "ptrtoint",
            Self::ZExt => "zext",
            Self::SExt => "sext",
            Self::Trunc => "trunc",
        }
    }
}

/// Integer binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `add`
    Add,
    /// `sub`
    Sub,
    /// `mul`
    Mul,
    /// `and`
    And,
    /// `or`
    Or,
    /// `xor`
    Xor,
}

impl BinaryOp {
    /// Returns the textual mnemonic.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }
}

/// Integer comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    /// `eq`
    Eq,
    /// `ne`
    Ne,
    /// `slt`
    Slt,
    /// `sgt`
    Sgt,
    /// `ult`
    Ult,
    /// `ugt`
    Ugt,
}

impl IntPredicate {
    /// Returns the textual mnemonic.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Slt => "slt",
            Self::Sgt => "sgt",
            Self::Ult => "ult",
            Self::Ugt => "ugt",
        }
    }
}

/// An IR operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// Call a function.
    Call {
        /// Direct or indirect target
        callee: Callee,
        /// Actual arguments
        args: Vec<ValueId>,
        /// Calling convention of this call site
        conv: CallingConv,
    },

    /// Convert a value to another type.
    Cast {
        /// Conversion kind
        kind: CastKind,
        /// Value to convert
        value: ValueId,
        /// Destination type
        to: IrType,
    },

    /// Reserve a stack slot of the given type.
    Alloca {
        /// Type of the slot
        ty: IrType,
    },

    /// Read through a pointer.
    Load {
        /// Source address
        ptr: ValueId,
    },

    /// Write through a pointer.
    Store {
        /// Value to store
        value: ValueId,
        /// Destination address
        ptr: ValueId,
    },

    /// Integer arithmetic.
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: ValueId,
        /// Right operand
        rhs: ValueId,
    },

    /// Integer comparison producing `i1`.
    ICmp {
        /// Predicate
        pred: IntPredicate,
        /// Left operand
        lhs: ValueId,
        /// Right operand
        rhs: ValueId,
    },

    /// Unconditional branch.
    Br {
        /// Successor block
        target: BlockId,
    },

    /// Conditional branch.
    CondBr {
        /// `i1` condition
        cond: ValueId,
        /// Successor when the condition holds
        then_block: BlockId,
        /// Successor otherwise
        else_block: BlockId,
    },

    /// Return from the function.
    Ret {
        /// Returned value, absent for `void` functions
        value: Option<ValueId>,
    },

    /// Marks unreachable code.
    Unreachable,
}

impl Op {
    /// Returns `true` if this operation ends a block.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Br { .. } | Self::CondBr { .. } | Self::Ret { .. } | Self::Unreachable
        )
    }

    /// Returns the values read by this operation.
    ///
    /// For calls the indirect callee pointer (if any) comes first, followed by the arguments.
    #[must_use]
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Self::Call { callee, args, .. } => {
                let mut operands = Vec::with_capacity(args.len() + 1);
                if let Callee::Indirect(ptr) = callee {
                    operands.push(*ptr);
                }
                operands.extend_from_slice(args);
                operands
            }
            Self::Cast { value, .. } => vec![*value],
            Self::Load { ptr } => vec![*ptr],
            Self::Store { value, ptr } => vec![*value, *ptr],
            Self::Binary { lhs, rhs, .. } | Self::ICmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            Self::CondBr { cond, .. } => vec![*cond],
            Self::Ret { value } => value.iter().copied().collect(),
            Self::Alloca { .. } | Self::Br { .. } | Self::Unreachable => Vec::new(),
        }
    }

    /// Returns the successor blocks of a terminator.
    #[must_use]
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Self::Br { target } => vec![*target],
            Self::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => Vec::new(),
        }
    }
}

/// An instruction: an operation, the value it defines, and its stable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    id: InstId,
    result: Option<ValueId>,
    op: Op,
}

impl Instruction {
    /// Creates an instruction.
    #[must_use]
    pub fn new(id: InstId, result: Option<ValueId>, op: Op) -> Self {
        Self { id, result, op }
    }

    /// Returns the stable instruction id.
    #[must_use]
    pub const fn id(&self) -> InstId {
        self.id
    }

    /// Returns the value defined by this instruction, if any.
    #[must_use]
    pub const fn result(&self) -> Option<ValueId> {
        self.result
    }

    /// Returns the operation.
    #[must_use]
    pub const fn op(&self) -> &Op {
        &self.op
    }

    /// Returns `true` for call instructions.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self.op, Op::Call { .. })
    }

    /// Returns the statically known callee of a direct call.
    #[must_use]
    pub const fn called_function(&self) -> Option<FuncId> {
        match &self.op {
            Op::Call { callee, .. } => callee.function(),
            _ => None,
        }
    }

    /// Returns the arguments of a call instruction.
    #[must_use]
    pub fn call_args(&self) -> Option<&[ValueId]> {
        match &self.op {
            Op::Call { args, .. } => Some(args),
            _ => None,
        }
    }

    /// Returns the calling convention of a call instruction.
    #[must_use]
    pub const fn calling_conv(&self) -> Option<CallingConv> {
        match &self.op {
            Op::Call { conv, .. } => Some(*conv),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operands_of_indirect_call() {
        let op = Op::Call {
            callee: Callee::Indirect(ValueId::new(7)),
            args: vec![ValueId::new(1), ValueId::new(2)],
            conv: CallingConv::C,
        };
        assert_eq!(
            op.operands(),
            vec![ValueId::new(7), ValueId::new(1), ValueId::new(2)]
        );
        assert!(!op.is_terminator());
    }

    #[test]
    fn test_called_function() {
        let direct = Instruction::new(
            InstId::new(0),
            None,
            Op::Call {
                callee: Callee::Direct(FuncId::new(3)),
                args: vec![],
                conv: CallingConv::C,
            },
        );
        assert_eq!(direct.called_function(), Some(FuncId::new(3)));

        let indirect = Instruction::new(
            InstId::new(1),
            None,
            Op::Call {
                callee: Callee::Indirect(ValueId::new(0)),
                args: vec![],
                conv: CallingConv::C,
            },
        );
        assert!(indirect.is_call());
        assert_eq!(indirect.called_function(), None);
    }

    #[test]
    fn test_terminators_and_successors() {
        let br = Op::CondBr {
            cond: ValueId::new(0),
            then_block: BlockId::new(1),
            else_block: BlockId::new(2),
        };
        assert!(br.is_terminator());
        assert_eq!(br.successors(), vec![BlockId::new(1), BlockId::new(2)]);
        assert!(Op::Unreachable.is_terminator());
        assert!(Op::Ret { value: None }.successors().is_empty());
    }
}
