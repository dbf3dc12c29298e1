//! Function-local values.
//!
//! Every operand an instruction can name lives in its function's value table and is referred
//! to by a [`ValueId`]: formal arguments, instruction results, constants, and addresses of
//! module functions. The table records the type of each value so that passes can reason
//! about operands without chasing their definitions.

use std::fmt;

use crate::ir::{FuncId, InstId, IrType};

/// Handle of a value inside one function's value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) u32);

impl ValueId {
    /// Creates a value handle from a raw table index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the table index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    /// Integer constant, stored as its two's complement bit pattern.
    Int(u64),
    /// Null pointer.
    Null,
    /// Undefined value.
    Undef,
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Null => f.write_str("null"),
            Self::Undef => f.write_str("undef"),
        }
    }
}

/// Where a value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Formal parameter at the given position.
    Argument(u32),
    /// Result of the instruction with this id.
    Instruction(InstId),
    /// Constant of the value's type.
    Constant(ConstValue),
    /// Address of a module function.
    FunctionAddress(FuncId),
}

/// A typed entry of a function's value table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    ty: IrType,
    kind: ValueKind,
}

impl Value {
    /// Creates a value entry.
    #[must_use]
    pub fn new(ty: IrType, kind: ValueKind) -> Self {
        Self { ty, kind }
    }

    /// Returns the value's type.
    #[must_use]
    pub const fn ty(&self) -> &IrType {
        &self.ty
    }

    /// Returns the value's origin.
    #[must_use]
    pub const fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Returns `true` if the value is a constant.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self.kind, ValueKind::Constant(_))
    }

    /// Returns the defining instruction, if the value is an instruction result.
    #[must_use]
    pub const fn defining_instruction(&self) -> Option<InstId> {
        match self.kind {
            ValueKind::Instruction(inst) => Some(inst),
            _ => None,
        }
    }
}
