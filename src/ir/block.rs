//! Basic blocks.
//!
//! A block is a straight-line sequence of instructions that ends in exactly one terminator.
//! Blocks are identified by their index in the owning function.

use std::fmt;

use crate::ir::{InstId, Instruction};

/// Index of a block within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Creates a block handle from a block index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the block index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A basic block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    id: BlockId,
    instructions: Vec<Instruction>,
}

impl Block {
    /// Creates an empty block.
    #[must_use]
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            instructions: Vec::new(),
        }
    }

    /// Returns the block handle.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the instructions in execution order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the block has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Returns the last instruction, if it is a terminator.
    #[must_use]
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions
            .last()
            .filter(|instr| instr.op().is_terminator())
    }

    /// Returns the position of the instruction with the given id.
    #[must_use]
    pub fn position_of(&self, inst: InstId) -> Option<usize> {
        self.instructions.iter().position(|instr| instr.id() == inst)
    }

    /// Returns the instruction with the given id.
    #[must_use]
    pub fn instruction(&self, inst: InstId) -> Option<&Instruction> {
        self.instructions.iter().find(|instr| instr.id() == inst)
    }

    pub(crate) fn insert(&mut self, index: usize, instr: Instruction) {
        self.instructions.insert(index, instr);
    }
}
