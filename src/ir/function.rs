//! Functions: declarations and definitions.
//!
//! A function without blocks is a declaration (an external symbol the module may call); a
//! function with at least one block is a definition. Each function owns its value table and
//! hands out stable instruction ids.

use std::fmt;

use crate::{
    ir::{
        Block, BlockId, ConstValue, FunctionType, InstId, Instruction, IrType, Value, ValueId,
        ValueKind,
    },
    Error, Result,
};

/// Index of a function within its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub(crate) usize);

impl FuncId {
    /// Creates a function handle from a module index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the module index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

/// A function of a [`crate::ir::Module`].
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::ir::{Function, FuncId, FunctionType, IrType};
///
/// let ty = FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32());
/// let mut func = Function::new(FuncId::new(0), "compare", ty);
/// assert!(func.is_declaration());
///
/// func.append_block();
/// assert!(!func.is_declaration());
/// assert_eq!(func.arg_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    id: FuncId,
    name: String,
    ty: FunctionType,
    blocks: Vec<Block>,
    values: Vec<Value>,
    next_inst: u32,
}

impl Function {
    /// Creates a function declaration, materialising one value per formal parameter.
    #[must_use]
    pub fn new(id: FuncId, name: impl Into<String>, ty: FunctionType) -> Self {
        let values = ty
            .params()
            .iter()
            .zip(0u32..)
            .map(|(param, index)| Value::new(param.clone(), ValueKind::Argument(index)))
            .collect();

        Self {
            id,
            name: name.into(),
            ty,
            blocks: Vec::new(),
            values,
            next_inst: 0,
        }
    }

    /// Returns the function handle.
    #[must_use]
    pub const fn id(&self) -> FuncId {
        self.id
    }

    /// Returns the symbol name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared signature.
    #[must_use]
    pub const fn ty(&self) -> &FunctionType {
        &self.ty
    }

    /// Returns `true` if the function has no body.
    #[must_use]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the number of formal parameters.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.ty.param_count()
    }

    /// Returns the value of the formal parameter at `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<ValueId> {
        (index < self.arg_count()).then(|| ValueId(index as u32))
    }

    /// Returns the blocks in layout order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the block with the given handle.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        let function = self.id;
        self.blocks.get_mut(id.index()).ok_or(Error::UnknownBlock {
            function,
            block: id,
        })
    }

    /// Appends an empty block and returns its handle.
    pub fn append_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block::new(id));
        id
    }

    /// Returns the whole value table.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value with the given handle.
    #[must_use]
    pub fn value(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id.index())
    }

    /// Returns the type of a value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownValue`] if the handle is not part of this function.
    pub fn value_type(&self, id: ValueId) -> Result<&IrType> {
        self.value(id).map(Value::ty).ok_or(Error::UnknownValue {
            function: self.id,
            value: id,
        })
    }

    /// Adds an integer constant of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if `ty` is not an integer type.
    pub fn const_int(&mut self, ty: IrType, value: u64) -> Result<ValueId> {
        if !ty.is_integer() {
            return Err(malformed_error!(
                "integer constant of non-integer type {}",
                ty
            ));
        }
        Ok(self.add_value(ty, ValueKind::Constant(ConstValue::Int(value))))
    }

    /// Adds a null pointer constant of the given pointer type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if `ty` is not a pointer type.
    pub fn const_null(&mut self, ty: IrType) -> Result<ValueId> {
        if !ty.is_pointer() {
            return Err(malformed_error!("null constant of non-pointer type {}", ty));
        }
        Ok(self.add_value(ty, ValueKind::Constant(ConstValue::Null)))
    }

    /// Adds an undefined value of the given type.
    pub fn undef(&mut self, ty: IrType) -> ValueId {
        self.add_value(ty, ValueKind::Constant(ConstValue::Undef))
    }

    pub(crate) fn add_value(&mut self, ty: IrType, kind: ValueKind) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value::new(ty, kind));
        id
    }

    pub(crate) fn next_inst_id(&mut self) -> InstId {
        let id = InstId(self.next_inst);
        self.next_inst += 1;
        id
    }

    /// Iterates over all instructions in program order, paired with their block.
    pub fn instructions(&self) -> impl Iterator<Item = (BlockId, &Instruction)> + '_ {
        self.blocks.iter().flat_map(|block| {
            block
                .instructions()
                .iter()
                .map(move |instr| (block.id(), instr))
        })
    }

    /// Returns the total number of instructions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(Block::instruction_count).sum()
    }

    /// Locates an instruction by id, returning its block and position.
    #[must_use]
    pub fn find_instruction(&self, inst: InstId) -> Option<(BlockId, usize)> {
        self.blocks
            .iter()
            .find_map(|block| block.position_of(inst).map(|pos| (block.id(), pos)))
    }
}
