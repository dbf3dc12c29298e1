//! Instruction builder with an insertion point.
//!
//! [`IrBuilder`] appends instructions at the end of a block or inserts them immediately before
//! an existing instruction. Instructions created before the same anchor keep their creation
//! order, so a sequence `cast, cast, call` built before a call lands as
//! `cast, cast, call, <anchor>`.
//!
//! The cast helpers fold no-op conversions the way a compiler's IR builder does: casting a
//! value to its own type returns the value itself and emits nothing.

use crate::{
    ir::{
        BinaryOp, BlockId, Callee, CallingConv, CastKind, FuncId, InstId, Instruction,
        IntPredicate, IrType, Module, Op, ValueId, ValueKind,
    },
    Error, Result,
};

/// Where the next instruction goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    /// Append to the end of the block.
    End,
    /// Insert immediately before the given instruction.
    Before(InstId),
}

/// Builds instructions into one function of a module.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::ir::{FunctionType, IrBuilder, IrType, Module};
///
/// let mut module = Module::new("demo");
/// let strcmp = module.add_function(
///     "strcmp",
///     FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32()),
/// )?;
/// let main = module.add_function(
///     "main",
///     FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32()),
/// )?;
/// let entry = module.function_mut(main)?.append_block();
///
/// let mut builder = IrBuilder::at_end(&mut module, main, entry);
/// let (a, b) = (builder.arg(0)?, builder.arg(1)?);
/// let result = builder.create_call(strcmp, &[a, b])?;
/// builder.create_ret(result)?;
/// # Ok::<(), cmplog_routines::Error>(())
/// ```
pub struct IrBuilder<'m> {
    module: &'m mut Module,
    func: FuncId,
    block: BlockId,
    point: InsertPoint,
}

impl<'m> IrBuilder<'m> {
    /// Creates a builder appending to the end of `block`.
    pub fn at_end(module: &'m mut Module, func: FuncId, block: BlockId) -> Self {
        Self {
            module,
            func,
            block,
            point: InsertPoint::End,
        }
    }

    /// Creates a builder inserting immediately before instruction `inst`.
    ///
    /// # Errors
    ///
    /// Returns an error if the function or instruction does not exist.
    pub fn before(module: &'m mut Module, func: FuncId, inst: InstId) -> Result<Self> {
        let (block, _) = module
            .function(func)
            .ok_or(Error::UnknownFunction(func))?
            .find_instruction(inst)
            .ok_or(Error::UnknownInstruction {
                function: func,
                inst,
            })?;

        Ok(Self {
            module,
            func,
            block,
            point: InsertPoint::Before(inst),
        })
    }

    /// Moves the insertion point to the end of `block`.
    pub fn position_at_end(&mut self, block: BlockId) {
        self.block = block;
        self.point = InsertPoint::End;
    }

    /// Returns the current insertion point.
    #[must_use]
    pub const fn insert_point(&self) -> InsertPoint {
        self.point
    }

    /// Returns the module being built.
    #[must_use]
    pub fn module(&self) -> &Module {
        self.module
    }

    /// Returns the value of the current function's formal parameter at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the function has fewer parameters.
    pub fn arg(&self, index: usize) -> Result<ValueId> {
        self.module
            .function(self.func)
            .ok_or(Error::UnknownFunction(self.func))?
            .arg(index)
            .ok_or_else(|| malformed_error!("function has no parameter {}", index))
    }

    /// Returns the type of a value of the current function.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not part of the function.
    pub fn value_type(&self, value: ValueId) -> Result<IrType> {
        self.module
            .function(self.func)
            .ok_or(Error::UnknownFunction(self.func))?
            .value_type(value)
            .cloned()
    }

    /// Adds an integer constant to the current function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if `ty` is not an integer type.
    pub fn const_int(&mut self, ty: IrType, value: u64) -> Result<ValueId> {
        self.module.function_mut(self.func)?.const_int(ty, value)
    }

    /// Adds the address of a module function as a value of the current function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] if `target` does not exist.
    pub fn function_address(&mut self, target: FuncId) -> Result<ValueId> {
        let ty = IrType::function_pointer(
            self.module
                .function(target)
                .ok_or(Error::UnknownFunction(target))?
                .ty()
                .clone(),
        );
        Ok(self
            .module
            .function_mut(self.func)?
            .add_value(ty, ValueKind::FunctionAddress(target)))
    }

    fn insert(&mut self, result_ty: Option<IrType>, op: Op) -> Result<Option<ValueId>> {
        let func_id = self.func;
        let func = self.module.function_mut(func_id)?;

        let position = {
            let block = func.block(self.block).ok_or(Error::UnknownBlock {
                function: func_id,
                block: self.block,
            })?;
            match self.point {
                InsertPoint::End => block.instruction_count(),
                InsertPoint::Before(anchor) => {
                    block.position_of(anchor).ok_or(Error::UnknownInstruction {
                        function: func_id,
                        inst: anchor,
                    })?
                }
            }
        };

        let id = func.next_inst_id();
        let result = result_ty.map(|ty| func.add_value(ty, ValueKind::Instruction(id)));
        func.block_mut(self.block)?
            .insert(position, Instruction::new(id, result, op));
        Ok(result)
    }

    fn insert_value(&mut self, ty: IrType, op: Op) -> Result<ValueId> {
        self.insert(Some(ty), op)?
            .ok_or_else(|| malformed_error!("instruction did not define a value"))
    }

    /// Emits a direct C-convention call. Returns the call's value unless the callee returns
    /// `void`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] if `callee` does not exist.
    pub fn create_call(&mut self, callee: FuncId, args: &[ValueId]) -> Result<Option<ValueId>> {
        self.create_call_with_conv(callee, args, CallingConv::C)
    }

    /// Emits a direct call with an explicit calling convention.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] if `callee` does not exist.
    pub fn create_call_with_conv(
        &mut self,
        callee: FuncId,
        args: &[ValueId],
        conv: CallingConv,
    ) -> Result<Option<ValueId>> {
        let ret = self
            .module
            .function(callee)
            .ok_or(Error::UnknownFunction(callee))?
            .ty()
            .ret()
            .clone();

        let result_ty = (!ret.is_void()).then_some(ret);
        self.insert(
            result_ty,
            Op::Call {
                callee: Callee::Direct(callee),
                args: args.to_vec(),
                conv,
            },
        )
    }

    /// Emits a call through a function pointer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if `ptr` is not a pointer to a function type.
    pub fn create_indirect_call(
        &mut self,
        ptr: ValueId,
        args: &[ValueId],
    ) -> Result<Option<ValueId>> {
        let ptr_ty = self.value_type(ptr)?;
        let ret = ptr_ty
            .pointee_function()
            .ok_or_else(|| malformed_error!("indirect call through non-function {}", ptr_ty))?
            .ret()
            .clone();

        let result_ty = (!ret.is_void()).then_some(ret);
        self.insert(
            result_ty,
            Op::Call {
                callee: Callee::Indirect(ptr),
                args: args.to_vec(),
                conv: CallingConv::C,
            },
        )
    }

    /// Emits a cast of the given kind without folding or validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion point is invalid.
    pub fn create_cast(&mut self, kind: CastKind, value: ValueId, to: IrType) -> Result<ValueId> {
        self.insert_value(to.clone(), Op::Cast { kind, value, to })
    }

    /// Converts a pointer or integer to the pointer type `to`.
    ///
    /// Same type folds to `value`; pointers in the same address space use `bitcast`, across
    /// address spaces `addrspacecast`; integers use `inttoptr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCast`] for any other combination.
    pub fn create_pointer_cast(&mut self, value: ValueId, to: IrType) -> Result<ValueId> {
        let from = self.value_type(value)?;
        if from == to {
            return Ok(value);
        }

        let kind = match (from.addr_space(), to.addr_space()) {
            (Some(src), Some(dst)) if src == dst => CastKind::BitCast,
            (Some(_), Some(_)) => CastKind::AddrSpaceCast,
            (None, Some(_)) if from.is_integer() => CastKind::IntToPtr,
            _ => {
                return Err(Error::InvalidCast {
                    from,
                    to,
                    reason: "pointer cast needs a pointer destination and a pointer or integer source",
                })
            }
        };
        self.create_cast(kind, value, to)
    }

    /// Reinterprets the bits of `value` as type `to`.
    ///
    /// Same type folds to `value`. Pointers may only be bit-cast to pointers of the same
    /// address space; other scalars need equal, non-zero primitive sizes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCast`] if the sizes or kinds are incompatible.
    pub fn create_bitcast(&mut self, value: ValueId, to: IrType) -> Result<ValueId> {
        let from = self.value_type(value)?;
        if from == to {
            return Ok(value);
        }

        let valid = match (from.addr_space(), to.addr_space()) {
            (Some(src), Some(dst)) => src == dst,
            (None, None) => {
                from.is_single_value()
                    && to.is_single_value()
                    && from.primitive_size_bits() != 0
                    && from.primitive_size_bits() == to.primitive_size_bits()
            }
            _ => false,
        };
        if !valid {
            return Err(Error::InvalidCast {
                from,
                to,
                reason: "bitcast needs equally sized scalars or pointers in one address space",
            });
        }
        self.create_cast(CastKind::BitCast, value, to)
    }

    /// Converts an integer to the integer type `to`, extending or truncating as needed.
    ///
    /// Same width folds to `value`. Extension is sign- or zero-filling per `signed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCast`] if either side is not an integer.
    pub fn create_int_cast(&mut self, value: ValueId, to: IrType, signed: bool) -> Result<ValueId> {
        let from = self.value_type(value)?;
        let (Some(src), Some(dst)) = (from.int_width(), to.int_width()) else {
            return Err(Error::InvalidCast {
                from,
                to,
                reason: "integer cast needs integer types",
            });
        };

        let kind = match src.cmp(&dst) {
            std::cmp::Ordering::Equal => return Ok(value),
            std::cmp::Ordering::Less if signed => CastKind::SExt,
            std::cmp::Ordering::Less => CastKind::ZExt,
            std::cmp::Ordering::Greater => CastKind::Trunc,
        };
        self.create_cast(kind, value, to)
    }

    /// Emits a stack allocation and returns the slot's address.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion point is invalid.
    pub fn create_alloca(&mut self, ty: IrType) -> Result<ValueId> {
        self.insert_value(ty.clone().pointer_to(), Op::Alloca { ty })
    }

    /// Emits a load through `ptr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if `ptr` is not a pointer.
    pub fn create_load(&mut self, ptr: ValueId) -> Result<ValueId> {
        let ptr_ty = self.value_type(ptr)?;
        let ty = ptr_ty
            .pointee()
            .cloned()
            .ok_or_else(|| malformed_error!("load through non-pointer {}", ptr_ty))?;
        self.insert_value(ty, Op::Load { ptr })
    }

    /// Emits a store of `value` through `ptr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion point is invalid.
    pub fn create_store(&mut self, value: ValueId, ptr: ValueId) -> Result<()> {
        self.insert(None, Op::Store { value, ptr })?;
        Ok(())
    }

    /// Emits an integer binary operation.
    ///
    /// # Errors
    ///
    /// Returns an error if `lhs` is unknown or the insertion point is invalid.
    pub fn create_binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        let ty = self.value_type(lhs)?;
        self.insert_value(ty, Op::Binary { op, lhs, rhs })
    }

    /// Emits an integer comparison producing `i1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion point is invalid.
    pub fn create_icmp(
        &mut self,
        pred: IntPredicate,
        lhs: ValueId,
        rhs: ValueId,
    ) -> Result<ValueId> {
        self.insert_value(IrType::i1(), Op::ICmp { pred, lhs, rhs })
    }

    /// Emits an unconditional branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion point is invalid.
    pub fn create_br(&mut self, target: BlockId) -> Result<()> {
        self.insert(None, Op::Br { target })?;
        Ok(())
    }

    /// Emits a conditional branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion point is invalid.
    pub fn create_cond_br(
        &mut self,
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<()> {
        self.insert(
            None,
            Op::CondBr {
                cond,
                then_block,
                else_block,
            },
        )?;
        Ok(())
    }

    /// Emits a return, with a value unless `value` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion point is invalid.
    pub fn create_ret(&mut self, value: Option<ValueId>) -> Result<()> {
        self.insert(None, Op::Ret { value })?;
        Ok(())
    }

    /// Emits `unreachable`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion point is invalid.
    pub fn create_unreachable(&mut self) -> Result<()> {
        self.insert(None, Op::Unreachable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FunctionType;

    fn module_with(params: Vec<IrType>) -> (Module, FuncId, BlockId) {
        let mut module = Module::new("m");
        let func = module
            .add_function("f", FunctionType::new(params, IrType::Void))
            .unwrap();
        let block = module.function_mut(func).unwrap().append_block();
        (module, func, block)
    }

    fn ops(module: &Module, func: FuncId) -> Vec<Op> {
        module
            .function(func)
            .unwrap()
            .instructions()
            .map(|(_, instr)| instr.op().clone())
            .collect()
    }

    #[test]
    fn test_pointer_cast_folds_same_type() {
        let (mut module, func, block) = module_with(vec![IrType::i8_ptr()]);
        let mut builder = IrBuilder::at_end(&mut module, func, block);
        let arg = builder.arg(0).unwrap();
        assert_eq!(builder.create_pointer_cast(arg, IrType::i8_ptr()).unwrap(), arg);
        assert!(ops(&module, func).is_empty());
    }

    #[test]
    fn test_pointer_cast_kinds() {
        let (mut module, func, block) = module_with(vec![
            IrType::i32().pointer_to(),
            IrType::i8().pointer_in(1),
            IrType::i64(),
            IrType::Double,
        ]);
        let mut builder = IrBuilder::at_end(&mut module, func, block);
        let (a, b, c, d) = (
            builder.arg(0).unwrap(),
            builder.arg(1).unwrap(),
            builder.arg(2).unwrap(),
            builder.arg(3).unwrap(),
        );
        builder.create_pointer_cast(a, IrType::i8_ptr()).unwrap();
        builder.create_pointer_cast(b, IrType::i8_ptr()).unwrap();
        builder.create_pointer_cast(c, IrType::i8_ptr()).unwrap();
        assert!(matches!(
            builder.create_pointer_cast(d, IrType::i8_ptr()),
            Err(Error::InvalidCast { .. })
        ));

        let kinds: Vec<CastKind> = ops(&module, func)
            .into_iter()
            .filter_map(|op| match op {
                Op::Cast { kind, .. } => Some(kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![CastKind::BitCast, CastKind::AddrSpaceCast, CastKind::IntToPtr]
        );
    }

    #[test]
    fn test_int_cast_directions() {
        let (mut module, func, block) =
            module_with(vec![IrType::i16(), IrType::i64(), IrType::Int(128)]);
        let mut builder = IrBuilder::at_end(&mut module, func, block);
        let (a, b, c) = (
            builder.arg(0).unwrap(),
            builder.arg(1).unwrap(),
            builder.arg(2).unwrap(),
        );
        builder.create_int_cast(a, IrType::i64(), false).unwrap();
        assert_eq!(builder.create_int_cast(b, IrType::i64(), false).unwrap(), b);
        builder.create_int_cast(c, IrType::i64(), false).unwrap();
        builder.create_int_cast(a, IrType::i64(), true).unwrap();

        let kinds: Vec<CastKind> = ops(&module, func)
            .into_iter()
            .filter_map(|op| match op {
                Op::Cast { kind, .. } => Some(kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![CastKind::ZExt, CastKind::Trunc, CastKind::SExt]);
    }

    #[test]
    fn test_bitcast_rules() {
        let (mut module, func, block) =
            module_with(vec![IrType::Double, IrType::i8_ptr(), IrType::Float]);
        let mut builder = IrBuilder::at_end(&mut module, func, block);
        let (d, p, fl) = (
            builder.arg(0).unwrap(),
            builder.arg(1).unwrap(),
            builder.arg(2).unwrap(),
        );
        assert!(builder.create_bitcast(d, IrType::i64()).is_ok());
        assert!(builder.create_bitcast(fl, IrType::i64()).is_err());
        assert!(builder.create_bitcast(p, IrType::i64()).is_err());
        assert!(builder
            .create_bitcast(p, IrType::i32().pointer_to())
            .is_ok());
    }

    #[test]
    fn test_insert_before_keeps_creation_order() {
        let mut module = Module::new("m");
        let callee = module
            .add_function("g", FunctionType::new(vec![], IrType::Void))
            .unwrap();
        let func = module
            .add_function("f", FunctionType::new(vec![], IrType::Void))
            .unwrap();
        let block = module.function_mut(func).unwrap().append_block();

        let mut builder = IrBuilder::at_end(&mut module, func, block);
        builder.create_call(callee, &[]).unwrap();
        builder.create_ret(None).unwrap();

        let anchor = module.function(func).unwrap().blocks()[0].instructions()[1].id();
        let mut builder = IrBuilder::before(&mut module, func, anchor).unwrap();
        builder.create_alloca(IrType::i32()).unwrap();
        builder.create_alloca(IrType::i64()).unwrap();

        let ops = ops(&module, func);
        assert!(matches!(ops[0], Op::Call { .. }));
        assert_eq!(ops[1], Op::Alloca { ty: IrType::i32() });
        assert_eq!(ops[2], Op::Alloca { ty: IrType::i64() });
        assert_eq!(ops[3], Op::Ret { value: None });
    }

    #[test]
    fn test_void_call_has_no_result() {
        let mut module = Module::new("m");
        let callee = module
            .add_function("g", FunctionType::new(vec![], IrType::Void))
            .unwrap();
        let func = module
            .add_function("f", FunctionType::new(vec![], IrType::Void))
            .unwrap();
        let block = module.function_mut(func).unwrap().append_block();
        let mut builder = IrBuilder::at_end(&mut module, func, block);
        assert_eq!(builder.create_call(callee, &[]).unwrap(), None);
    }
}
