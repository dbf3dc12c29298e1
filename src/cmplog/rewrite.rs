//! Insertion of hook calls in front of classified call sites.

use crate::{
    cmplog::{CallSite, HookArgs},
    ir::{FuncId, IrBuilder, IrType, Module, ValueId},
    Error, Result,
};

/// Converts a length argument to `i64`.
///
/// The value is first reinterpreted as an integer of its own primitive width (a no-op for
/// integers), then zero-extended or truncated to 64 bits.
///
/// # Errors
///
/// Returns [`Error::InvalidCast`] if the value has no primitive size, such as a pointer.
pub fn adapt_length(builder: &mut IrBuilder<'_>, value: ValueId) -> Result<ValueId> {
    let ty = builder.value_type(value)?;
    let bits = ty.primitive_size_bits();
    if bits == 0 {
        return Err(Error::InvalidCast {
            from: ty,
            to: IrType::i64(),
            reason: "length argument has no primitive size",
        });
    }

    let as_int = builder.create_bitcast(value, IrType::Int(bits))?;
    builder.create_int_cast(as_int, IrType::i64(), false)
}

/// Inserts a call to `hook` immediately before the call at `site`.
///
/// Arguments 0 and 1 are pointer-cast to `i8*`; for [`HookArgs::PointerPairWithLength`]
/// argument 2 is passed through [`adapt_length`]. The original call is left untouched.
///
/// # Errors
///
/// Returns an error if the site no longer exists, has fewer arguments than the hook needs,
/// or an argument cannot be converted.
pub fn insert_hook(
    module: &mut Module,
    hook: FuncId,
    args: HookArgs,
    site: &CallSite,
) -> Result<()> {
    let call_args: Vec<ValueId> = module
        .function(site.function)
        .ok_or(Error::UnknownFunction(site.function))?
        .block(site.block)
        .and_then(|block| block.instruction(site.inst))
        .and_then(|instr| instr.call_args())
        .ok_or(Error::UnknownInstruction {
            function: site.function,
            inst: site.inst,
        })?
        .to_vec();

    if call_args.len() < args.arity() {
        return Err(malformed_error!(
            "call {} passes {} arguments, hook needs {}",
            site.inst,
            call_args.len(),
            args.arity()
        ));
    }

    let mut builder = IrBuilder::before(module, site.function, site.inst)?;
    let mut hook_args = Vec::with_capacity(args.arity());
    hook_args.push(builder.create_pointer_cast(call_args[0], IrType::i8_ptr())?);
    hook_args.push(builder.create_pointer_cast(call_args[1], IrType::i8_ptr())?);
    if args == HookArgs::PointerPairWithLength {
        hook_args.push(adapt_length(&mut builder, call_args[2])?);
    }

    builder.create_call(hook, &hook_args)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cmplog::Category,
        ir::{Callee, CastKind, FunctionType, Op},
        test::single_call_module,
    };

    fn site_of(module: &Module, caller: FuncId, callee: FuncId, category: Category) -> CallSite {
        let (block, instr) = module
            .function(caller)
            .unwrap()
            .instructions()
            .find(|(_, i)| i.called_function() == Some(callee))
            .unwrap();
        CallSite {
            function: caller,
            block,
            inst: instr.id(),
            callee,
            category,
        }
    }

    fn ops(module: &Module, func: FuncId) -> Vec<Op> {
        module
            .function(func)
            .unwrap()
            .instructions()
            .map(|(_, i)| i.op().clone())
            .collect()
    }

    #[test]
    fn test_length_is_widened() {
        let (mut module, caller, callee) = single_call_module(
            "memcmp",
            FunctionType::new(
                vec![IrType::i8_ptr(), IrType::i8_ptr(), IrType::i32()],
                IrType::i32(),
            ),
        );
        let hook = module
            .add_function("hook", HookArgs::PointerPairWithLength.signature())
            .unwrap();
        let site = site_of(&module, caller, callee, Category::MemCompareN);
        insert_hook(&mut module, hook, HookArgs::PointerPairWithLength, &site).unwrap();

        let ops = ops(&module, caller);
        assert!(matches!(
            ops[0],
            Op::Cast {
                kind: CastKind::ZExt,
                ..
            }
        ));
        assert!(matches!(ops[1], Op::Call { callee: Callee::Direct(h), .. } if h == hook));
        assert!(matches!(ops[2], Op::Call { callee: Callee::Direct(c), .. } if c == callee));
    }

    #[test]
    fn test_pointer_length_is_rejected() {
        let ptr = IrType::i8_ptr();
        let (mut module, caller, callee) = single_call_module(
            "odd",
            FunctionType::new(vec![ptr.clone(), ptr.clone(), ptr], IrType::i32()),
        );
        let hook = module
            .add_function("hook", HookArgs::PointerPairWithLength.signature())
            .unwrap();
        let site = site_of(&module, caller, callee, Category::MemCompareN);
        let result = insert_hook(&mut module, hook, HookArgs::PointerPairWithLength, &site);
        assert!(matches!(result, Err(Error::InvalidCast { .. })));
    }

    #[test]
    fn test_float_length_is_bitcast_then_extended() {
        let (mut module, caller, callee) = single_call_module(
            "weird",
            FunctionType::new(
                vec![IrType::i8_ptr(), IrType::i8_ptr(), IrType::Float],
                IrType::i32(),
            ),
        );
        let hook = module
            .add_function("hook", HookArgs::PointerPairWithLength.signature())
            .unwrap();
        let site = site_of(&module, caller, callee, Category::MemCompareN);
        insert_hook(&mut module, hook, HookArgs::PointerPairWithLength, &site).unwrap();

        let kinds: Vec<CastKind> = ops(&module, caller)
            .into_iter()
            .filter_map(|op| match op {
                Op::Cast { kind, .. } => Some(kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![CastKind::BitCast, CastKind::ZExt]);
    }
}
