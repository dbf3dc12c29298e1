//! Shared fixtures for unit tests.

use crate::ir::{FuncId, FunctionType, IrBuilder, IrType, Module};

/// Builds a module with a declared callee and a `caller` that forwards its own arguments to it.
///
/// `caller` has the callee's parameter list, returns `void`, and consists of one block:
/// the call followed by `ret void`. Returns `(module, caller, callee)`.
pub(crate) fn single_call_module(callee_name: &str, ty: FunctionType) -> (Module, FuncId, FuncId) {
    let mut module = Module::new("test");
    let params = ty.params().to_vec();
    let callee = module.add_function(callee_name, ty).unwrap();
    let caller = module
        .add_function("caller", FunctionType::new(params, IrType::Void))
        .unwrap();

    let entry = module.function_mut(caller).unwrap().append_block();
    let mut builder = IrBuilder::at_end(&mut module, caller, entry);
    let count = builder.module().function(caller).unwrap().arg_count();
    let args: Vec<_> = (0..count).map(|i| builder.arg(i).unwrap()).collect();
    builder.create_call(callee, &args).unwrap();
    builder.create_ret(None).unwrap();

    (module, caller, callee)
}
