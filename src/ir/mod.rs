//! Typed intermediate representation of a compiled program.
//!
//! The IR models just enough of a compiler's module-level representation to express call-site
//! instrumentation: functions with signatures and calling conventions, basic blocks, typed
//! values and the instructions that produce and consume them.
//!
//! # Architecture
//!
//! - `types` - Integer, float, pointer, array, struct and function types
//! - `value` - Per-function value table entries (arguments, results, constants)
//! - `instruction` - Operations with stable instruction ids
//! - `block` - Basic blocks
//! - `function` - Declarations and definitions
//! - `module` - The unit of transformation, with LLVM-like text output
//! - `builder` - Instruction construction with an insertion point
//! - `verifier` - Post-transformation well-formedness checks
//!
//! # Identity
//!
//! Functions are addressed by [`FuncId`], blocks by [`BlockId`], values by [`ValueId`] and
//! instructions by [`InstId`]. Instruction ids are allocated once and never reused, so a
//! call site recorded during a scan stays valid while other instructions are inserted around
//! it.
//!
//! # Usage
//!
//! ```rust
//! use cmplog_routines::ir::{FunctionType, IrBuilder, IrType, Module, StructuralVerifier, Verifier};
//!
//! let mut module = Module::new("demo");
//! let memcmp = module.add_function(
//!     "memcmp",
//!     FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr(), IrType::i64()], IrType::i32()),
//! )?;
//! let check = module.add_function(
//!     "check",
//!     FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr(), IrType::i64()], IrType::i32()),
//! )?;
//! let entry = module.function_mut(check)?.append_block();
//!
//! let mut builder = IrBuilder::at_end(&mut module, check, entry);
//! let args = [builder.arg(0)?, builder.arg(1)?, builder.arg(2)?];
//! let result = builder.create_call(memcmp, &args)?;
//! builder.create_ret(result)?;
//!
//! StructuralVerifier.verify(&module)?;
//! println!("{module}");
//! # Ok::<(), cmplog_routines::Error>(())
//! ```

mod block;
mod builder;
mod function;
mod instruction;
mod module;
mod types;
mod value;
mod verifier;

pub use block::{Block, BlockId};
pub use builder::{InsertPoint, IrBuilder};
pub use function::{FuncId, Function};
pub use instruction::{BinaryOp, Callee, CastKind, InstId, Instruction, IntPredicate, Op};
pub use module::Module;
pub use types::{CallingConv, FunctionType, IrType};
pub use value::{ConstValue, Value, ValueId, ValueKind};
pub use verifier::{StructuralVerifier, Verifier};
