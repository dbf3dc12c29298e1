//! # cmplog-routines Prelude
//!
//! The types needed to build a module and run the pass over it.
//!
//! ```rust
//! use cmplog_routines::prelude::*;
//!
//! let pass = CmpLogRoutinesPass::new(CmpLogConfig::from_args(["-cmplog_routines_extended"]));
//! assert!(pass.config().extended_header);
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

pub use crate::{Error, Result};

// ================================================================================================
// Intermediate Representation
// ================================================================================================

pub use crate::ir::{
    BlockId, CallingConv, CastKind, FuncId, Function, FunctionType, InstId, IrBuilder, IrType,
    Module, Op, StructuralVerifier, ValueId, Verifier,
};

// ================================================================================================
// Pass Infrastructure
// ================================================================================================

pub use crate::compiler::{EventKind, EventLog, ModulePass, PassManager};

// ================================================================================================
// Comparison Logging
// ================================================================================================

pub use crate::cmplog::{
    Category, CmpLogConfig, CmpLogRoutinesPass, IgnorePredicate, InstrumentationReport,
    MarkerTable, RuntimeFunctionFilter,
};
