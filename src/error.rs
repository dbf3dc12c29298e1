use thiserror::Error;

use crate::ir::{BlockId, FuncId, InstId, IrType, ValueId};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Classifying a call site that matches no comparison routine is *not* an error: it is the
/// normal outcome for most calls and simply produces no hook. The variants below cover
/// malformed IR handed to the builder or the verifier, and the single internal fault the
/// instrumentation pass can raise.
///
/// # Error Categories
///
/// ## IR Construction Errors
/// - [`Error::Malformed`] - A builder precondition was violated
/// - [`Error::UnknownFunction`], [`Error::UnknownBlock`], [`Error::UnknownValue`],
///   [`Error::UnknownInstruction`] - A handle does not resolve in the module
/// - [`Error::DuplicateFunction`] - A function name is already taken
/// - [`Error::SignatureMismatch`] - A declaration exists with a different type
/// - [`Error::InvalidCast`] - A cast between the requested types is impossible
///
/// ## Verification Errors
/// - [`Error::Verification`] - The structural verifier rejected the module
/// - [`Error::InstrumentationFault`] - A pass produced a module that fails verification
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::{ir::{FunctionType, IrType, Module}, Error};
///
/// let mut module = Module::new("demo");
/// let ty = FunctionType::new(vec![IrType::i8_ptr()], IrType::i32());
/// module.add_function("puts", ty.clone())?;
///
/// match module.add_function("puts", ty) {
///     Err(Error::DuplicateFunction(name)) => assert_eq!(name, "puts"),
///     other => panic!("unexpected: {other:?}"),
/// }
/// # Ok::<(), Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The IR handed to a builder operation is malformed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A function handle does not refer to a function of the module.
    #[error("Unknown function - {0}")]
    UnknownFunction(FuncId),

    /// A block handle does not refer to a block of the given function.
    #[error("Unknown block {block} in function {function}")]
    UnknownBlock {
        /// Function that was searched
        function: FuncId,
        /// The block that could not be found
        block: BlockId,
    },

    /// A value handle does not refer to a value of the given function.
    #[error("Unknown value {value} in function {function}")]
    UnknownValue {
        /// Function that was searched
        function: FuncId,
        /// The value that could not be found
        value: ValueId,
    },

    /// An instruction id could not be located in the given block.
    #[error("Unknown instruction {inst} in function {function}")]
    UnknownInstruction {
        /// Function that was searched
        function: FuncId,
        /// The instruction that could not be found
        inst: InstId,
    },

    /// A function with this name already exists in the module.
    #[error("A function named '{0}' already exists")]
    DuplicateFunction(String),

    /// A function with this name exists but has a different signature.
    ///
    /// Raised by [`crate::ir::Module::get_or_insert_function`] when the requested declaration
    /// would silently change the type of an existing symbol.
    #[error("Function '{name}' is declared as '{existing}', requested '{requested}'")]
    SignatureMismatch {
        /// Symbol name
        name: String,
        /// Signature of the existing function
        existing: String,
        /// Signature that was requested
        requested: String,
    },

    /// A cast between two types cannot be expressed.
    ///
    /// The instrumentation pass treats this as a precondition violation: the classifier's
    /// shape checks make it impossible for well-formed input.
    #[error("Cannot cast '{from}' to '{to}': {reason}")]
    InvalidCast {
        /// Source type
        from: IrType,
        /// Destination type
        to: IrType,
        /// Why the cast is impossible
        reason: &'static str,
    },

    /// The structural verifier rejected the module.
    ///
    /// Contains one line per detected issue, in module order.
    #[error("Module verification failed with {} issue(s): {}", .0.len(), .0.join("; "))]
    Verification(Vec<String>),

    /// A transformation pass produced a module that no longer verifies.
    ///
    /// This is an internal-invariant violation, not a user-facing condition: it means the
    /// pass itself emitted invalid code. It must never be ignored.
    #[error("Pass '{pass}' produced an invalid module: {source}")]
    InstrumentationFault {
        /// The pass that produced the module
        pass: &'static str,
        /// The verifier's report
        #[source]
        source: Box<Error>,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
