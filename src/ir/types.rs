//! IR type system.
//!
//! The type model follows the classic typed-pointer LLVM shape: integers carry an explicit
//! bit width, pointers carry their pointee and address space, and functions are described by
//! a [`FunctionType`]. Types are plain values: structural equality is type identity, which is
//! exactly what the call-site classifier relies on when it asks whether two parameters have
//! "the same" pointer type.
//!
//! # Type Categories
//!
//! - **Scalars**: `void`, `iN`, `half`, `float`, `double`
//! - **Derived**: pointers, fixed-size arrays, named (opaque) structs, function types

use std::fmt;

/// An IR type.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::ir::IrType;
///
/// let byte_ptr = IrType::i8_ptr();
/// assert!(byte_ptr.is_pointer());
/// assert_eq!(byte_ptr.pointee(), Some(&IrType::Int(8)));
/// assert_eq!(IrType::i64().int_width(), Some(64));
/// assert_eq!(byte_ptr.to_string(), "i8*");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum IrType {
    /// No value.
    #[default]
    Void,

    /// Integer of the given bit width (`i1`, `i8`, `i32`, ...).
    Int(u32),

    /// 16-bit IEEE float.
    Half,

    /// 32-bit IEEE float.
    Float,

    /// 64-bit IEEE float.
    Double,

    /// Typed pointer.
    Pointer {
        /// Type of the pointed-to object
        pointee: Box<IrType>,
        /// Address space of the pointer (0 is the default space)
        addr_space: u32,
    },

    /// Fixed-size array.
    Array {
        /// Element type
        element: Box<IrType>,
        /// Number of elements
        len: u64,
    },

    /// Named struct, opaque to the pass.
    Struct(String),

    /// Function type, only meaningful behind a pointer.
    Function(Box<FunctionType>),
}

impl IrType {
    /// `i1`
    #[must_use]
    pub const fn i1() -> Self {
        Self::Int(1)
    }

    /// `i8`
    #[must_use]
    pub const fn i8() -> Self {
        Self::Int(8)
    }

    /// `i16`
    #[must_use]
    pub const fn i16() -> Self {
        Self::Int(16)
    }

    /// `i32`
    #[must_use]
    pub const fn i32() -> Self {
        Self::Int(32)
    }

    /// `i64`
    #[must_use]
    pub const fn i64() -> Self {
        Self::Int(64)
    }

    /// `i8*` in address space 0, the opaque byte pointer used by every hook routine.
    #[must_use]
    pub fn i8_ptr() -> Self {
        Self::i8().pointer_to()
    }

    /// Returns a pointer to this type in address space 0.
    #[must_use]
    pub fn pointer_to(self) -> Self {
        self.pointer_in(0)
    }

    /// Returns a pointer to this type in the given address space.
    #[must_use]
    pub fn pointer_in(self, addr_space: u32) -> Self {
        Self::Pointer {
            pointee: Box::new(self),
            addr_space,
        }
    }

    /// Returns a pointer to a function of the given type.
    #[must_use]
    pub fn function_pointer(ty: FunctionType) -> Self {
        Self::Function(Box::new(ty)).pointer_to()
    }

    /// Returns a named struct type.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Struct(name.into())
    }

    /// Returns `true` for `void`.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns `true` for any integer type.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Returns `true` if this is an integer of exactly `width` bits.
    #[must_use]
    pub const fn is_integer_of(&self, width: u32) -> bool {
        matches!(self, Self::Int(w) if *w == width)
    }

    /// Returns `true` for floating point types.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Half | Self::Float | Self::Double)
    }

    /// Returns `true` for pointer types.
    #[must_use]
    pub const fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer { .. })
    }

    /// Returns `true` for scalar first-class types that can be cast.
    #[must_use]
    pub const fn is_single_value(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Half | Self::Float | Self::Double | Self::Pointer { .. }
        )
    }

    /// Returns the bit width of an integer type.
    #[must_use]
    pub const fn int_width(&self) -> Option<u32> {
        match self {
            Self::Int(w) => Some(*w),
            _ => None,
        }
    }

    /// Returns the pointee of a pointer type.
    #[must_use]
    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            Self::Pointer { pointee, .. } => Some(&**pointee),
            _ => None,
        }
    }

    /// Returns the address space of a pointer type.
    #[must_use]
    pub const fn addr_space(&self) -> Option<u32> {
        match self {
            Self::Pointer { addr_space, .. } => Some(*addr_space),
            _ => None,
        }
    }

    /// Returns the function type behind a function pointer.
    #[must_use]
    pub fn pointee_function(&self) -> Option<&FunctionType> {
        match self.pointee() {
            Some(Self::Function(ty)) => Some(&**ty),
            _ => None,
        }
    }

    /// Returns the primitive size in bits.
    ///
    /// Mirrors the usual compiler notion: scalars report their width, everything else
    /// (pointers included, whose width is target dependent) reports `0`.
    #[must_use]
    pub const fn primitive_size_bits(&self) -> u32 {
        match self {
            Self::Int(w) => *w,
            Self::Half => 16,
            Self::Float => 32,
            Self::Double => 64,
            _ => 0,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Int(w) => write!(f, "i{w}"),
            Self::Half => f.write_str("half"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::Pointer {
                pointee,
                addr_space: 0,
            } => write!(f, "{pointee}*"),
            Self::Pointer {
                pointee,
                addr_space,
            } => write!(f, "{pointee} addrspace({addr_space})*"),
            Self::Array { element, len } => write!(f, "[{len} x {element}]"),
            Self::Struct(name) => write!(f, "%{name}"),
            Self::Function(ty) => write!(f, "{ty}"),
        }
    }
}

/// Signature of a function: ordered parameter types, return type, variadic flag.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::ir::{FunctionType, IrType};
///
/// let memcmp = FunctionType::new(
///     vec![IrType::i8_ptr(), IrType::i8_ptr(), IrType::i64()],
///     IrType::i32(),
/// );
/// assert_eq!(memcmp.param_count(), 3);
/// assert_eq!(memcmp.to_string(), "i32 (i8*, i8*, i64)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    params: Vec<IrType>,
    ret: IrType,
    vararg: bool,
}

impl FunctionType {
    /// Creates a non-variadic function type.
    #[must_use]
    pub fn new(params: Vec<IrType>, ret: IrType) -> Self {
        Self {
            params,
            ret,
            vararg: false,
        }
    }

    /// Creates a variadic function type.
    #[must_use]
    pub fn variadic(params: Vec<IrType>, ret: IrType) -> Self {
        Self {
            params,
            ret,
            vararg: true,
        }
    }

    /// Returns the parameter types.
    #[must_use]
    pub fn params(&self) -> &[IrType] {
        &self.params
    }

    /// Returns the parameter type at `index`.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&IrType> {
        self.params.get(index)
    }

    /// Returns the number of declared parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Returns the return type.
    #[must_use]
    pub const fn ret(&self) -> &IrType {
        &self.ret
    }

    /// Returns `true` if the function accepts extra variadic arguments.
    #[must_use]
    pub const fn is_vararg(&self) -> bool {
        self.vararg
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        if self.vararg {
            if self.params.is_empty() {
                f.write_str("...")?;
            } else {
                f.write_str(", ...")?;
            }
        }
        f.write_str(")")
    }
}

/// Calling convention of a call instruction.
///
/// Only [`CallingConv::C`] call sites are considered for instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallingConv {
    /// The platform C convention.
    #[default]
    C,
    /// `fastcc`
    Fast,
    /// `coldcc`
    Cold,
    /// `x86_stdcallcc`
    X86StdCall,
    /// `x86_fastcallcc`
    X86FastCall,
    /// Any other numbered convention.
    Other(u32),
}

impl fmt::Display for CallingConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::C => f.write_str("ccc"),
            Self::Fast => f.write_str("fastcc"),
            Self::Cold => f.write_str("coldcc"),
            Self::X86StdCall => f.write_str("x86_stdcallcc"),
            Self::X86FastCall => f.write_str("x86_fastcallcc"),
            Self::Other(id) => write!(f, "cc {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_identity_is_structural() {
        let a = IrType::named("struct.node").pointer_to();
        let b = IrType::named("struct.node").pointer_to();
        let c = IrType::named("struct.node").pointer_in(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(IrType::i8_ptr(), IrType::i16().pointer_to());
    }

    #[test]
    fn test_primitive_sizes() {
        assert_eq!(IrType::i1().primitive_size_bits(), 1);
        assert_eq!(IrType::i32().primitive_size_bits(), 32);
        assert_eq!(IrType::Half.primitive_size_bits(), 16);
        assert_eq!(IrType::Double.primitive_size_bits(), 64);
        assert_eq!(IrType::i8_ptr().primitive_size_bits(), 0);
        assert_eq!(IrType::Void.primitive_size_bits(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(IrType::i8().pointer_in(3).to_string(), "i8 addrspace(3)*");
        assert_eq!(
            IrType::Array {
                element: Box::new(IrType::i8()),
                len: 16
            }
            .to_string(),
            "[16 x i8]"
        );
        let printf = FunctionType::variadic(vec![IrType::i8_ptr()], IrType::i32());
        assert_eq!(printf.to_string(), "i32 (i8*, ...)");
        assert_eq!(
            IrType::function_pointer(FunctionType::new(vec![], IrType::Void)).to_string(),
            "void ()*"
        );
    }

    #[test]
    fn test_function_pointer_pointee() {
        let ty = FunctionType::new(vec![IrType::i32()], IrType::i32());
        let ptr = IrType::function_pointer(ty.clone());
        assert_eq!(ptr.pointee_function(), Some(&ty));
        assert_eq!(IrType::i8_ptr().pointee_function(), None);
    }
}
