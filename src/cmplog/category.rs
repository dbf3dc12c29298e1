//! Comparison categories and their hook ABI.

use std::fmt;

use strum::{EnumCount, EnumIter};

use crate::ir::{FunctionType, IrType};

/// The comparison categories a call site can be assigned to.
///
/// Variant order is the order in which categories are rewritten. Every category maps to
/// exactly one hook routine and one argument adaptor.
///
/// ## Categories
///
/// ### Generic
/// - **`GenericPointerBinary`**: any non-void routine taking two identically typed pointers
///
/// ### Exact name
/// - **`MemCompareN`**: the memory-compare family, plus generic routines whose third
///   parameter is a 32- or 64-bit length
/// - **`StrCompare`**: NUL-terminated string comparison and search
/// - **`StrNCompare`**: length-bounded string comparison
///
/// ### Managed strings
/// - **`GccStdStringStdString`** / **`GccStdStringCString`**: libstdc++ `std::string`
///   comparisons against another `std::string` or a C string
/// - **`LlvmStdStringStdString`** / **`LlvmStdStringCString`**: the libc++ equivalents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount)]
pub enum Category {
    /// Two identically typed pointer arguments, non-void result.
    GenericPointerBinary,
    /// Two pointers and an explicit byte count.
    MemCompareN,
    /// Two C strings.
    StrCompare,
    /// Two C strings and a length bound.
    StrNCompare,
    /// libstdc++ `std::string` against `std::string`.
    GccStdStringStdString,
    /// libstdc++ `std::string` against a C string.
    GccStdStringCString,
    /// libc++ `std::string` against `std::string`.
    LlvmStdStringStdString,
    /// libc++ `std::string` against a C string.
    LlvmStdStringCString,
}

/// How the arguments of a classified call are passed to its hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookArgs {
    /// `(i8*, i8*)`: arguments 0 and 1 cast to byte pointers.
    PointerPair,
    /// `(i8*, i8*, i64)`: as above, plus argument 2 widened or narrowed to 64 bits.
    PointerPairWithLength,
}

impl HookArgs {
    /// Returns the number of call arguments the hook consumes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::PointerPair => 2,
            Self::PointerPairWithLength => 3,
        }
    }

    /// Returns the hook's signature; hooks always return `void`.
    #[must_use]
    pub fn signature(self) -> FunctionType {
        let mut params = vec![IrType::i8_ptr(), IrType::i8_ptr()];
        if self == Self::PointerPairWithLength {
            params.push(IrType::i64());
        }
        FunctionType::new(params, IrType::Void)
    }
}

impl Category {
    /// Returns the position of this category in rewrite order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the hook routine's symbol name.
    ///
    /// The extended variant appends `_extended` and is used by runtimes that capture
    /// additional context per comparison.
    #[must_use]
    pub fn hook_name(self, extended: bool) -> String {
        let base = match self {
            Self::GenericPointerBinary => "__cmplog_rtn_hook",
            Self::MemCompareN => "__cmplog_rtn_hook_n",
            Self::StrCompare => "__cmplog_rtn_hook_str",
            Self::StrNCompare => "__cmplog_rtn_hook_strn",
            Self::GccStdStringStdString => "__cmplog_rtn_gcc_stdstring_stdstring",
            Self::GccStdStringCString => "__cmplog_rtn_gcc_stdstring_cstring",
            Self::LlvmStdStringStdString => "__cmplog_rtn_llvm_stdstring_stdstring",
            Self::LlvmStdStringCString => "__cmplog_rtn_llvm_stdstring_cstring",
        };

        if extended {
            format!("{base}_extended")
        } else {
            base.to_string()
        }
    }

    /// Returns the argument adaptor of this category's hook.
    #[must_use]
    pub const fn hook_args(self) -> HookArgs {
        match self {
            Self::MemCompareN | Self::StrNCompare => HookArgs::PointerPairWithLength,
            _ => HookArgs::PointerPair,
        }
    }

    /// Returns `true` for the four `std::string` categories.
    #[must_use]
    pub const fn is_managed_string(self) -> bool {
        matches!(
            self,
            Self::GccStdStringStdString
                | Self::GccStdStringCString
                | Self::LlvmStdStringStdString
                | Self::LlvmStdStringCString
        )
    }

    /// Returns a short human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::GenericPointerBinary => "generic pointer routine",
            Self::MemCompareN => "memory compare",
            Self::StrCompare => "string compare",
            Self::StrNCompare => "bounded string compare",
            Self::GccStdStringStdString => "libstdc++ string/string compare",
            Self::GccStdStringCString => "libstdc++ string/C-string compare",
            Self::LlvmStdStringStdString => "libc++ string/string compare",
            Self::LlvmStdStringCString => "libc++ string/C-string compare",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Per-category counters, indexed by [`Category::index`].
pub type CategoryCounts = [usize; Category::COUNT];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_rewrite_order() {
        let order: Vec<Category> = Category::iter().collect();
        assert_eq!(order.len(), 8);
        assert_eq!(order[0], Category::GenericPointerBinary);
        assert_eq!(order[1], Category::MemCompareN);
        assert_eq!(order[4], Category::GccStdStringStdString);
        assert_eq!(order[7], Category::LlvmStdStringCString);
        for (i, category) in order.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_hook_names_are_distinct() {
        let names: HashSet<String> = Category::iter()
            .flat_map(|c| [c.hook_name(false), c.hook_name(true)])
            .collect();
        assert_eq!(names.len(), 16);
        assert_eq!(
            Category::StrCompare.hook_name(true),
            "__cmplog_rtn_hook_str_extended"
        );
    }

    #[test]
    fn test_hook_signatures() {
        assert_eq!(
            Category::MemCompareN.hook_args().signature().to_string(),
            "void (i8*, i8*, i64)"
        );
        assert_eq!(
            Category::LlvmStdStringCString.hook_args().signature().to_string(),
            "void (i8*, i8*)"
        );
        assert_eq!(Category::StrNCompare.hook_args().arity(), 3);
    }
}
