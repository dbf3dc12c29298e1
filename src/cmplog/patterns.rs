//! Name tables used to recognise comparison routines.
//!
//! Exact-name families are fixed sets of C library and popular third-party routines. The
//! managed-string rules match mangled C++ names by substring, because the same comparison
//! operator is instantiated under many template argument spellings.

use crate::{cmplog::Category, ir::FunctionType};

/// Memory comparison routines taking `(ptr, ptr, len)`.
pub const MEMORY_COMPARE: &[&str] = &[
    "memcmp",
    "bcmp",
    "CRYPTO_memcmp",
    "OPENSSL_memcmp",
    "memcmp_const_time",
    "memcmpct",
];

/// String comparison and search routines taking `(char*, char*)`.
pub const STRING_COMPARE: &[&str] = &[
    "strcmp",
    "xmlStrcmp",
    "xmlStrEqual",
    "g_strcmp0",
    "curl_strequal",
    "strcsequal",
    "strcasecmp",
    "stricmp",
    "ap_cstr_casecmp",
    "OPENSSL_strcasecmp",
    "xmlStrcasecmp",
    "g_strcasecmp",
    "g_ascii_strcasecmp",
    "Curl_strcasecompare",
    "Curl_safe_strcasecompare",
    "cmsstrcasecmp",
    "strstr",
    "g_strstr_len",
    "ap_strcasestr",
    "xmlStrstr",
    "xmlStrcasestr",
    "g_str_has_prefix",
    "g_str_has_suffix",
];

/// Bounded string comparison routines taking `(char*, char*, len)`.
pub const BOUNDED_STRING_COMPARE: &[&str] = &[
    "strncmp",
    "xmlStrncmp",
    "curl_strnequal",
    "strncasecmp",
    "strnicmp",
    "ap_cstr_casecmpn",
    "OPENSSL_strncasecmp",
    "xmlStrncasecmp",
    "g_ascii_strncasecmp",
    "Curl_strncasecompare",
    "g_strncasecmp",
];

/// Parameter shape a managed-string rule requires of the callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgShape {
    /// At least two parameters; the first two are the same pointer type.
    IdenticalPointers,
    /// At least two parameters; the first two are pointers of any type.
    Pointers,
}

impl ArgShape {
    /// Returns `true` if `ty` has this shape.
    #[must_use]
    pub fn matches(self, ty: &FunctionType) -> bool {
        let (Some(first), Some(second)) = (ty.param(0), ty.param(1)) else {
            return false;
        };
        match self {
            Self::IdenticalPointers => first.is_pointer() && first == second,
            Self::Pointers => first.is_pointer() && second.is_pointer(),
        }
    }
}

/// One managed-string recognition rule.
///
/// A callee matches when its name contains every required marker, none of the forbidden
/// markers, and its signature has the rule's [`ArgShape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRule {
    category: Category,
    required: Vec<String>,
    forbidden: Vec<String>,
    shape: ArgShape,
}

impl MarkerRule {
    /// Creates a rule with no forbidden markers.
    #[must_use]
    pub fn new(category: Category, required: &[&str], shape: ArgShape) -> Self {
        Self {
            category,
            required: required.iter().map(ToString::to_string).collect(),
            forbidden: Vec::new(),
            shape,
        }
    }

    /// Adds markers whose presence disqualifies a name.
    #[must_use]
    pub fn forbid(mut self, markers: &[&str]) -> Self {
        self.forbidden.extend(markers.iter().map(ToString::to_string));
        self
    }

    /// Returns the category assigned on a match.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns the required markers.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Returns the forbidden markers.
    #[must_use]
    pub fn forbidden(&self) -> &[String] {
        &self.forbidden
    }

    /// Returns the required parameter shape.
    #[must_use]
    pub const fn shape(&self) -> ArgShape {
        self.shape
    }

    /// Returns `true` if `name` satisfies the marker conditions.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.required.iter().all(|m| name.contains(m.as_str()))
            && !self.forbidden.iter().any(|m| name.contains(m.as_str()))
    }

    /// Returns `true` if the callee `name` with signature `ty` matches this rule.
    #[must_use]
    pub fn matches(&self, name: &str, ty: &FunctionType) -> bool {
        self.matches_name(name) && self.shape.matches(ty)
    }
}

/// Ordered managed-string rules; the first matching rule wins.
///
/// # Examples
///
/// ```rust
/// use cmplog_routines::cmplog::{Category, MarkerTable};
/// use cmplog_routines::ir::{FunctionType, IrType};
///
/// let table = MarkerTable::builtin();
/// let string = IrType::named("class.std::__1::basic_string").pointer_to();
/// let ty = FunctionType::new(vec![string.clone(), IrType::i8_ptr()], IrType::i1());
///
/// let name = "_ZNSt3__1eqIcNS_11char_traitsIcEENS_9allocatorIcEEEEbRKNS_12basic_stringIT_T0_T1_EEPKS6_";
/// assert_eq!(table.classify(name, &ty), Some(Category::LlvmStdStringCString));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerTable {
    version: u32,
    rules: Vec<MarkerRule>,
}

impl MarkerTable {
    /// Version of the builtin rule set.
    pub const VERSION: u32 = 1;

    /// Returns the builtin rules in precedence order.
    ///
    /// Within each runtime library the string/string rule precedes the string/C-string rule,
    /// and libstdc++ precedes libc++.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            version: Self::VERSION,
            rules: vec![
                MarkerRule::new(
                    Category::GccStdStringStdString,
                    &[
                        "__is_charIT_EE7__value",
                        "St7__cxx1112basic_stringIS2_St11char_traits",
                    ],
                    ArgShape::IdenticalPointers,
                ),
                MarkerRule::new(
                    Category::GccStdStringCString,
                    &["St7__cxx1112basic_stringIcSt11char_traitsIcESaIcEE7compareEPK"],
                    ArgShape::Pointers,
                ),
                MarkerRule::new(
                    Category::LlvmStdStringStdString,
                    &["_ZNSt3__1eqI", "_12basic_stringI", "_11char_traits"],
                    ArgShape::Pointers,
                )
                .forbid(&["PKc", "PKT_", "PKS"]),
                MarkerRule::new(
                    Category::LlvmStdStringCString,
                    &["_ZNSt3__1eqI", "_12basic_stringI"],
                    ArgShape::Pointers,
                ),
            ],
        }
    }

    /// Returns a table without rules.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: Self::VERSION,
            rules: Vec::new(),
        }
    }

    /// Appends a rule with the lowest precedence.
    ///
    /// Only the four `std::string` categories can be assigned by marker; a rule for any
    /// other category is dropped with a warning.
    #[must_use]
    pub fn with_rule(mut self, rule: MarkerRule) -> Self {
        if !rule.category().is_managed_string() {
            log::warn!("ignoring marker rule for non-string category {}", rule.category());
            return self;
        }
        self.rules.push(rule);
        self
    }

    /// Returns the rule set version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the rules in precedence order.
    #[must_use]
    pub fn rules(&self) -> &[MarkerRule] {
        &self.rules
    }

    /// Returns the category of the first rule matching the callee, if any.
    #[must_use]
    pub fn classify(&self, name: &str, ty: &FunctionType) -> Option<Category> {
        self.rules
            .iter()
            .find(|rule| rule.matches(name, ty))
            .map(MarkerRule::category)
    }
}

impl Default for MarkerTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrType;

    const GCC_STD_STD: &str = "_ZSteqIcEN9__gnu_cxx11__enable_ifIXsr9__is_charIT_EE7__valueEbE6__typeERKNSt7__cxx1112basic_stringIS2_St11char_traitsIS2_ESaIS2_EEESC_";
    const GCC_STD_C: &str =
        "_ZNKSt7__cxx1112basic_stringIcSt11char_traitsIcESaIcEE7compareEPKc";
    const LLVM_STD_STD: &str = "_ZNSt3__1eqINS_11char_traitsIcEENS_9allocatorIcEEEEbRKNS_12basic_stringIcT_T0_EESA_";
    const LLVM_STD_C: &str = "_ZNSt3__1eqIcNS_11char_traitsIcEENS_9allocatorIcEEEEbRKNS_12basic_stringIT_T0_T1_EEPKS6_";

    fn string_ptr() -> IrType {
        IrType::named("class.std::basic_string").pointer_to()
    }

    fn ty(a: IrType, b: IrType) -> FunctionType {
        FunctionType::new(vec![a, b], IrType::i1())
    }

    #[test]
    fn test_builtin_precedence() {
        let table = MarkerTable::builtin();
        let same = ty(string_ptr(), string_ptr());
        let mixed = ty(string_ptr(), IrType::i8_ptr());

        assert_eq!(
            table.classify(GCC_STD_STD, &same),
            Some(Category::GccStdStringStdString)
        );
        assert_eq!(
            table.classify(GCC_STD_C, &mixed),
            Some(Category::GccStdStringCString)
        );
        assert_eq!(
            table.classify(LLVM_STD_STD, &same),
            Some(Category::LlvmStdStringStdString)
        );
        assert_eq!(
            table.classify(LLVM_STD_C, &mixed),
            Some(Category::LlvmStdStringCString)
        );
    }

    #[test]
    fn test_shape_is_required() {
        let table = MarkerTable::builtin();
        // libstdc++ string/string needs identical pointer types.
        assert_eq!(
            table.classify(GCC_STD_STD, &ty(string_ptr(), IrType::i8_ptr())),
            None
        );
        assert_eq!(
            table.classify(LLVM_STD_C, &ty(string_ptr(), IrType::i64())),
            None
        );
        let unary = FunctionType::new(vec![string_ptr()], IrType::i1());
        assert_eq!(table.classify(LLVM_STD_STD, &unary), None);
    }

    #[test]
    fn test_forbidden_markers() {
        let rule = MarkerRule::new(Category::StrCompare, &["abc"], ArgShape::Pointers)
            .forbid(&["xyz"]);
        assert!(rule.matches_name("__abc__"));
        assert!(!rule.matches_name("__abc_xyz__"));
        assert!(!rule.matches_name("__ab__"));
    }

    #[test]
    fn test_custom_rules_extend_table() {
        let table = MarkerTable::empty().with_rule(MarkerRule::new(
            Category::LlvmStdStringCString,
            &["my_string_eq"],
            ArgShape::Pointers,
        ));
        assert_eq!(table.version(), MarkerTable::VERSION);
        assert_eq!(table.rules().len(), 1);
        assert_eq!(
            table.classify("my_string_eq", &ty(IrType::i8_ptr(), IrType::i8_ptr())),
            Some(Category::LlvmStdStringCString)
        );
        assert_eq!(
            MarkerTable::empty().classify(LLVM_STD_C, &ty(string_ptr(), IrType::i8_ptr())),
            None
        );
    }

    #[test]
    fn test_rules_limited_to_string_categories() {
        let table = MarkerTable::empty()
            .with_rule(MarkerRule::new(Category::StrCompare, &["my_cmp"], ArgShape::Pointers))
            .with_rule(MarkerRule::new(
                Category::GccStdStringCString,
                &["my_cmp"],
                ArgShape::Pointers,
            ));
        assert_eq!(table.rules().len(), 1);
        assert!(MarkerTable::builtin()
            .rules()
            .iter()
            .all(|rule| rule.category().is_managed_string()));
        assert_eq!(
            table.classify("my_cmp", &ty(IrType::i8_ptr(), IrType::i8_ptr())),
            Some(Category::GccStdStringCString)
        );
    }

    #[test]
    fn test_name_sets() {
        assert_eq!(MEMORY_COMPARE.len(), 6);
        assert_eq!(STRING_COMPARE.len(), 23);
        assert_eq!(BOUNDED_STRING_COMPARE.len(), 11);
    }
}
