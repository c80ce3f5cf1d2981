//! Hindley-Milner type descriptors.
//!
//! The analyzer attaches an *internal* [`Type`] to every expression; the
//! *public* projection (the `Display` rendering) is the lossy, Go-flavored
//! form used in diagnostics and by the code generator.
//!
//! The numeric family is deliberately loose: `int`, `float`, and `number`
//! all unify with one another. Records are nominal constants; two record
//! types with identical fields are still distinct.

use std::collections::BTreeSet;
use std::fmt;

/// Name of the integer type constant.
pub const INT: &str = "int";
/// Name of the float type constant.
pub const FLOAT: &str = "float";
/// Name of the numeric-family supertype constant.
pub const NUMBER: &str = "number";
/// Name of the string type constant.
pub const STRING: &str = "string";
/// Name of the boolean type constant.
pub const BOOL: &str = "bool";
/// Name of the opaque type given to external (host-language) calls.
pub const OPAQUE: &str = "any";

/// A type in the inference engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// Unification variable.
    Var(u32),
    /// Nominal constant (`int`, `string`, a record name, ...).
    Con(String),
    /// Function type with parameter and result types.
    Fun(Vec<Type>, Box<Type>),
    /// Homogeneous array type.
    Arr(Box<Type>),
    /// Map type with key and value types.
    Map(Box<Type>, Box<Type>),
}

impl Type {
    /// Creates a nominal constant type.
    #[must_use]
    pub fn con(name: impl Into<String>) -> Self {
        Self::Con(name.into())
    }

    /// The `int` type.
    #[must_use]
    pub fn int() -> Self {
        Self::con(INT)
    }

    /// The `float` type.
    #[must_use]
    pub fn float() -> Self {
        Self::con(FLOAT)
    }

    /// The `number` family type.
    #[must_use]
    pub fn number() -> Self {
        Self::con(NUMBER)
    }

    /// The `string` type.
    #[must_use]
    pub fn string() -> Self {
        Self::con(STRING)
    }

    /// The `bool` type.
    #[must_use]
    pub fn boolean() -> Self {
        Self::con(BOOL)
    }

    /// The opaque type used for external host-language calls.
    #[must_use]
    pub fn opaque() -> Self {
        Self::con(OPAQUE)
    }

    /// Creates a function type.
    #[must_use]
    pub fn fun(params: Vec<Type>, result: Type) -> Self {
        Self::Fun(params, Box::new(result))
    }

    /// Creates an array type.
    #[must_use]
    pub fn arr(elem: Type) -> Self {
        Self::Arr(Box::new(elem))
    }

    /// Creates a map type.
    #[must_use]
    pub fn map(key: Type, value: Type) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Returns true if this is a member of the numeric family.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Con(name) if name == INT || name == FLOAT || name == NUMBER)
    }

    /// Returns true if this is the opaque external type.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Con(name) if name == OPAQUE)
    }

    /// Collects the free type variables of this type into `out`.
    pub fn free_vars_into(&self, out: &mut BTreeSet<u32>) {
        match self {
            Self::Var(id) => {
                out.insert(*id);
            }
            Self::Con(_) => {}
            Self::Fun(params, result) => {
                for p in params {
                    p.free_vars_into(out);
                }
                result.free_vars_into(out);
            }
            Self::Arr(elem) => elem.free_vars_into(out),
            Self::Map(key, value) => {
                key.free_vars_into(out);
                value.free_vars_into(out);
            }
        }
    }

    /// Returns the free type variables of this type.
    #[must_use]
    pub fn free_vars(&self) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        self.free_vars_into(&mut out);
        out
    }

    /// Returns true if the given variable occurs anywhere in this type.
    #[must_use]
    pub fn contains_var(&self, id: u32) -> bool {
        match self {
            Self::Var(v) => *v == id,
            Self::Con(_) => false,
            Self::Fun(params, result) => {
                params.iter().any(|p| p.contains_var(id)) || result.contains_var(id)
            }
            Self::Arr(elem) => elem.contains_var(id),
            Self::Map(key, value) => key.contains_var(id) || value.contains_var(id),
        }
    }
}

impl fmt::Display for Type {
    /// The public (Go-flavored) projection of a type.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(id) => write!(f, "t{id}"),
            Self::Con(name) => write!(f, "{name}"),
            Self::Fun(params, result) => {
                write!(f, "func(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") {result}")
            }
            Self::Arr(elem) => write!(f, "[]{elem}"),
            Self::Map(key, value) => write!(f, "map[{key}]{value}"),
        }
    }
}

/// A type scheme: a type quantified over zero or more variables.
///
/// Introduced by generalization at `def`/`defn`, consumed by
/// instantiation at every use site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scheme {
    /// Quantified variable ids.
    pub vars: Vec<u32>,
    /// The quantified type.
    pub ty: Type,
}

impl Scheme {
    /// Creates a scheme quantified over the given variables.
    #[must_use]
    pub fn new(vars: Vec<u32>, ty: Type) -> Self {
        Self { vars, ty }
    }

    /// Creates a monomorphic scheme (no quantified variables).
    #[must_use]
    pub fn mono(ty: Type) -> Self {
        Self {
            vars: Vec::new(),
            ty,
        }
    }

    /// Returns true if this scheme quantifies at least one variable.
    #[must_use]
    pub fn is_polymorphic(&self) -> bool {
        !self.vars.is_empty()
    }

    /// Free variables of the scheme: free in the type, minus quantified.
    #[must_use]
    pub fn free_vars(&self) -> BTreeSet<u32> {
        let mut out = self.ty.free_vars();
        for v in &self.vars {
            out.remove(v);
        }
        out
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.vars.is_empty() {
            return write!(f, "{}", self.ty);
        }
        write!(f, "forall")?;
        for v in &self.vars {
            write!(f, " t{v}")?;
        }
        write!(f, ". {}", self.ty)
    }
}
