//! Semantic value union attached to analyzed symbols.
//!
//! The analyzer does not evaluate Vex programs, but it tracks *what kind
//! of thing* every binding is: a literal, a function, a record instance,
//! a macro, a field accessor, or raw expression text carried through to
//! code generation. Values are immutable and cheaply cloneable; composite
//! values use structural sharing.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::collections::{VxMap, VxVec};
use crate::types::Type;

/// A semantic value.
#[derive(Clone, Debug)]
pub enum Value {
    /// String literal.
    String(Arc<str>),
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Record instance with its nominal type name.
    Record(RecordValue),
    /// Function value (a `fn` form or builtin).
    Function(FunctionValue),
    /// Array of values.
    Array(VxVec<Value>),
    /// Map of values.
    Map(VxMap<Value, Value>),
    /// A registered macro, by name.
    Macro(Arc<str>),
    /// A record field accessor (`(User :name)`).
    FieldAccessor {
        /// The record type name.
        record: Arc<str>,
        /// The field being accessed.
        field: Arc<str>,
    },
    /// Raw expression text carried through to the code generator.
    RawText(Arc<str>),
}

/// A record instance value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordValue {
    /// The nominal record type name.
    pub name: Arc<str>,
    /// Field values by field name.
    pub fields: VxMap<Arc<str>, Value>,
}

/// A function value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionValue {
    /// Function name, or the name it was bound to.
    pub name: Arc<str>,
    /// Number of declared parameters.
    pub arity: usize,
}

impl Value {
    /// Creates a string value.
    #[must_use]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Creates a raw-text value.
    #[must_use]
    pub fn raw(s: impl Into<Arc<str>>) -> Self {
        Self::RawText(s.into())
    }

    /// Creates a macro value.
    #[must_use]
    pub fn macro_ref(name: impl Into<Arc<str>>) -> Self {
        Self::Macro(name.into())
    }

    /// Creates a function value.
    #[must_use]
    pub fn function(name: impl Into<Arc<str>>, arity: usize) -> Self {
        Self::Function(FunctionValue {
            name: name.into(),
            arity,
        })
    }

    /// The internal type of this value, as far as the value alone can tell.
    ///
    /// Composite values with unknown element types report element type
    /// `any`; the analyzer refines these through unification.
    #[must_use]
    pub fn value_type(&self) -> Type {
        match self {
            Self::String(_) => Type::string(),
            Self::Bool(_) => Type::boolean(),
            Self::Int(_) => Type::int(),
            Self::Float(_) => Type::float(),
            Self::Record(record) => Type::con(record.name.as_ref()),
            Self::Function(_) | Self::Macro(_) | Self::FieldAccessor { .. } | Self::RawText(_) => {
                Type::opaque()
            }
            Self::Array(_) => Type::arr(Type::opaque()),
            Self::Map(_) => Type::map(Type::opaque(), Type::opaque()),
        }
    }

    /// A human-readable tag for this value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Record(_) => "record",
            Self::Function(_) => "function",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Macro(_) => "macro",
            Self::FieldAccessor { .. } => "field-accessor",
            Self::RawText(_) => "raw-text",
        }
    }

    /// Returns true if this is a literal (string, bool, int, float).
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::String(_) | Self::Bool(_) | Self::Int(_) | Self::Float(_)
        )
    }

    /// Returns the string content, or None for other variants.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::RawText(s) => Some(s),
            _ => None,
        }
    }
}

// Float values compare and hash by bit pattern so Value can be a map key.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Macro(a), Self::Macro(b)) => a == b,
            (
                Self::FieldAccessor {
                    record: ra,
                    field: fa,
                },
                Self::FieldAccessor {
                    record: rb,
                    field: fb,
                },
            ) => ra == rb && fa == fb,
            (Self::RawText(a), Self::RawText(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::String(s) | Self::Macro(s) | Self::RawText(s) => s.hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::Record(r) => r.hash(state),
            Self::Function(f) => f.hash(state),
            Self::Array(items) => items.hash(state),
            Self::Map(entries) => entries.hash(state),
            Self::FieldAccessor { record, field } => {
                record.hash(state);
                field.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Record(r) => write!(f, "{}{{..}}", r.name),
            Self::Function(func) => write!(f, "fn {}/{}", func.name, func.arity),
            Self::Array(items) => write!(f, "[{} items]", items.len()),
            Self::Map(entries) => write!(f, "{{{} entries}}", entries.len()),
            Self::Macro(name) => write!(f, "macro {name}"),
            Self::FieldAccessor { record, field } => write!(f, "{record}:{field}"),
            Self::RawText(s) => write!(f, "{s}"),
        }
    }
}
