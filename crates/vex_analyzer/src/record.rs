//! Nominal record declarations.
//!
//! Records are declared once with an ordered field list and checked
//! nominally: two records with identical fields are still distinct
//! types. Field names follow the kebab-case rule and must be unique
//! within a declaration.

use std::collections::HashMap;

use vex_foundation::Type;
use vex_language::Span;

/// A declared record type.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordDecl {
    /// The nominal type name.
    pub name: String,
    /// Ordered (field-name, field-type) pairs, declaration order.
    pub fields: Vec<(String, Type)>,
    /// Where the record was declared.
    pub span: Span,
}

impl RecordDecl {
    /// Creates an empty record declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            span,
        }
    }

    /// Adds a field; returns false if the name is already declared.
    pub fn add_field(&mut self, name: impl Into<String>, ty: Type) -> bool {
        let name = name.into();
        if self.has_field(&name) {
            return false;
        }
        self.fields.push((name, ty));
        true
    }

    /// Returns true if the record declares the given field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(f, _)| f == name)
    }

    /// Returns the declared type of a field.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<&Type> {
        self.fields.iter().find(|(f, _)| f == name).map(|(_, t)| t)
    }

    /// Field names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(f, _)| f.as_str()).collect()
    }

    /// The nominal type of instances of this record.
    #[must_use]
    pub fn instance_type(&self) -> Type {
        Type::con(self.name.clone())
    }
}

/// All records declared in a compilation unit.
#[derive(Clone, Debug, Default)]
pub struct RecordTable {
    records: HashMap<String, RecordDecl>,
    /// Declaration order, for deterministic code generation.
    order: Vec<String>,
}

impl RecordTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a record; returns false if the name is already taken.
    pub fn declare(&mut self, decl: RecordDecl) -> bool {
        if self.records.contains_key(&decl.name) {
            return false;
        }
        self.order.push(decl.name.clone());
        self.records.insert(decl.name.clone(), decl);
        true
    }

    /// Looks up a record by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RecordDecl> {
        self.records.get(name)
    }

    /// Returns true if the name is a declared record.
    #[must_use]
    pub fn is_record(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Declared records in declaration order.
    #[must_use]
    pub fn in_order(&self) -> Vec<&RecordDecl> {
        self.order
            .iter()
            .filter_map(|name| self.records.get(name))
            .collect()
    }

    /// Number of declared records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
