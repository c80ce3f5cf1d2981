//! Symbol table with lexical scopes.
//!
//! Scopes form a stack: `fn` and `let` push, scope exit pops. Within a
//! single scope a name maps to at most one symbol; nested scopes shadow
//! outer ones but never mutate them.

use vex_foundation::{Type, Value};

/// A named symbol with its declared type and semantic value.
#[derive(Clone, Debug)]
pub struct Symbol {
    /// The symbol's name.
    pub name: String,
    /// The internal type attached by the analyzer.
    pub ty: Type,
    /// What kind of thing the symbol is bound to.
    pub value: Value,
    /// Scope depth at which the symbol was defined (0 = global).
    pub scope_level: usize,
}

/// Stack of lexical scopes.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Vec<Symbol>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Creates a table with the global scope open.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![Vec::new()],
        }
    }

    /// Current scope depth (0 = global).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Opens a new nested scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Closes the innermost scope, reverting its definitions.
    ///
    /// The global scope is never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Defines a symbol in the current scope.
    ///
    /// Returns false if the name is already defined *in this scope*
    /// (shadowing an outer scope is fine).
    pub fn define(&mut self, name: impl Into<String>, ty: Type, value: Value) -> bool {
        let name = name.into();
        let level = self.depth();
        let scope = self.scopes.last_mut().expect("scope stack never empty");
        if scope.iter().any(|s| s.name == name) {
            return false;
        }
        scope.push(Symbol {
            name,
            ty,
            value,
            scope_level: level,
        });
        true
    }

    /// Looks a name up, innermost scope first.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.iter().find(|s| s.name == name))
    }

    /// Looks a name up in the current scope only.
    #[must_use]
    pub fn lookup_current(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .last()
            .and_then(|scope| scope.iter().find(|s| s.name == name))
    }
}

/// Checks the kebab-case naming rule for user symbols and fields.
///
/// Lowercase words separated by single hyphens, optionally ending in
/// `?` or `!`. Underscores and uppercase letters are rejected.
#[must_use]
pub fn is_kebab_case(name: &str) -> bool {
    let trimmed = name.strip_suffix(['?', '!']).unwrap_or(name);
    if trimmed.is_empty() {
        return false;
    }
    if !trimmed.starts_with(|c: char| c.is_ascii_lowercase()) {
        return false;
    }
    if trimmed.ends_with('-') || trimmed.contains("--") {
        return false;
    }
    trimmed
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Suggests a kebab-case spelling for a rejected name.
#[must_use]
pub fn kebab_case_suggestion(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if c == '_' {
            out.push('-');
        } else if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
