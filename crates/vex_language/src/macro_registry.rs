//! Registry of macro templates.
//!
//! Stores templates by name. Reserved special-form heads can never be
//! registered through the user-facing path; the bootstrap set is
//! installed through an internal channel at construction time.

use vex_foundation::{Error, ErrorKind, Result};

use crate::macro_def::MacroDef;
use std::collections::HashMap;

/// Heads with built-in semantics that cannot be redefined as macros.
pub const RESERVED_HEADS: &[&str] = &[
    "if", "def", "fn", "let", "do", "when", "unless", "import",
];

/// Registry for storing and looking up macro templates.
#[derive(Clone, Debug, Default)]
pub struct MacroRegistry {
    /// Map from name to template.
    macros: HashMap<String, MacroDef>,
}

impl MacroRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the bootstrap templates pre-registered.
    #[must_use]
    pub fn with_bootstrap() -> Self {
        let mut registry = Self::new();
        crate::bootstrap_macros::register_bootstrap_macros(&mut registry);
        registry
    }

    /// Registers a user macro template.
    ///
    /// Fails if the name is a reserved special-form head.
    pub fn register(&mut self, def: MacroDef) -> Result<()> {
        if RESERVED_HEADS.contains(&def.name.as_str()) {
            return Err(Error::new(ErrorKind::MacroExpansion {
                message: format!("cannot redefine reserved form '{}' as a macro", def.name),
                line: def.span.line,
                column: def.span.column,
            }));
        }
        self.macros.insert(def.name.clone(), def);
        Ok(())
    }

    /// Registers a template without the reserved-head check.
    ///
    /// Only the bootstrap set goes through this path.
    pub(crate) fn register_unchecked(&mut self, def: MacroDef) {
        self.macros.insert(def.name.clone(), def);
    }

    /// Looks up a macro by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    /// Returns true if the name refers to a registered macro.
    #[must_use]
    pub fn is_macro(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Returns all registered macro names.
    #[must_use]
    pub fn macro_names(&self) -> Vec<&str> {
        self.macros.keys().map(String::as_str).collect()
    }

    /// Number of registered macros.
    #[must_use]
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    /// Returns true if no macros are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Removes all registered macros.
    pub fn clear(&mut self) {
        self.macros.clear();
    }
}
