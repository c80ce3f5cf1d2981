//! Macro expansion engine.
//!
//! The expander rewrites `(name arg …)` occurrences into registered
//! template bodies, pass by pass, until a fixed point is reached or the
//! pass limit trips. Within a template body, `~param` splices the raw
//! argument tree for that parameter; a rest parameter splices all of its
//! collected forms into the surrounding list.
//!
//! # Expansion algorithm
//!
//! 1. `(macro name [params…] body…)` registers the template and is
//!    dropped from the output.
//! 2. Each pass walks every form; any list whose head names a registered
//!    macro is replaced by its substituted body.
//! 3. Passes repeat until a pass makes no substitution. More than
//!    [`MAX_PASSES`] passes means runaway recursion.
//!
//! Expansion is splicing without alpha-renaming: templates that
//! introduce bindings must use parameter names that cannot collide.

use std::collections::HashMap;

use vex_foundation::{Error, ErrorKind, Result};

use crate::ast::Ast;
use crate::macro_def::{MacroDef, MacroParam};
use crate::macro_registry::MacroRegistry;
use crate::span::Span;

/// Maximum number of expansion passes before giving up.
pub const MAX_PASSES: usize = 8;

/// The macro expansion engine.
pub struct MacroExpander {
    /// Registered templates (bootstrap plus user macros).
    registry: MacroRegistry,
}

impl Default for MacroExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroExpander {
    /// Creates an expander with the bootstrap templates registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: MacroRegistry::with_bootstrap(),
        }
    }

    /// Creates an expander over an existing registry.
    #[must_use]
    pub fn with_registry(registry: MacroRegistry) -> Self {
        Self { registry }
    }

    /// Registers a macro template programmatically.
    pub fn define(&mut self, def: MacroDef) -> Result<()> {
        self.registry.register(def)
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    /// Expands all macros in the given top-level forms.
    ///
    /// `(macro …)` forms are consumed: they register their template and
    /// do not appear in the output.
    pub fn expand_all(&mut self, forms: &[Ast]) -> Result<Vec<Ast>> {
        let mut current: Vec<Ast> = forms.to_vec();

        for _pass in 0..MAX_PASSES {
            let mut changed = false;
            let mut next = Vec::with_capacity(current.len());

            for form in &current {
                if Self::is_macro_definition(form) {
                    self.process_macro_definition(form)?;
                    changed = true;
                    continue;
                }
                next.push(self.expand_form(form, &mut changed)?);
            }

            current = next;
            if !changed {
                return Ok(current);
            }
        }

        Err(Error::new(ErrorKind::MacroRecursion { passes: MAX_PASSES }))
    }

    /// Checks if a form is a `(macro …)` definition.
    fn is_macro_definition(form: &Ast) -> bool {
        form.head_symbol() == Some("macro")
    }

    /// Registers a `(macro name [params…] body…)` form.
    fn process_macro_definition(&mut self, form: &Ast) -> Result<()> {
        let span = form.span();
        let elements = form.as_list().unwrap_or_default();
        if elements.len() < 4 {
            return Err(template_error(
                "macro requires a name, a parameter list, and a body",
                span,
            ));
        }

        let name = elements[1]
            .as_symbol()
            .ok_or_else(|| {
                template_error(
                    &format!("macro name must be a symbol, got {}", elements[1].type_name()),
                    elements[1].span(),
                )
            })?
            .to_string();

        let params = Self::parse_params(&elements[2])?;
        let body = elements[3..].to_vec();

        self.registry.register(MacroDef::new(name, params, body, span))
    }

    /// Parses the parameter array of a macro definition.
    fn parse_params(ast: &Ast) -> Result<Vec<MacroParam>> {
        let elements = ast.as_array().ok_or_else(|| {
            template_error(
                &format!("macro parameters must be an array, got {}", ast.type_name()),
                ast.span(),
            )
        })?;

        elements
            .iter()
            .map(|elem| {
                elem.as_symbol()
                    .map(|name| MacroParam::Normal(name.to_string()))
                    .ok_or_else(|| {
                        template_error(
                            &format!("macro parameter must be a symbol, got {}", elem.type_name()),
                            elem.span(),
                        )
                    })
            })
            .collect()
    }

    /// Expands macros in a single form, flagging whether anything changed.
    fn expand_form(&self, ast: &Ast, changed: &mut bool) -> Result<Ast> {
        match ast {
            Ast::List(elements, span) if !elements.is_empty() => {
                if let Some(head) = elements[0].as_symbol() {
                    if let Some(def) = self.registry.get(head) {
                        let def = def.clone();
                        *changed = true;
                        return self.apply_macro(&def, &elements[1..], *span);
                    }
                }
                let expanded: Result<Vec<_>> = elements
                    .iter()
                    .map(|e| self.expand_form(e, changed))
                    .collect();
                Ok(Ast::List(expanded?, *span))
            }
            Ast::Array(elements, span) => {
                let expanded: Result<Vec<_>> = elements
                    .iter()
                    .map(|e| self.expand_form(e, changed))
                    .collect();
                Ok(Ast::Array(expanded?, *span))
            }
            // Splices outside a template body pass through unchanged
            _ => Ok(ast.clone()),
        }
    }

    /// Applies a macro to its arguments.
    fn apply_macro(&self, def: &MacroDef, args: &[Ast], span: Span) -> Result<Ast> {
        if !def.accepts_arity(args.len()) {
            let expected = if def.variadic {
                format!("at least {}", def.min_arity())
            } else {
                def.min_arity().to_string()
            };
            return Err(Error::new(ErrorKind::MacroExpansion {
                message: format!(
                    "macro '{}' expects {} argument(s), got {}",
                    def.name,
                    expected,
                    args.len()
                ),
                line: span.line,
                column: span.column,
            }));
        }

        let bindings = Self::bind_args(def, args);
        let body: Result<Vec<_>> = def
            .body
            .iter()
            .map(|form| Self::substitute(form, &bindings))
            .collect();
        let mut body = body?;

        // Flatten top-level rest splices in a single-form body
        if body.len() == 1 {
            Ok(body.remove(0))
        } else {
            let mut do_forms = vec![Ast::Symbol("do".to_string(), span)];
            do_forms.extend(body);
            Ok(Ast::List(do_forms, span))
        }
    }

    /// Builds parameter bindings from macro arguments.
    fn bind_args(def: &MacroDef, args: &[Ast]) -> HashMap<String, MacroArg> {
        let mut bindings = HashMap::new();
        let mut index = 0;

        for param in &def.params {
            match param {
                MacroParam::Normal(name) => {
                    if index < args.len() {
                        bindings.insert(name.clone(), MacroArg::Single(args[index].clone()));
                        index += 1;
                    }
                }
                MacroParam::Rest(name) => {
                    bindings.insert(name.clone(), MacroArg::Rest(args[index..].to_vec()));
                    break;
                }
            }
        }

        bindings
    }

    /// Substitutes `~param` splices in a template form.
    fn substitute(ast: &Ast, bindings: &HashMap<String, MacroArg>) -> Result<Ast> {
        match ast {
            Ast::Splice(inner, span) => match inner.as_ref() {
                Ast::Symbol(name, _) => match bindings.get(name) {
                    Some(MacroArg::Single(arg)) => Ok(arg.clone()),
                    Some(MacroArg::Rest(_)) => Err(template_error(
                        &format!("rest parameter '~{name}' must be spliced inside a list"),
                        *span,
                    )),
                    None => Err(template_error(
                        &format!("splice of unknown parameter '~{name}'"),
                        *span,
                    )),
                },
                other => Err(template_error(
                    &format!("'~' must precede a parameter name, got {}", other.type_name()),
                    *span,
                )),
            },
            Ast::List(elements, span) => Ok(Ast::List(
                Self::substitute_elements(elements, bindings)?,
                *span,
            )),
            Ast::Array(elements, span) => Ok(Ast::Array(
                Self::substitute_elements(elements, bindings)?,
                *span,
            )),
            _ => Ok(ast.clone()),
        }
    }

    /// Substitutes within a sequence, splicing rest parameters in place.
    fn substitute_elements(
        elements: &[Ast],
        bindings: &HashMap<String, MacroArg>,
    ) -> Result<Vec<Ast>> {
        let mut result = Vec::with_capacity(elements.len());

        for elem in elements {
            if let Ast::Splice(inner, _) = elem {
                if let Some(name) = inner.as_symbol() {
                    if let Some(MacroArg::Rest(forms)) = bindings.get(name) {
                        result.extend(forms.iter().cloned());
                        continue;
                    }
                }
            }
            result.push(Self::substitute(elem, bindings)?);
        }

        Ok(result)
    }
}

/// An argument bound to a macro parameter.
#[derive(Clone, Debug)]
enum MacroArg {
    /// A single argument tree.
    Single(Ast),
    /// Remaining arguments collected by a rest parameter.
    Rest(Vec<Ast>),
}

/// Creates a template error at the given span.
fn template_error(message: &str, span: Span) -> Error {
    Error::macro_expansion(message, span.line, span.column)
}
