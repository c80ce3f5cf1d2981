//! Semantic analysis for Vex: scoping, records, and type inference.
//!
//! This crate provides:
//! - [`SymbolTable`] - Lexically scoped symbols
//! - [`RecordDecl`] and [`RecordTable`] - Nominal record declarations
//! - [`Subst`], [`unify`], [`generalize`], [`instantiate`] - The
//!   Hindley-Milner machinery with the numeric family baked in
//! - [`Analyzer`] - The tree walker producing diagnostics and schemes
//!
//! # Example
//!
//! ```
//! use vex_analyzer::Analyzer;
//! use vex_language::{MacroExpander, parse};
//!
//! let forms = parse("(defn add [x: int y: int] -> int (+ x y))").unwrap();
//! let expanded = MacroExpander::new().expand_all(&forms).unwrap();
//! let result = Analyzer::new("main.vx").analyze(&expanded);
//! assert!(!result.has_errors());
//! assert!(result.schemes.contains_key("add"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::result_large_err)]
#![allow(clippy::missing_errors_doc)]

pub mod analyzer;
pub mod builtins;
pub mod infer;
pub mod record;
pub mod symbol;

pub use analyzer::{AnalysisResult, Analyzer, Mode, PackageContext};
pub use builtins::seed_builtins;
pub use infer::{Subst, UnifyError, UnifyErrorKind, VarGen, generalize, instantiate, unify};
pub use record::{RecordDecl, RecordTable};
pub use symbol::{Symbol, SymbolTable, is_kebab_case, kebab_case_suggestion};
