//! Vex - an s-expression language compiled to Go
//!
//! This crate re-exports all layers of the Vex compiler for convenient
//! access. For detailed documentation, see the individual crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: vex_runtime    — Pipeline driver, test runner, CLI
//! Layer 3: vex_resolver   — Module discovery, exports, build units
//!          vex_codegen    — Go emission, module detection, go.mod
//! Layer 2: vex_analyzer   — Scoping, records, HM type inference
//! Layer 1: vex_language   — Lexer, parser, macro expander
//! Layer 0: vex_foundation — Values, types, diagnostics, errors
//! ```

pub use vex_analyzer as analyzer;
pub use vex_codegen as codegen;
pub use vex_foundation as foundation;
pub use vex_language as language;
pub use vex_resolver as resolver;
pub use vex_runtime as runtime;
