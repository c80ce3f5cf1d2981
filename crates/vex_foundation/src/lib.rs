//! Core types shared by every phase of the Vex compiler.
//!
//! This crate provides:
//! - [`Value`] - The semantic value union attached to analyzed symbols
//! - [`Type`] and [`Scheme`] - Hindley-Milner type descriptors
//! - [`Diagnostic`] and [`DiagnosticSink`] - Coded, positioned diagnostics
//! - [`Error`] and [`ErrorKind`] - Infrastructure errors (I/O, toolchain)
//! - Persistent collections used for cheaply cloneable values

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod collections;
pub mod diagnostics;
pub mod error;
pub mod types;
pub mod value;

pub use collections::{VxMap, VxVec};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use types::{Scheme, Type};
pub use value::Value;
