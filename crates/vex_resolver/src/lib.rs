//! Package resolution for Vex: module discovery, exports, and the
//! combined compilation unit.
//!
//! This crate provides:
//! - [`find_module_root`] - Upward search for the `vex.pkg` marker
//! - [`Resolver`] - Discovers, memoizes, and orders local packages
//! - [`ResolvedUnit`] - The combined source plus per-package exports
//!   and schemes handed to the analyzer and code generator

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::result_large_err)]
#![allow(clippy::missing_errors_doc)]

pub mod module;
pub mod resolver;

pub use module::{MODULE_MARKER, find_module_root, is_local_package, read_module_name};
pub use resolver::{ResolvedUnit, Resolver, collect_imports};
