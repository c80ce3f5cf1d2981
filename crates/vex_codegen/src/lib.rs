//! Go code generation for the Vex compiler.
//!
//! This crate provides:
//! - [`GoGenerator`] - Tree-walking emitter producing `package main`
//! - [`go_type`] - The Go projection of internal types
//! - [`is_third_party`] and [`render_go_mod`] - Module detection and
//!   `go.mod` rendering for the host toolchain

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod generator;
pub mod gomod;
pub mod names;

pub use generator::{GoGenerator, go_type};
pub use gomod::{LATEST, is_third_party, render_go_mod};
pub use names::{go_field_name, go_ident};
