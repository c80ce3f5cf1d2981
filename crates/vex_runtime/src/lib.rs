//! Pipeline driver, test runner, and CLI support for Vex.
//!
//! This crate provides:
//! - [`Transpiler`] and [`TranspilerConfig`] - The resolve → parse →
//!   expand → analyze → generate pipeline
//! - [`TestRunner`] and [`TestRunnerConfig`] - Per-file test
//!   compilation with deadline-bounded execution
//! - [`CoverageReport`] - Coverage JSON aggregation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::result_large_err)]
#![allow(clippy::missing_errors_doc)]

pub mod coverage;
pub mod runner;
pub mod transpiler;

pub use coverage::{CoverageReport, OverallCoverage, PackageCoverage, RunSummary, rfc3339_now};
pub use runner::{
    SKIP_DIRS, TestOutcome, TestRunner, TestRunnerConfig, TestStatus, TestSummary, go_available,
};
pub use transpiler::{
    STDLIB_ENV, Transpiled, TranspileError, Transpiler, TranspilerConfig, write_go_project,
};

use std::time::{SystemTime, UNIX_EPOCH};

/// The module name stamped into generated `go.mod` files.
#[must_use]
pub fn generated_module_name() -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("vex-project-{stamp}")
}
