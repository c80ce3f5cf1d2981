//! The pipeline driver.
//!
//! `Transpiler` wires the phases together: resolve → parse → expand →
//! analyze → generate. Source-level problems come back as a
//! [`DiagnosticSink`]; infrastructure problems as [`Error`].

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;

use vex_analyzer::Analyzer;
use vex_codegen::{GoGenerator, render_go_mod};
use vex_foundation::{Diagnostic, DiagnosticCode, DiagnosticSink, Error, ErrorKind, Result};
use vex_language::{MacroExpander, parse_with_recovery};
use vex_resolver::Resolver;

/// Environment variable overriding the stdlib lookup root.
pub const STDLIB_ENV: &str = "VEX_STDLIB_PATH";

/// Configuration for one transpilation.
#[derive(Clone, Debug)]
pub struct TranspilerConfig {
    /// The entry `.vx` file.
    pub entry: PathBuf,
    /// Output path for the generated Go (stdout when None).
    pub output: Option<PathBuf>,
    /// Print phase progress to stderr.
    pub verbose: bool,
    /// Stdlib root, usually from `VEX_STDLIB_PATH`.
    pub stdlib_path: Option<PathBuf>,
}

impl TranspilerConfig {
    /// Creates a config for the given entry file, reading the stdlib
    /// override from the environment.
    #[must_use]
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            output: None,
            verbose: false,
            stdlib_path: env::var_os(STDLIB_ENV).map(PathBuf::from),
        }
    }

    /// Sets the output path.
    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Enables verbose progress output.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// The product of a successful transpilation.
#[derive(Debug)]
pub struct Transpiled {
    /// Generated Go source for `package main`.
    pub go_source: String,
    /// Detected third-party modules (path → version).
    pub modules: BTreeMap<String, String>,
    /// Warnings that did not block compilation.
    pub warnings: DiagnosticSink,
}

impl Transpiled {
    /// Renders `go.mod` content for this program.
    #[must_use]
    pub fn go_mod(&self, module_name: &str) -> String {
        render_go_mod(module_name, &self.modules)
    }
}

/// Why a transpilation failed.
#[derive(Debug, ThisError)]
pub enum TranspileError {
    /// I/O, package resolution, or other infrastructure failure.
    #[error("{0}")]
    Infrastructure(#[from] Error),
    /// The source had errors; the sink holds all of them, sorted.
    #[error("{}", .0.format())]
    Diagnostics(DiagnosticSink),
}

/// The compiler pipeline for one compilation unit.
pub struct Transpiler {
    config: TranspilerConfig,
}

impl Transpiler {
    /// Creates a transpiler with the given configuration.
    #[must_use]
    pub fn new(config: TranspilerConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &TranspilerConfig {
        &self.config
    }

    /// Runs the full pipeline on the configured entry file.
    pub fn transpile(&self) -> std::result::Result<Transpiled, TranspileError> {
        let source = fs::read_to_string(&self.config.entry).map_err(|e| {
            TranspileError::Infrastructure(Error::resolution(format!(
                "cannot read {}: {e}",
                self.config.entry.display()
            )))
        })?;
        self.transpile_source(&source)
    }

    /// Runs the pipeline on in-memory source anchored at the configured
    /// entry path (used by the test runner to prepend imports).
    pub fn transpile_source(&self, source: &str) -> std::result::Result<Transpiled, TranspileError> {
        let file = self.config.entry.display().to_string();
        self.trace("resolving packages");

        let unit = Resolver::new()
            .with_stdlib_root(self.config.stdlib_path.clone())
            .resolve_source(&self.config.entry, source)
            .map_err(|err| self.as_diagnostics_or(err, &file))?;

        self.trace("parsing combined unit");
        let mut sink = DiagnosticSink::new();
        let forms = parse_with_recovery(&unit.combined_source, &file, &mut sink);
        if sink.has_errors() {
            return Err(TranspileError::Diagnostics(sink));
        }

        self.trace("expanding macros");
        let expanded = MacroExpander::new()
            .expand_all(&forms)
            .map_err(|err| self.as_diagnostics_or(err, &file))?;

        self.trace("analyzing");
        let analysis = Analyzer::new(&file)
            .with_packages(unit.packages.clone())
            .analyze(&expanded);
        if analysis.has_errors() {
            return Err(TranspileError::Diagnostics(analysis.sink));
        }

        self.trace("generating Go");
        let mut generator = GoGenerator::new()
            .with_analysis(analysis.records, analysis.schemes)
            .with_ignored_imports(unit.ignored_imports);
        let go_source = generator.generate(&expanded);

        Ok(Transpiled {
            go_source,
            modules: generator.detected_modules().clone(),
            warnings: analysis.sink,
        })
    }

    /// Maps source-shaped infrastructure errors onto coded diagnostics;
    /// passes true infrastructure errors through.
    fn as_diagnostics_or(&self, err: Error, file: &str) -> TranspileError {
        let diagnostic = match &err.kind {
            ErrorKind::Parse {
                message,
                line,
                column,
                ..
            } => {
                let code = if message.starts_with("unterminated") {
                    DiagnosticCode::SynUnterminated
                } else {
                    DiagnosticCode::SynParse
                };
                Some(Diagnostic::error(code, file, *line, *column, message.clone()))
            }
            ErrorKind::MacroRecursion { passes } => Some(Diagnostic::error(
                DiagnosticCode::MacRecursion,
                file,
                1,
                1,
                format!("macro expansion did not settle after {passes} passes"),
            )),
            ErrorKind::MacroExpansion {
                message,
                line,
                column,
            } => {
                let code = if message.contains("reserved") {
                    DiagnosticCode::MacReserved
                } else {
                    DiagnosticCode::MacTemplate
                };
                Some(Diagnostic::error(code, file, *line, *column, message.clone()))
            }
            ErrorKind::PackageCycle { cycle } => Some(Diagnostic::error(
                DiagnosticCode::PkgCycle,
                file,
                1,
                1,
                format!("package cycle detected: {cycle}"),
            )),
            ErrorKind::SelfImport { path } => Some(Diagnostic::error(
                DiagnosticCode::PkgSelfImport,
                file,
                1,
                1,
                format!("package imports itself: {path}"),
            )),
            _ => None,
        };

        match diagnostic {
            Some(diag) => {
                let mut sink = DiagnosticSink::new();
                sink.report(diag);
                TranspileError::Diagnostics(sink)
            }
            None => TranspileError::Infrastructure(err),
        }
    }

    fn trace(&self, phase: &str) {
        if self.config.verbose {
            eprintln!("\x1b[2mvex: {phase}\x1b[0m");
        }
    }
}

/// Writes a generated Go project (main.go plus go.mod) into a directory.
pub fn write_go_project(dir: &Path, transpiled: &Transpiled, module_name: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join("main.go"), &transpiled.go_source)?;
    fs::write(dir.join("go.mod"), transpiled.go_mod(module_name))?;
    Ok(())
}
