//! Infrastructure error types for the Vex compiler.
//!
//! Uses `thiserror` for ergonomic error definition. These errors cover
//! I/O, resolution, and toolchain failures; *source-level* problems are
//! reported as [`crate::Diagnostic`] records instead.

use std::fmt;

use thiserror::Error;

/// Convenience result type for Vex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Vex compiler operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>, line: u32, column: u32, context: String) -> Self {
        Self::new(ErrorKind::Parse {
            message: message.into(),
            line,
            column,
            context,
        })
    }

    /// Creates a macro expansion error.
    #[must_use]
    pub fn macro_expansion(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::MacroExpansion {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates a package resolution error.
    #[must_use]
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolution(message.into()))
    }

    /// Creates a toolchain invocation error.
    #[must_use]
    pub fn toolchain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Toolchain(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(err))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Source could not be parsed.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// Macro expansion failed.
    #[error("macro expansion error at {line}:{column}: {message}")]
    MacroExpansion {
        /// Description of the expansion failure.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// Macro expansion did not reach a fixed point.
    #[error("macro expansion did not settle after {passes} passes")]
    MacroRecursion {
        /// The configured pass limit.
        passes: usize,
    },

    /// Package resolution failed.
    #[error("package resolution: {0}")]
    Resolution(String),

    /// Import graph contains a cycle.
    #[error("package cycle detected: {cycle}")]
    PackageCycle {
        /// Human-readable cycle description (`a -> b -> a`).
        cycle: String,
    },

    /// A package imports itself.
    #[error("package imports itself: {path}")]
    SelfImport {
        /// The offending import path.
        path: String,
    },

    /// Semantic analysis produced errors (accumulated in the sink).
    #[error("analysis failed with {errors} error(s)")]
    AnalysisFailed {
        /// Number of error-severity diagnostics.
        errors: usize,
    },

    /// The host Go toolchain failed.
    #[error("go toolchain: {0}")]
    Toolchain(String),

    /// A subprocess exceeded its deadline.
    #[error("timed out after {seconds}s")]
    Timeout {
        /// The deadline that expired.
        seconds: u64,
    },

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file or package name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<u32>,
    /// Column number in source.
    pub column: Option<u32>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub const fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_parse() {
        let err = Error::parse("unexpected ')'", 3, 7, "(foo))".to_string());
        assert!(matches!(err.kind, ErrorKind::Parse { .. }));
        let msg = format!("{err}");
        assert!(msg.contains("3:7"));
        assert!(msg.contains("unexpected ')'"));
    }

    #[test]
    fn error_with_context() {
        let err = Error::resolution("missing package")
            .with_context(ErrorContext::new().with_source("main.vx").with_position(10, 5));

        let ctx = err.context.unwrap();
        assert_eq!(ctx.source, Some("main.vx".to_string()));
        assert_eq!(ctx.line, Some(10));
        assert_eq!(ctx.column, Some(5));
    }

    #[test]
    fn error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err.kind, ErrorKind::Io(_)));
    }

    #[test]
    fn macro_recursion_display() {
        let err = Error::new(ErrorKind::MacroRecursion { passes: 8 });
        assert!(format!("{err}").contains("8 passes"));
    }

    #[test]
    fn context_display() {
        let ctx = ErrorContext::new().with_source("lib.vx").with_position(2, 4);
        assert_eq!(format!("{ctx}"), "at lib.vx:2:4");
    }
}
