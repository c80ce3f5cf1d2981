//! Coded diagnostics with source positions.
//!
//! Every user-visible compile problem is a [`Diagnostic`]: a stable code,
//! a severity, a position, a message body, and an optional suggestion.
//! Diagnostics accumulate in a [`DiagnosticSink`] so a phase can keep
//! going and report everything it found at once.

use std::fmt;

/// Severity of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Blocks compilation.
    Error,
    /// Reported but never blocks compilation.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Stable diagnostic codes, grouped by family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DiagnosticCode {
    // Syntax (parser)
    SynParse,
    SynUnterminated,
    // Macro expansion
    MacRecursion,
    MacTemplate,
    MacReserved,
    // Symbol rules
    SymNaming,
    SymRedef,
    // Types
    TypEq,
    TypIfMismatch,
    TypCond,
    TypArg,
    TypUndef,
    TypArrayElem,
    TypMapKey,
    TypMapVal,
    // Arity
    AriArgs,
    // Records
    RecNominal,
    RecDecl,
    RecUnknownField,
    RecDupField,
    RecMissingField,
    // Packages
    PkgNotExported,
    PkgCycle,
    PkgSelfImport,
    // Test files
    TstNonDeftest,
}

impl DiagnosticCode {
    /// Returns the stable code string (e.g. `VEX-TYP-EQ`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SynParse => "VEX-SYN-PARSE",
            Self::SynUnterminated => "VEX-SYN-UNTERMINATED",
            Self::MacRecursion => "VEX-MAC-RECURSION",
            Self::MacTemplate => "VEX-MAC-TEMPLATE",
            Self::MacReserved => "VEX-MAC-RESERVED",
            Self::SymNaming => "VEX-SYM-NAMING",
            Self::SymRedef => "VEX-SYM-REDEF",
            Self::TypEq => "VEX-TYP-EQ",
            Self::TypIfMismatch => "VEX-TYP-IF-MISMATCH",
            Self::TypCond => "VEX-TYP-COND",
            Self::TypArg => "VEX-TYP-ARG",
            Self::TypUndef => "VEX-TYP-UNDEF",
            Self::TypArrayElem => "VEX-TYP-ARRAY-ELEM",
            Self::TypMapKey => "VEX-TYP-MAP-KEY",
            Self::TypMapVal => "VEX-TYP-MAP-VAL",
            Self::AriArgs => "VEX-ARI-ARGS",
            Self::RecNominal => "VEX-REC-NOMINAL",
            Self::RecDecl => "VEX-REC-DECL",
            Self::RecUnknownField => "VEX-REC-UNKNOWN-FIELD",
            Self::RecDupField => "VEX-REC-DUP-FIELD",
            Self::RecMissingField => "VEX-REC-MISSING-FIELD",
            Self::PkgNotExported => "VEX-PKG-NOT-EXPORTED",
            Self::PkgCycle => "VEX-PKG-CYCLE",
            Self::PkgSelfImport => "VEX-PKG-SELF-IMPORT",
            Self::TstNonDeftest => "VEX-TST-NON-DEFTEST",
        }
    }

    /// Returns the code family (`SYN`, `MAC`, `SYM`, `TYP`, `ARI`, `REC`, `PKG`, `TST`).
    #[must_use]
    pub fn family(self) -> &'static str {
        let code = self.as_str();
        // Codes are always "VEX-FAM-REST"
        &code[4..7]
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single positioned diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable code for this diagnostic.
    pub code: DiagnosticCode,
    /// Error or warning.
    pub severity: Severity,
    /// Source file the diagnostic points into.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// Rendered message body.
    pub message: String,
    /// Optional suggestion shown on the following line.
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    #[must_use]
    pub fn error(
        code: DiagnosticCode,
        file: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: Severity::Error,
            file: file.into(),
            line,
            column,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Creates a warning diagnostic.
    #[must_use]
    pub fn warning(
        code: DiagnosticCode,
        file: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, file, line, column, message)
        }
    }

    /// Attaches a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Renders as `file:line:col: severity: [CODE]: message` with the
    /// suggestion, if any, on the next line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}:{}:{}: {}: [{}]: {}",
            self.file, self.line, self.column, self.severity, self.code, self.message
        );
        if let Some(suggestion) = &self.suggestion {
            out.push_str("\nSuggestion: ");
            out.push_str(suggestion);
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Accumulator for diagnostics produced during a compilation unit.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic to the sink.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Returns true if at least one error-severity diagnostic was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Number of error-severity diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Number of diagnostics of any severity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns all diagnostics sorted by (line, column).
    #[must_use]
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut out = self.diagnostics.clone();
        out.sort_by_key(|d| (d.line, d.column));
        out
    }

    /// Renders all diagnostics, sorted, one per line.
    #[must_use]
    pub fn format(&self) -> String {
        self.sorted()
            .iter()
            .map(Diagnostic::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the raw diagnostics in report order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Removes all diagnostics.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_as_str() {
        assert_eq!(DiagnosticCode::TypEq.as_str(), "VEX-TYP-EQ");
        assert_eq!(
            DiagnosticCode::PkgNotExported.as_str(),
            "VEX-PKG-NOT-EXPORTED"
        );
    }

    #[test]
    fn code_family() {
        assert_eq!(DiagnosticCode::TypEq.family(), "TYP");
        assert_eq!(DiagnosticCode::SynParse.family(), "SYN");
        assert_eq!(DiagnosticCode::RecNominal.family(), "REC");
    }

    #[test]
    fn render_without_suggestion() {
        let d = Diagnostic::error(DiagnosticCode::TypUndef, "main.vx", 3, 9, "undefined: foo");
        assert_eq!(
            d.render(),
            "main.vx:3:9: error: [VEX-TYP-UNDEF]: undefined: foo"
        );
    }

    #[test]
    fn render_with_suggestion() {
        let d = Diagnostic::error(DiagnosticCode::SymNaming, "main.vx", 1, 6, "bad name")
            .with_suggestion("use kebab-case: my-func");
        let rendered = d.render();
        assert!(rendered.ends_with("\nSuggestion: use kebab-case: my-func"));
    }

    #[test]
    fn sink_has_errors_ignores_warnings() {
        let mut sink = DiagnosticSink::new();
        sink.report(Diagnostic::warning(
            DiagnosticCode::SymNaming,
            "a.vx",
            1,
            1,
            "w",
        ));
        assert!(!sink.has_errors());

        sink.report(Diagnostic::error(DiagnosticCode::TypEq, "a.vx", 2, 1, "e"));
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn sink_sorted_by_position() {
        let mut sink = DiagnosticSink::new();
        sink.report(Diagnostic::error(DiagnosticCode::TypEq, "a.vx", 5, 2, "c"));
        sink.report(Diagnostic::error(DiagnosticCode::TypEq, "a.vx", 1, 9, "a"));
        sink.report(Diagnostic::error(DiagnosticCode::TypEq, "a.vx", 1, 3, "b"));

        let sorted = sink.sorted();
        assert_eq!(sorted[0].message, "b");
        assert_eq!(sorted[1].message, "a");
        assert_eq!(sorted[2].message, "c");
    }

    #[test]
    fn sink_clear() {
        let mut sink = DiagnosticSink::new();
        sink.report(Diagnostic::error(DiagnosticCode::TypEq, "a.vx", 1, 1, "x"));
        sink.clear();
        assert!(sink.is_empty());
        assert!(!sink.has_errors());
    }
}
