//! Diagnostic formatting and ordering guarantees.

use vex_analyzer::{AnalysisResult, Analyzer};
use vex_foundation::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use vex_language::{MacroExpander, parse};

fn analyze(source: &str) -> AnalysisResult {
    let forms = parse(source).expect("parse failed");
    let expanded = MacroExpander::new()
        .expand_all(&forms)
        .expect("expansion failed");
    Analyzer::new("diag.vx").analyze(&expanded)
}

#[test]
fn rendering_format_matches_contract() {
    let diagnostic = Diagnostic::error(
        DiagnosticCode::TypIfMismatch,
        "main.vx",
        4,
        2,
        "Expected: type(then) == type(else); Got: then=number, else=string",
    );
    assert_eq!(
        diagnostic.render(),
        "main.vx:4:2: error: [VEX-TYP-IF-MISMATCH]: Expected: type(then) == type(else); Got: then=number, else=string"
    );
}

#[test]
fn suggestion_renders_on_next_line() {
    let diagnostic = Diagnostic::error(DiagnosticCode::SymNaming, "main.vx", 1, 6, "bad name")
        .with_suggestion("rename to 'say-hi'");
    let rendered = diagnostic.render();
    let mut lines = rendered.lines();
    assert!(lines.next().unwrap().ends_with("bad name"));
    assert_eq!(lines.next(), Some("Suggestion: rename to 'say-hi'"));
}

#[test]
fn diagnostics_come_out_sorted_by_position() {
    let result = analyze("(+ 1 \"a\")\n(+ true 2)\n(= 1 \"b\")");
    let sorted = result.sink.sorted();
    assert!(sorted.len() >= 3);
    assert!(
        sorted
            .windows(2)
            .all(|w| (w[0].line, w[0].column) <= (w[1].line, w[1].column))
    );
}

#[test]
fn each_diagnostic_carries_exactly_one_code() {
    let result = analyze("(+ 1 \"a\")\n(unknown-fn 1)");
    for diagnostic in result.sink.sorted() {
        let rendered = diagnostic.render();
        let open = rendered.matches("[VEX-").count();
        assert_eq!(open, 1, "{rendered}");
    }
}

#[test]
fn warnings_never_block_compilation() {
    let mut sink = DiagnosticSink::new();
    sink.report(Diagnostic::warning(
        DiagnosticCode::SymNaming,
        "w.vx",
        1,
        1,
        "stylistic nit",
    ));
    assert!(!sink.has_errors());
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.sorted()[0].severity, Severity::Warning);
}

#[test]
fn if_mismatch_message_uses_public_projection() {
    let result = analyze("(if true 1 \"x\")");
    let rendered = result.sink.format();
    assert!(rendered.contains("[VEX-TYP-IF-MISMATCH]"));
    assert!(rendered.contains("then=number"));
    assert!(rendered.contains("else=string"));
}

#[test]
fn undefined_symbols_point_at_use_site() {
    let result = analyze("(def x 1)\n(def y (+ x missing-thing))");
    let sorted = result.sink.sorted();
    let undef = sorted
        .iter()
        .find(|d| d.code == DiagnosticCode::TypUndef)
        .expect("expected an undefined-identifier diagnostic");
    assert_eq!(undef.line, 2);
    assert!(undef.message.contains("missing-thing"));
}

#[test]
fn export_enforcement_suggests_a_fix() {
    use std::collections::{BTreeSet, HashMap};
    use vex_analyzer::PackageContext;

    let mut packages = PackageContext::default();
    packages
        .exports
        .insert("util".to_string(), BTreeSet::from(["visible".to_string()]));
    packages.schemes.insert("util".to_string(), HashMap::new());

    let forms = parse("(util/hidden 1)").unwrap();
    let result = Analyzer::new("diag.vx").with_packages(packages).analyze(&forms);
    let sorted = result.sink.sorted();
    assert_eq!(sorted[0].code, DiagnosticCode::PkgNotExported);
    assert!(sorted[0].suggestion.as_deref().unwrap_or("").contains("export"));
}
