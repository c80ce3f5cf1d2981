//! Record declaration and nominal typing behavior.

use vex_analyzer::{AnalysisResult, Analyzer};
use vex_foundation::{DiagnosticCode, Type};
use vex_language::{MacroExpander, parse};

fn analyze(source: &str) -> AnalysisResult {
    let forms = parse(source).expect("parse failed");
    let expanded = MacroExpander::new()
        .expand_all(&forms)
        .expect("expansion failed");
    Analyzer::new("records.vx").analyze(&expanded)
}

fn codes(result: &AnalysisResult) -> Vec<DiagnosticCode> {
    result.sink.sorted().iter().map(|d| d.code).collect()
}

#[test]
fn declaration_keeps_field_order() {
    let result = analyze("(record User [name: string age: int active: bool])");
    assert!(!result.has_errors());
    let user = result.records.get("User").unwrap();
    assert_eq!(user.field_names(), vec!["name", "age", "active"]);
    assert_eq!(user.field_type("age"), Some(&Type::int()));
}

#[test]
fn construction_checks_every_field() {
    let result = analyze(
        "(record User [name: string age: int])\n(def ok (User [name: \"ada\" age: 36]))",
    );
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(result.schemes["ok"].ty, Type::con("User"));
}

#[test]
fn field_value_type_mismatch_is_flagged() {
    let result = analyze("(record User [age: int])\n(User [age: \"old\"])");
    assert!(codes(&result).contains(&DiagnosticCode::TypEq));
}

#[test]
fn missing_and_extra_fields_are_flagged() {
    let result = analyze(
        "(record User [name: string age: int])\n(User [name: \"ada\" nickname: \"a\"])",
    );
    let found = codes(&result);
    assert!(found.contains(&DiagnosticCode::RecUnknownField));
    assert!(found.contains(&DiagnosticCode::RecMissingField));
}

#[test]
fn duplicate_fields_rejected_at_declaration() {
    let result = analyze("(record Pair [a: int a: int])");
    assert!(codes(&result).contains(&DiagnosticCode::RecDupField));
}

#[test]
fn field_names_must_be_kebab_case() {
    let result = analyze("(record User [first_name: string])");
    assert!(codes(&result).contains(&DiagnosticCode::SymNaming));
}

#[test]
fn records_are_nominal_even_with_identical_fields() {
    let result = analyze(
        "(record A [x: number])\n(record B [x: number])\n(if true (A [x: 1]) (B [x: 2]))",
    );
    assert!(codes(&result).contains(&DiagnosticCode::RecNominal));
}

#[test]
fn same_record_branches_unify() {
    let result = analyze(
        "(record A [x: number])\n(def picked (if true (A [x: 1]) (A [x: 2])))",
    );
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(result.schemes["picked"].ty, Type::con("A"));
}

#[test]
fn accessor_types_come_from_declarations() {
    let result = analyze(
        "(record User [name: string age: int])\n(def u (User [name: \"ada\" age: 36]))\n(def n (u :name))\n(def a (u :age))",
    );
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(result.schemes["n"].ty, Type::string());
    assert_eq!(result.schemes["a"].ty, Type::int());
}

#[test]
fn accessor_on_unknown_field_is_flagged() {
    let result = analyze("(record User [name: string])\n(def u (User [name: \"a\"]))\n(u :nick)");
    assert!(codes(&result).contains(&DiagnosticCode::RecUnknownField));
}

#[test]
fn record_values_pass_through_functions_nominally() {
    let result = analyze(
        "(record User [name: string])\n(record Admin [name: string])\n(defn greet [u: User] -> string (u :name))\n(greet (Admin [name: \"root\"]))",
    );
    assert!(codes(&result).contains(&DiagnosticCode::TypArg));
}
