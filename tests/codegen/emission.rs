//! Shape of the generated Go source.

use vex_analyzer::Analyzer;
use vex_codegen::{GoGenerator, go_ident};
use vex_language::{MacroExpander, parse};

fn generate(source: &str) -> String {
    let forms = parse(source).unwrap();
    let expanded = MacroExpander::new().expand_all(&forms).unwrap();
    let analysis = Analyzer::new("gen.vx").analyze(&expanded);
    assert!(!analysis.has_errors(), "{}", analysis.sink.format());
    GoGenerator::new()
        .with_analysis(analysis.records, analysis.schemes)
        .generate(&expanded)
}

/// Generated programs must at least be brace- and paren-balanced; the
/// host compiler does the full parse.
fn assert_balanced(go: &str) {
    assert_eq!(go.matches('{').count(), go.matches('}').count(), "{go}");
    assert_eq!(go.matches('(').count(), go.matches(')').count(), "{go}");
}

#[test]
fn package_main_skeleton() {
    let go = generate("(import \"fmt\")\n(fmt/Println \"hi\")");
    assert!(go.starts_with("package main\n"));
    assert!(go.contains("func main() {"));
    assert!(go.trim_end().ends_with('}'));
    assert_balanced(&go);
}

#[test]
fn statements_appear_in_source_order() {
    let go = generate(
        "(import \"fmt\")\n(fmt/Println \"first\")\n(fmt/Println \"second\")",
    );
    let first = go.find("\"first\"").unwrap();
    let second = go.find("\"second\"").unwrap();
    assert!(first < second);
}

#[test]
fn closures_carry_mapped_parameter_types() {
    let go = generate(
        "(defn mix [i: int f: float s: string b: bool u: unknown] -> int i)\n(mix 1 2.5 \"s\" true 9)",
    );
    assert!(go.contains("func(i int, f float64, s string, b bool, u interface{}) int"));
    assert_balanced(&go);
}

#[test]
fn nested_calls_and_arithmetic() {
    let go = generate(
        "(defn add [x: int y: int] -> int (+ x y))\n(defn mul [x: int y: int] -> int (* x y))\n(add (mul 2 3) (add 1 (mul 4 5)))",
    );
    assert!(go.contains("add(mul(2, 3), add(1, mul(4, 5)))"));
    assert_balanced(&go);
}

#[test]
fn comparisons_and_logic() {
    let go = generate("(def t (and (> 2 1) (not (= 1 2))))");
    assert!(go.contains("(2 > 1) && !((1 == 2))") || go.contains("(2 > 1) && !(1 == 2)"), "{go}");
}

#[test]
fn list_builtins_map_to_go_indexing() {
    let go = generate(
        "(def xs [1 2 3])\n(def hd (first xs))\n(def tl (rest xs))\n(def n (count xs))\n(def e (empty? xs))",
    );
    assert!(go.contains("xs[0]"));
    assert!(go.contains("xs[1:]"));
    assert!(go.contains("len(xs)"));
    assert!(go.contains("len(xs) == 0"));
}

#[test]
fn records_emit_exported_struct_fields() {
    let go = generate("(record Point [x-pos: int y-pos: int])\n(def p (Point [x-pos: 1 y-pos: 2]))");
    assert!(go.contains("type Point struct {"));
    assert!(go.contains("\tXPos int"));
    assert!(go.contains("\tYPos int"));
    assert!(go.contains("Point{1, 2}"));
    assert_balanced(&go);
}

#[test]
fn unused_bindings_are_suppressed() {
    let go = generate("(def unused 42)");
    assert!(go.contains("_ = unused"));
}

#[test]
fn ident_mapping_rules() {
    assert_eq!(go_ident("say-hi"), "say_hi");
    assert_eq!(go_ident("sum-three"), "sum_three");
    assert_eq!(go_ident("valid?"), "valid");
}

#[test]
fn deftest_emission_calls_the_test_package() {
    let go = generate(
        "(import [\"fmt\" \"test\"])\n(defn add [x: int y: int] -> int (+ x y))\n(deftest \"adds\" (= (add 1 2) 3))",
    );
    assert!(go.contains("test.run(\"adds\""));
    assert_balanced(&go);
}
