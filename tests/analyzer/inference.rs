//! Type inference behavior through the public pipeline.

use vex_analyzer::{AnalysisResult, Analyzer};
use vex_foundation::Type;
use vex_language::{MacroExpander, parse};

fn analyze(source: &str) -> AnalysisResult {
    let forms = parse(source).expect("parse failed");
    let expanded = MacroExpander::new()
        .expand_all(&forms)
        .expect("expansion failed");
    Analyzer::new("infer.vx").analyze(&expanded)
}

fn scheme_ty(result: &AnalysisResult, name: &str) -> Type {
    result.schemes[name].ty.clone()
}

#[test]
fn principal_types_for_top_level_defs() {
    let result = analyze(
        "(def n 1)\n(def f 2.5)\n(def s \"x\")\n(def b false)\n(defn add [x: int y: int] -> int (+ x y))",
    );
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(scheme_ty(&result, "n"), Type::int());
    assert_eq!(scheme_ty(&result, "f"), Type::float());
    assert_eq!(scheme_ty(&result, "s"), Type::string());
    assert_eq!(scheme_ty(&result, "b"), Type::boolean());
    assert_eq!(
        scheme_ty(&result, "add"),
        Type::fun(vec![Type::int(), Type::int()], Type::int())
    );
}

#[test]
fn generalization_is_sound_across_instantiations() {
    let result = analyze(
        "(defn id [x: a] -> a x)\n(def as-int (id 7))\n(def as-str (id \"seven\"))\n(def as-arr (id [1 2]))",
    );
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(scheme_ty(&result, "as-int"), Type::int());
    assert_eq!(scheme_ty(&result, "as-str"), Type::string());
    assert_eq!(scheme_ty(&result, "as-arr"), Type::arr(Type::int()));
}

#[test]
fn value_restriction_on_non_syntactic_bindings() {
    let result = analyze("(defn id [x: a] -> a x)\n(def v (id (id 1)))");
    assert!(!result.has_errors());
    assert!(result.schemes["id"].is_polymorphic());
    assert!(!result.schemes["v"].is_polymorphic());
}

#[test]
fn numeric_family_unifies_freely() {
    let result = analyze(
        "(defn wants-number [x: number] -> number x)\n(wants-number 1)\n(wants-number 2.5)\n(def mixed (+ 1 2.5))",
    );
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(scheme_ty(&result, "mixed"), Type::float());
}

#[test]
fn plus_is_variadic_folded() {
    let result = analyze("(def total (+ 1 2 3 4 5))");
    assert!(!result.has_errors());
    assert_eq!(scheme_ty(&result, "total"), Type::int());
}

#[test]
fn polymorphic_list_builtins() {
    let result = analyze(
        "(def xs [1 2 3])\n(def hd (first xs))\n(def tl (rest xs))\n(def n (count xs))\n(def more (cons 0 xs))\n(def joined (append xs xs))",
    );
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(scheme_ty(&result, "hd"), Type::int());
    assert_eq!(scheme_ty(&result, "tl"), Type::arr(Type::int()));
    assert_eq!(scheme_ty(&result, "n"), Type::int());
    assert_eq!(scheme_ty(&result, "more"), Type::arr(Type::int()));
    assert_eq!(scheme_ty(&result, "joined"), Type::arr(Type::int()));
}

#[test]
fn lexical_scope_reverts_on_exit() {
    let result = analyze("(defn inner [x: int] -> int x)\n(def leak x)");
    // x was a parameter of inner; it does not leak out
    assert!(result.has_errors());
    assert!(result.sink.format().contains("VEX-TYP-UNDEF"));
}

#[test]
fn shadowing_does_not_mutate_outer_scope() {
    let result = analyze(
        "(def x 1)\n(defn shadow [x: string] -> string x)\n(def still-int (+ x 1))",
    );
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(scheme_ty(&result, "still-int"), Type::int());
}

#[test]
fn do_sequences_without_cross_unification() {
    let result = analyze("(def x (do 1 \"two\" 3.0))");
    assert!(!result.has_errors());
    assert_eq!(scheme_ty(&result, "x"), Type::float());
}

#[test]
fn let_bindings_are_monomorphic() {
    let result = analyze("(def y (let [f (fn [x: a] -> a x)] (f 1)))");
    assert!(!result.has_errors(), "{}", result.sink.format());
    assert_eq!(scheme_ty(&result, "y"), Type::int());
}
