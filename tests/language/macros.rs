//! Integration tests for the macro expander.

use vex_foundation::ErrorKind;
use vex_language::pretty::pretty_print_all;
use vex_language::{MAX_PASSES, MacroExpander, parse};

fn expand_text(source: &str) -> String {
    let forms = parse(source).unwrap();
    let expanded = MacroExpander::new()
        .expand_all(&forms)
        .expect("expansion failed");
    pretty_print_all(&expanded)
}

#[test]
fn defn_is_sugar_for_def_fn() {
    assert_eq!(
        expand_text("(defn add [x: int y: int] -> int (+ x y))"),
        "(def add (fn [x: int y: int] -> int (+ x y)))"
    );
}

#[test]
fn defn_with_multi_form_body() {
    assert_eq!(
        expand_text("(defn noisy [x: int] -> int (fmt/Println x) x)"),
        "(def noisy (fn [x: int] -> int (fmt/Println x) x))"
    );
}

#[test]
fn deftest_wraps_body_in_test_closure() {
    assert_eq!(
        expand_text("(deftest \"math\" (= (+ 1 2) 3) (= (* 2 2) 4))"),
        "(test/run \"math\" (fn [] -> bool (do (= (+ 1 2) 3) (= (* 2 2) 4))))"
    );
}

#[test]
fn user_macro_substitutes_argument_trees() {
    let out = expand_text(
        "(macro log-twice [msg] (do (fmt/Println ~msg) (fmt/Println ~msg)))\n(log-twice (greet \"ada\"))",
    );
    assert_eq!(
        out,
        "(do (fmt/Println (greet \"ada\")) (fmt/Println (greet \"ada\")))"
    );
}

#[test]
fn user_macros_compose_with_bootstrap_macros() {
    let out = expand_text(
        "(macro check [cond] (when ~cond (fmt/Println \"ok\")))\n(check (> 2 1))",
    );
    assert_eq!(out, "(if (> 2 1) (do (fmt/Println \"ok\")))");
}

#[test]
fn expansion_reaches_fixed_point_across_passes() {
    let out = expand_text(
        "(macro lvl-one [x] (lvl-two ~x))\n(macro lvl-two [x] (lvl-three ~x))\n(macro lvl-three [x] (done ~x))\n(lvl-one 9)",
    );
    assert_eq!(out, "(done 9)");
}

#[test]
fn runaway_expansion_is_bounded() {
    let forms = parse("(macro spin [] (spin))\n(spin)").unwrap();
    let err = MacroExpander::new().expand_all(&forms).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::MacroRecursion { passes } if passes == MAX_PASSES
    ));
}

#[test]
fn unknown_heads_pass_through_unchanged() {
    assert_eq!(
        expand_text("(mystery-call 1 2 3)"),
        "(mystery-call 1 2 3)"
    );
}

#[test]
fn reserved_heads_are_protected() {
    let forms = parse("(macro let [a] ~a)").unwrap();
    let err = MacroExpander::new().expand_all(&forms).unwrap_err();
    assert!(err.to_string().contains("reserved"));
}

#[test]
fn splices_respect_string_literals() {
    // A paren inside a string must not confuse argument extraction
    let out = expand_text(
        "(macro say [msg] (fmt/Println ~msg))\n(say \"unbalanced ( in text\")",
    );
    assert_eq!(out, "(fmt/Println \"unbalanced ( in text\")");
}
