//! Integration tests for the parser.

use vex_foundation::{DiagnosticCode, DiagnosticSink};
use vex_language::{Ast, parse, parse_one, parse_with_recovery};

#[test]
fn parse_top_level_program() {
    let forms = parse(
        "(import \"fmt\")\n(defn add [x: int y: int] -> int (+ x y))\n(fmt/Println (add 2 3))\n",
    )
    .unwrap();
    assert_eq!(forms.len(), 3);
    assert_eq!(forms[0].head_symbol(), Some("import"));
    assert_eq!(forms[1].head_symbol(), Some("defn"));
    assert_eq!(forms[2].head_symbol(), Some("fmt/Println"));
}

#[test]
fn reparsing_yields_isomorphic_trees() {
    let source = "(record User [name: string age: int])\n(def u (User [name: \"ada\" age: 36]))";
    let first = parse(source).unwrap();
    let second = parse(source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn nested_structures() {
    let ast = parse_one("(a [b (c [d])] e)").unwrap();
    let outer = ast.as_list().unwrap();
    assert_eq!(outer.len(), 3);
    let inner = outer[1].as_array().unwrap();
    assert!(inner[1].is_list());
}

#[test]
fn literal_terminals() {
    assert!(matches!(parse_one("true").unwrap(), Ast::Bool(true, _)));
    assert!(matches!(parse_one("9").unwrap(), Ast::Int(9, _)));
    assert!(matches!(parse_one("9.5").unwrap(), Ast::Float(_, _)));
    assert!(matches!(parse_one("\"s\"").unwrap(), Ast::Str(_, _)));
    assert!(matches!(parse_one("sym").unwrap(), Ast::Symbol(_, _)));
}

#[test]
fn unbalanced_input_is_an_error() {
    assert!(parse("(def x").is_err());
    assert!(parse("def x)").is_err());
    assert!(parse("[1 2").is_err());
}

#[test]
fn recovery_collects_multiple_errors() {
    let mut sink = DiagnosticSink::new();
    let source = ")\n(def ok 1)\n)";
    let forms = parse_with_recovery(source, "multi.vx", &mut sink);

    assert_eq!(sink.error_count(), 2);
    assert!(forms.iter().any(|f| f.head_symbol() == Some("def")));

    // Diagnostics sorted by position, each with a syntax-family code
    let sorted = sink.sorted();
    assert!(
        sorted
            .windows(2)
            .all(|w| (w[0].line, w[0].column) <= (w[1].line, w[1].column))
    );
    assert!(sorted.iter().all(|d| d.code.family() == "SYN"));
}

#[test]
fn recovery_reports_unterminated_lists() {
    let mut sink = DiagnosticSink::new();
    parse_with_recovery("(never closed", "u.vx", &mut sink);
    assert!(
        sink.sorted()
            .iter()
            .any(|d| d.code == DiagnosticCode::SynUnterminated)
    );
}

#[test]
fn spans_track_lines_and_columns() {
    let forms = parse("(def a 1)\n  (def b 2)").unwrap();
    assert_eq!(forms[0].span().line, 1);
    assert_eq!(forms[1].span().line, 2);
    assert_eq!(forms[1].span().column, 3);
}
