//! Pretty-printer for AST nodes.
//!
//! Renders AST nodes back to canonical Vex source text. The resolver
//! uses this to assemble the combined compilation unit, and the macro
//! expander's tests use it to compare expansions structurally.

use std::fmt::Write;

use crate::ast::Ast;

/// Renders a single AST node as source text.
#[must_use]
pub fn pretty_print(ast: &Ast) -> String {
    let mut out = String::new();
    print_node(&mut out, ast);
    out
}

/// Renders multiple AST nodes, one top-level form per line.
#[must_use]
pub fn pretty_print_all(asts: &[Ast]) -> String {
    asts.iter().map(pretty_print).collect::<Vec<_>>().join("\n")
}

fn print_node(out: &mut String, ast: &Ast) {
    match ast {
        Ast::Bool(true, _) => out.push_str("true"),
        Ast::Bool(false, _) => out.push_str("false"),
        Ast::Int(n, _) => {
            let _ = write!(out, "{n}");
        }
        Ast::Float(n, _) => print_float(out, *n),
        Ast::Str(s, _) => print_string(out, s),
        Ast::Symbol(s, _) => out.push_str(s),
        Ast::List(elements, _) => print_delimited(out, elements, '(', ')'),
        Ast::Array(elements, _) => print_delimited(out, elements, '[', ']'),
        Ast::Splice(inner, _) => {
            out.push('~');
            print_node(out, inner);
        }
    }
}

fn print_delimited(out: &mut String, elements: &[Ast], open: char, close: char) {
    out.push(open);
    for (i, elem) in elements.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        print_node(out, elem);
    }
    out.push(close);
}

fn print_float(out: &mut String, n: f64) {
    let s = n.to_string();
    out.push_str(&s);
    // Keep floats round-trippable as floats
    if !s.contains('.') && !s.contains('e') && !s.contains('E') {
        out.push_str(".0");
    }
}

fn print_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}
