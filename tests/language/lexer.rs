//! Integration tests for the lexer.

use vex_language::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn lex_program_shape() {
    let source = "(import \"fmt\")\n(fmt/Println \"hi\")\n";
    let tokens = kinds(source);
    assert_eq!(tokens[0], TokenKind::LParen);
    assert_eq!(tokens[1], TokenKind::Symbol("import".into()));
    assert_eq!(tokens[2], TokenKind::Str("fmt".into()));
    assert!(tokens.contains(&TokenKind::Symbol("fmt/Println".into())));
    assert_eq!(tokens.last(), Some(&TokenKind::Eof));
}

#[test]
fn lex_annotated_parameters() {
    let tokens = kinds("[x: int y: float]");
    assert_eq!(
        tokens,
        vec![
            TokenKind::LBracket,
            TokenKind::Symbol("x:".into()),
            TokenKind::Symbol("int".into()),
            TokenKind::Symbol("y:".into()),
            TokenKind::Symbol("float".into()),
            TokenKind::RBracket,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_operator_symbols() {
    for op in ["+", "-", "*", "/", "<", ">", ">=", "<=", "=", "->"] {
        assert_eq!(
            kinds(op),
            vec![TokenKind::Symbol(op.into()), TokenKind::Eof],
            "operator {op}"
        );
    }
}

#[test]
fn lex_numbers_and_signs() {
    assert_eq!(kinds("42"), vec![TokenKind::Int(42), TokenKind::Eof]);
    assert_eq!(kinds("-42"), vec![TokenKind::Int(-42), TokenKind::Eof]);
    assert_eq!(kinds("3.14"), vec![TokenKind::Float(3.14), TokenKind::Eof]);
    // A bare minus is a symbol, not a number
    assert_eq!(
        kinds("- 1"),
        vec![
            TokenKind::Symbol("-".into()),
            TokenKind::Int(1),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_and_commas_are_skipped_between_tokens() {
    let tokens = kinds("1, 2 ; trailing comment\n3");
    let without_trivia: Vec<TokenKind> =
        tokens.into_iter().filter(|t| !t.is_trivia()).collect();
    assert_eq!(
        without_trivia,
        vec![
            TokenKind::Int(1),
            TokenKind::Int(2),
            TokenKind::Int(3),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn tilde_is_its_own_token() {
    assert_eq!(
        kinds("~body"),
        vec![
            TokenKind::Tilde,
            TokenKind::Symbol("body".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn string_escapes() {
    assert_eq!(
        kinds(r#""line\nbreak \"quoted\"""#),
        vec![
            TokenKind::Str("line\nbreak \"quoted\"".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn spans_point_into_source() {
    let source = "(def x 42)";
    let tokens = Lexer::tokenize_all(source);
    let def = &tokens[1];
    assert_eq!(def.text(source), "def");
    assert_eq!(def.span.column, 2);
}
