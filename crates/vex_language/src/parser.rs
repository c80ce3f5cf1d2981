//! Parser for Vex source.
//!
//! A recursive-descent parser over the lexer's token stream. Two entry
//! styles are provided: the strict [`parse`]/[`parse_one`] functions
//! that stop at the first syntax error, and [`parse_with_recovery`],
//! which reports coded diagnostics and resynchronizes at the next
//! top-level form so later errors are still found.

use vex_foundation::{Diagnostic, DiagnosticCode, DiagnosticSink, Error, Result};

use crate::ast::Ast;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for Vex source code.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Source text (for error context).
    source: &'src str,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            source,
        }
    }

    /// Parses a single form from the source.
    pub fn parse(&mut self) -> Result<Ast> {
        self.skip_trivia();
        self.parse_form()
    }

    /// Parses all forms from the source.
    pub fn parse_all(&mut self) -> Result<Vec<Ast>> {
        let mut forms = Vec::new();
        self.skip_trivia();

        while self.current.kind != TokenKind::Eof {
            forms.push(self.parse_form()?);
            self.skip_trivia();
        }

        Ok(forms)
    }

    /// Parses all forms, reporting syntax errors as diagnostics and
    /// recovering at the next top-level form.
    pub fn parse_all_with_recovery(&mut self, file: &str, sink: &mut DiagnosticSink) -> Vec<Ast> {
        let mut forms = Vec::new();
        self.skip_trivia();

        while self.current.kind != TokenKind::Eof {
            match self.parse_form() {
                Ok(form) => forms.push(form),
                Err(err) => {
                    sink.report(syntax_diagnostic(&err, file));
                    self.recover_to_top_level();
                }
            }
            self.skip_trivia();
        }

        forms
    }

    /// Parses a single form.
    fn parse_form(&mut self) -> Result<Ast> {
        self.skip_trivia();

        match &self.current.kind {
            TokenKind::True => {
                let span = self.current.span;
                self.advance();
                Ok(Ast::Bool(true, span))
            }
            TokenKind::False => {
                let span = self.current.span;
                self.advance();
                Ok(Ast::Bool(false, span))
            }
            TokenKind::Int(n) => {
                let n = *n;
                let span = self.current.span;
                self.advance();
                Ok(Ast::Int(n, span))
            }
            TokenKind::Float(n) => {
                let n = *n;
                let span = self.current.span;
                self.advance();
                Ok(Ast::Float(n, span))
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                let span = self.current.span;
                self.advance();
                Ok(Ast::Str(s, span))
            }
            TokenKind::Symbol(name) => {
                let name = name.clone();
                let span = self.current.span;
                self.advance();
                Ok(Ast::Symbol(name, span))
            }
            TokenKind::LParen => self.parse_list(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::Tilde => self.parse_splice(),
            TokenKind::Eof => Err(self.error("unexpected end of input")),
            TokenKind::Error(msg) => {
                let msg = msg.clone();
                Err(self.error(&msg))
            }
            TokenKind::RParen | TokenKind::RBracket => {
                Err(self.error(&format!("unexpected {}", self.current.kind.name())))
            }
            TokenKind::Comment(_) => {
                // skip_trivia already drops these; handle defensively
                self.advance();
                self.parse_form()
            }
        }
    }

    /// Parses a list: `( element* )`.
    fn parse_list(&mut self) -> Result<Ast> {
        let start_span = self.current.span;
        self.advance(); // consume '('

        let mut elements = Vec::new();
        self.skip_trivia();

        while self.current.kind != TokenKind::RParen {
            if self.current.kind == TokenKind::Eof {
                return Err(self.error_at(start_span, "unterminated list"));
            }
            elements.push(self.parse_form()?);
            self.skip_trivia();
        }

        let end_span = self.current.span;
        self.advance(); // consume ')'

        Ok(Ast::List(elements, start_span.to(end_span)))
    }

    /// Parses an array: `[ element* ]`.
    fn parse_array(&mut self) -> Result<Ast> {
        let start_span = self.current.span;
        self.advance(); // consume '['

        let mut elements = Vec::new();
        self.skip_trivia();

        while self.current.kind != TokenKind::RBracket {
            if self.current.kind == TokenKind::Eof {
                return Err(self.error_at(start_span, "unterminated array"));
            }
            elements.push(self.parse_form()?);
            self.skip_trivia();
        }

        let end_span = self.current.span;
        self.advance(); // consume ']'

        Ok(Ast::Array(elements, start_span.to(end_span)))
    }

    /// Parses a splice: `~form`.
    fn parse_splice(&mut self) -> Result<Ast> {
        let start_span = self.current.span;
        self.advance(); // consume '~'

        self.skip_trivia();
        if self.current.kind == TokenKind::Eof {
            return Err(self.error_at(start_span, "expected form after '~'"));
        }

        let inner = self.parse_form()?;
        let end_span = inner.span();

        Ok(Ast::Splice(Box::new(inner), start_span.to(end_span)))
    }

    /// Skips comment tokens.
    fn skip_trivia(&mut self) {
        while self.current.kind.is_trivia() {
            self.advance();
        }
    }

    /// Drops tokens until the next plausible top-level form start.
    fn recover_to_top_level(&mut self) {
        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::Eof => break,
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => {
                    self.advance();
                    if depth <= 1 {
                        break;
                    }
                    depth -= 1;
                    continue;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    /// Creates a parse error at the current position.
    fn error(&self, message: &str) -> Error {
        self.error_at(self.current.span, message)
    }

    /// Creates a parse error at a specific span.
    fn error_at(&self, span: Span, message: &str) -> Error {
        Error::parse(message, span.line, span.column, self.context_at(span))
    }

    /// Gets the source line containing a span, for error context.
    fn context_at(&self, span: Span) -> String {
        let start = span.start.min(self.source.len());
        let line_start = self.source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[start..]
            .find('\n')
            .map_or(self.source.len(), |i| start + i);
        self.source[line_start..line_end].to_string()
    }
}

/// Converts a parse [`Error`] into a coded syntax diagnostic.
fn syntax_diagnostic(err: &Error, file: &str) -> Diagnostic {
    match &err.kind {
        vex_foundation::ErrorKind::Parse {
            message,
            line,
            column,
            ..
        } => {
            let code = if message.starts_with("unterminated") {
                DiagnosticCode::SynUnterminated
            } else {
                DiagnosticCode::SynParse
            };
            Diagnostic::error(code, file, *line, *column, message.clone())
        }
        other => Diagnostic::error(DiagnosticCode::SynParse, file, 1, 1, other.to_string()),
    }
}

/// Parses source code into a sequence of top-level forms.
pub fn parse(source: &str) -> Result<Vec<Ast>> {
    Parser::new(source).parse_all()
}

/// Parses a single form from source.
pub fn parse_one(source: &str) -> Result<Ast> {
    Parser::new(source).parse()
}

/// Parses with best-effort recovery, reporting errors into `sink`.
#[must_use]
pub fn parse_with_recovery(source: &str, file: &str, sink: &mut DiagnosticSink) -> Vec<Ast> {
    Parser::new(source).parse_all_with_recovery(file, sink)
}
