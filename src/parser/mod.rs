//! Recursive descent parser for xmlang.
//!
//! Consumes the reversed token stream by decrementing a cursor index.
//! Errors are rendered through the shared reporter as they are found;
//! `synchronize` then skips to a plausible tag boundary so one run can
//! surface as many diagnostics as possible.

mod decl;
mod stmt;
mod tag;

use std::fmt;

use crate::ast::Node;
use crate::diagnostics::{DiagnosticKind, Reporter};
use crate::lexer::{Token, TokenKind};

/// Summary error returned when parsing failed. Individual diagnostics
/// were already rendered; this is the final banner.
#[derive(Debug, Clone)]
pub struct ParseError;

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I give up. ( ; \u{03c9} ; )")
    }
}

impl std::error::Error for ParseError {}

/// A construct that could not be parsed. Its diagnostic has already been
/// reported; the caller decides whether to synchronize and continue.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Failure;

pub(crate) type Attempt<T> = Result<T, Failure>;

pub struct Parser<'a> {
    tokens: &'a [Token],
    cursor: isize,
    reporter: &'a mut Reporter,
}

impl<'a> Parser<'a> {
    /// Parse a reversed token stream into a program tree. Returns the
    /// give-up error if anything failed, even when a partial tree was
    /// built.
    pub fn parse(tokens: &'a [Token], reporter: &'a mut Reporter) -> Result<Node, ParseError> {
        if tokens.is_empty() {
            return Err(ParseError);
        }

        let mut parser = Parser {
            tokens,
            cursor: tokens.len() as isize - 1,
            reporter,
        };

        let program = parser.parse_program().map_err(|_| ParseError)?;

        if parser.reporter.had_error() {
            return Err(ParseError);
        }

        Ok(program)
    }

    // === Cursor primitives ===

    pub(crate) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// Read ahead without consuming. Out-of-range reads resolve to the
    /// `EndOfFile` token, which sits at index 0 of the reversed stream.
    pub(crate) fn peek_at(&self, distance: isize) -> &Token {
        let index = self.cursor - distance;
        if index < 0 || index as usize >= self.tokens.len() {
            &self.tokens[0]
        } else {
            &self.tokens[index as usize]
        }
    }

    pub(crate) fn expect(&self, kind: TokenKind) -> bool {
        self.cursor >= 0 && self.peek().kind == kind
    }

    pub(crate) fn expect_text(&self, kind: TokenKind, text: &str) -> bool {
        self.expect(kind) && self.peek().text == text
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.cursor -= 1;
        token
    }

    pub(crate) fn advance_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.expect(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn advance_if_text(&mut self, kind: TokenKind, text: &str) -> Option<Token> {
        if self.expect_text(kind, text) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Skip tokens until either an opening keyword one level inside the
    /// anchor, or any token back at the anchor's depth.
    pub(crate) fn synchronize(&mut self, anchor: &Token) {
        while self.cursor > 2
            && !((self.peek().kind == TokenKind::LeftAngle
                && self.peek_at(1).kind == TokenKind::Keyword
                && self.peek().depth == anchor.depth + 1)
                || self.peek().depth == anchor.depth)
        {
            self.advance();
        }
    }

    pub(crate) fn is_next_statement(&self) -> bool {
        matches!(
            self.peek_at(1).text.as_str(),
            "let" | "call" | "arg" | "new" | "return"
        )
    }

    pub(crate) fn is_next_declaration(&self) -> bool {
        matches!(
            self.peek_at(1).text.as_str(),
            "function" | "class" | "ctor" | "dtor"
        )
    }

    /// Report an error at the current token. Exhausted input downgrades
    /// the kind to the end-of-file diagnostic.
    pub(crate) fn error_at_cursor(&mut self, kind: DiagnosticKind, message: &str) {
        let token = self.peek().clone();
        let kind = if token.kind == TokenKind::EndOfFile {
            DiagnosticKind::UnexpectedEndOfFile
        } else {
            kind
        };
        self.reporter.error(kind, &token, message);
    }

    pub(crate) fn reporter(&mut self) -> &mut Reporter {
        self.reporter
    }
}
