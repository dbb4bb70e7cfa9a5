//! Diagnostics shared by the parser and the code generator.
//!
//! A diagnostic is a kind plus one span per related token; rendering
//! shows the offending source line with the token highlighted and a caret
//! underline. The reporter also latches whether any error was emitted,
//! which decides the compiler's "give up" path.

use std::fmt;

use crate::lexer::Token;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const RESET: &str = "\x1b[00m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnexpectedTokenReached,
    ExpectedTokenMissing,
    EnclosingTokenMissing,
    EnclosingTokenMismatch,
    UnexpectedEndOfFile,
    MissingReturnStatement,
    MismatchingArgumentCount,
    MismatchingArgumentType,
    UnexpectedTokenPosition,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::UnexpectedTokenPosition => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticKind::UnexpectedTokenReached => "unexpected token",
            DiagnosticKind::ExpectedTokenMissing => "missing expected token",
            DiagnosticKind::EnclosingTokenMissing => "missing enclosing token",
            DiagnosticKind::EnclosingTokenMismatch => "mismatching tokens found",
            DiagnosticKind::UnexpectedEndOfFile => "unexpected end of file",
            DiagnosticKind::MissingReturnStatement => "missing return statement",
            DiagnosticKind::MismatchingArgumentCount => "mismatching argument count",
            DiagnosticKind::MismatchingArgumentType => "mismatching argument type",
            DiagnosticKind::UnexpectedTokenPosition => "unexpected token position",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// One highlighted token with its free-form message.
#[derive(Debug, Clone)]
pub struct Label {
    pub token: Token,
    pub message: String,
}

impl Label {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        Self {
            token: token.clone(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub labels: Vec<Label>,
}

/// Renders diagnostics against the cached source lines and remembers what
/// was emitted. One reporter lives for one compilation.
pub struct Reporter {
    lines: Vec<String>,
    had_error: bool,
    emitted: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new(source: &str) -> Self {
        Self {
            lines: source.lines().map(str::to_string).collect(),
            had_error: false,
            emitted: Vec::new(),
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.emitted
    }

    /// Render the diagnostic to stdout and record it. Errors latch the
    /// failure flag; warnings do not.
    pub fn report(&mut self, kind: DiagnosticKind, labels: Vec<Label>) {
        let diagnostic = Diagnostic { kind, labels };

        if kind.severity() == Severity::Error {
            self.had_error = true;
        }

        print!("{}", self.render(&diagnostic));
        self.emitted.push(diagnostic);
    }

    pub fn error(&mut self, kind: DiagnosticKind, token: &Token, message: impl Into<String>) {
        self.report(kind, vec![Label::new(token, message)]);
    }

    pub fn warning(&mut self, kind: DiagnosticKind, token: &Token, message: impl Into<String>) {
        self.report(kind, vec![Label::new(token, message)]);
    }

    /// Render a diagnostic to text: coloured header, then one source
    /// excerpt per label.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();

        match diagnostic.kind.severity() {
            Severity::Error => out.push_str(&format!("{}[error]: {}", RED, RESET)),
            Severity::Warning => out.push_str(&format!("{}[warning]: {}", YELLOW, RESET)),
        }
        out.push_str(diagnostic.kind.description());
        out.push('\n');

        let caret_color = match diagnostic.kind.severity() {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };

        for label in &diagnostic.labels {
            self.render_label(label, caret_color, &mut out);
        }

        out.push('\n');
        out
    }

    fn render_label(&self, label: &Label, caret_color: &str, out: &mut String) {
        let token = &label.token;
        let line = self
            .lines
            .get(token.location.line)
            .map(String::as_str)
            .unwrap_or("");

        // The column is the token's last character, so the text before the
        // token ends at column+1-len.
        let before_end = (token.location.column + 1).saturating_sub(token.text.len());
        let before = line.get(..before_end).unwrap_or("");
        let after = if token.location.column > 0 {
            line.get(token.location.column + 1..).unwrap_or("")
        } else {
            ""
        };

        out.push('\n');
        out.push_str(&format!(
            "at {}:{}:{}\n",
            token.location.path.display(),
            token.location.line + 1,
            before.len() + 1
        ));
        out.push('\n');

        let trimmed = before.trim_start_matches(' ');

        out.push_str(&format!(
            "{}{:>4}{} | {}{}{}{}{}\n",
            GREEN,
            token.location.line + 1,
            RESET,
            trimmed,
            BLUE,
            token.text,
            RESET,
            after
        ));
        out.push_str(&format!(
            "     | {}{}{}{} {}\n",
            " ".repeat(trimmed.len()),
            caret_color,
            "^".repeat(token.text.len()),
            RESET,
            label.message
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;
    use crate::lexer::{tokenize_source, TokenKind};
    use std::path::Path;

    fn token_for(source: &str, text: &str) -> Token {
        tokenize_source(source, Path::new("test.xml"), &Dialect::default())
            .into_iter()
            .find(|t| t.text == text)
            .unwrap()
    }

    #[test]
    fn error_render_shows_location_and_carets() {
        let source = "<program>\n    <function name=\"f\">";
        let mut reporter = Reporter::new(source);
        let token = token_for(source, "function");

        reporter.error(
            DiagnosticKind::ExpectedTokenMissing,
            &token,
            "requires property 'result'",
        );

        assert!(reporter.had_error());
        let rendered = reporter.render(&reporter.diagnostics()[0]);
        assert!(rendered.contains("[error]: "));
        assert!(rendered.contains("missing expected token"));
        assert!(rendered.contains("at test.xml:2:6"));
        assert!(rendered.contains("^^^^^^^^"));
        assert!(rendered.contains("requires property 'result'"));
    }

    #[test]
    fn warning_does_not_latch_error_flag() {
        let source = "<function result=\"none\" name=\"f\">";
        let mut reporter = Reporter::new(source);
        let token = token_for(source, "name");

        reporter.warning(
            DiagnosticKind::UnexpectedTokenPosition,
            &token,
            "should appear in first",
        );

        assert!(!reporter.had_error());
        let rendered = reporter.render(&reporter.diagnostics()[0]);
        assert!(rendered.contains("[warning]: "));
        assert!(rendered.contains("unexpected token position"));
    }

    #[test]
    fn mismatch_renders_one_excerpt_per_label() {
        let source = "<function name=\"f\" result=\"none\">\n</program>";
        let mut reporter = Reporter::new(source);

        let tokens = tokenize_source(source, Path::new("test.xml"), &Dialect::default());
        let opening = tokens
            .iter()
            .find(|t| t.text == "function" && t.kind == TokenKind::Keyword)
            .unwrap();
        let closing = tokens
            .iter()
            .find(|t| t.text == "program" && t.kind == TokenKind::Keyword)
            .unwrap();

        reporter.report(
            DiagnosticKind::EnclosingTokenMismatch,
            vec![
                Label::new(opening, "this tag"),
                Label::new(closing, "does not match with this one"),
            ],
        );

        let rendered = reporter.render(&reporter.diagnostics()[0]);
        assert!(rendered.contains("at test.xml:1:2"));
        assert!(rendered.contains("at test.xml:2:3"));
        assert_eq!(rendered.matches("at test.xml").count(), 2);
    }
}
