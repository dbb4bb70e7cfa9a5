//! Lexer for the xmlang language.
//!
//! Tokenizes the XML-like surface syntax line by line, tracking the
//! indentation depth (in 4-space units) that the parser uses to bracket
//! nested scopes.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::config::Dialect;

/// Token kinds of the surface syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    LeftAngle,
    RightAngle,
    DoubleQuote,
    SingleQuote,
    Slash,
    Equal,
    Keyword,
    Literal,
    Property,
    #[default]
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LeftAngle => "left-angle",
            TokenKind::RightAngle => "right-angle",
            TokenKind::DoubleQuote => "double-quote",
            TokenKind::SingleQuote => "single-quote",
            TokenKind::Slash => "slash",
            TokenKind::Equal => "equal",
            TokenKind::Keyword => "keyword",
            TokenKind::Literal => "literal",
            TokenKind::Property => "property",
            TokenKind::EndOfFile => "end-of-file",
        };
        write!(f, "{}", name)
    }
}

/// Where a token came from. `column` is the index of the token's last
/// character on its line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
}

/// A token with its literal text, kind, location and indentation depth.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub location: Location,
    pub depth: usize,
}

impl Token {
    /// Placeholder token for nodes the parser synthesizes (implicit
    /// returns, ctor/dtor stubs, the appended `call main`).
    pub fn synthetic() -> Self {
        Token::default()
    }
}

/// An error that occurred while reading the source file.
#[derive(Debug)]
pub struct LexError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for LexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Tokenize a source file.
pub fn tokenize(path: &Path, dialect: &Dialect) -> Result<Vec<Token>, LexError> {
    let source = fs::read_to_string(path).map_err(|source| LexError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(tokenize_source(&source, path, dialect))
}

/// Tokenize source text. The returned sequence ends with a single
/// `EndOfFile` token and is reversed, so consumers read it by decrementing
/// a cursor index.
pub fn tokenize_source(source: &str, path: &Path, dialect: &Dialect) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line_count = 0;

    for (line_number, line) in source.lines().enumerate() {
        line_count = line_number + 1;
        scan_line(line, line_number, path, dialect, &mut tokens);
    }

    tokens.push(Token {
        text: "EOF".to_string(),
        kind: TokenKind::EndOfFile,
        location: Location {
            path: path.to_path_buf(),
            line: line_count.saturating_sub(1),
            column: 0,
        },
        depth: 0,
    });

    tokens.reverse();
    tokens
}

fn scan_line(
    line: &str,
    line_number: usize,
    path: &Path,
    dialect: &Dialect,
    tokens: &mut Vec<Token>,
) {
    let bytes = line.as_bytes();
    let mut depth = 0;
    let mut cursor = 0;

    while cursor < bytes.len() {
        // Runs of spaces only count toward depth when they are a whole
        // number of 4-space steps; depth keeps accumulating across runs on
        // the same line.
        let mut space = 0;
        while cursor < bytes.len() && bytes[cursor] == b' ' {
            space += 1;
            cursor += 1;
        }
        if space % 4 == 0 {
            depth += space / 4;
        }
        if cursor >= bytes.len() {
            break;
        }

        let emit = |text: &str, kind: TokenKind, column: usize| Token {
            text: text.to_string(),
            kind,
            location: Location {
                path: path.to_path_buf(),
                line: line_number,
                column,
            },
            depth,
        };

        match bytes[cursor] {
            b'<' => tokens.push(emit("<", TokenKind::LeftAngle, cursor)),
            b'>' => {
                tokens.push(emit(">", TokenKind::RightAngle, cursor));

                // Text content: an alphanumeric run after '>' is a literal
                // that extends up to the next angle bracket.
                if cursor + 1 < bytes.len() && bytes[cursor + 1].is_ascii_alphanumeric() {
                    cursor += 1;
                    let start = cursor;
                    while cursor + 1 < bytes.len()
                        && bytes[cursor + 1] != b'<'
                        && bytes[cursor + 1] != b'>'
                    {
                        cursor += 1;
                    }
                    tokens.push(emit(&line[start..=cursor], TokenKind::Literal, cursor));
                }
            }
            b'/' => tokens.push(emit("/", TokenKind::Slash, cursor)),
            b'=' => tokens.push(emit("=", TokenKind::Equal, cursor)),
            b'"' => {
                tokens.push(emit("\"", TokenKind::DoubleQuote, cursor));
                cursor = scan_quoted(line, cursor, b'"', line_number, path, depth, tokens);
            }
            b'\'' if dialect.single_quotes => {
                tokens.push(emit("'", TokenKind::SingleQuote, cursor));
                cursor = scan_quoted(line, cursor, b'\'', line_number, path, depth, tokens);
            }
            _ => {
                let start = cursor;
                while cursor + 1 < bytes.len() && !is_word_boundary(bytes[cursor + 1], dialect) {
                    cursor += 1;
                }
                let text = &line[start..=cursor];
                let kind = if dialect.is_keyword(text) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Property
                };
                tokens.push(emit(text, kind, cursor));
            }
        }

        cursor += 1;
    }
}

/// A literal run between quotes starts with an alphanumeric character or
/// one of the interpolation characters `$`, `{`, `}` and extends up to the
/// closing quote. Returns the position of the run's last character, or the
/// opening quote's position when no run follows.
fn scan_quoted(
    line: &str,
    quote: usize,
    terminator: u8,
    line_number: usize,
    path: &Path,
    depth: usize,
    tokens: &mut Vec<Token>,
) -> usize {
    let bytes = line.as_bytes();

    let starts_literal =
        |byte: u8| byte.is_ascii_alphanumeric() || byte == b'$' || byte == b'{' || byte == b'}';

    if !(quote + 1 < bytes.len() && starts_literal(bytes[quote + 1])) {
        return quote;
    }

    let mut cursor = quote + 1;
    let start = cursor;
    while cursor + 1 < bytes.len() && bytes[cursor + 1] != terminator {
        cursor += 1;
    }

    tokens.push(Token {
        text: line[start..=cursor].to_string(),
        kind: TokenKind::Literal,
        location: Location {
            path: path.to_path_buf(),
            line: line_number,
            column: cursor,
        },
        depth,
    });

    cursor
}

fn is_word_boundary(byte: u8, dialect: &Dialect) -> bool {
    matches!(byte, b' ' | b'=' | b'<' | b'>' | b'"') || (dialect.single_quotes && byte == b'\'')
}

/// Dump a token sequence as ordered JSON, one object per token.
pub fn dump_tokens(tokens: &[Token]) -> Value {
    Value::Array(
        tokens
            .iter()
            .map(|token| {
                json!({
                    "text": token.text,
                    "kind": token.kind.to_string(),
                    "location": {
                        "file": token.location.path.display().to_string(),
                        "line": token.location.line,
                        "column": token.location.column,
                    },
                    "depth": token.depth,
                })
            })
            .collect(),
    )
}
