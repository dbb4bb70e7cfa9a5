//! xmlang - a compiler for the XML-syntax xmlang language.
//!
//! This crate lowers xmlang source through a fixed pipeline: lexer,
//! parser, code generator and assembler, producing a binary image for
//! the LMX stack machine.

#![warn(clippy::all)]

pub mod ast;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod lexer;
pub mod parser;

// Re-export commonly used types
pub use ast::{dump_ast, Node};
pub use codegen::Compilation;
pub use config::Config;
pub use diagnostics::Reporter;
pub use lexer::{dump_tokens, tokenize, tokenize_source, Token, TokenKind};
pub use parser::{ParseError, Parser};
