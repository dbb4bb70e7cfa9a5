//! Test harness for compiling xmlang programs.
//!
//! Provides functions to run programs through the pipeline stage by
//! stage and to inspect the diagnostics each stage produced.

#![allow(dead_code)]

use std::path::Path;

use xmlang::ast::Node;
use xmlang::codegen::{self, Compilation};
use xmlang::config::Dialect;
use xmlang::diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use xmlang::lexer::{tokenize_source, Token};
use xmlang::parser::Parser;

/// Result of compiling an xmlang source string.
#[derive(Debug)]
pub enum CompileResult {
    Success {
        image: Vec<u8>,
        diagnostics: Vec<Diagnostic>,
    },
    ParseError {
        diagnostics: Vec<Diagnostic>,
    },
    CodegenError {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompileResult {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileResult::Success { diagnostics, .. } => diagnostics,
            CompileResult::ParseError { diagnostics } => diagnostics,
            CompileResult::CodegenError { diagnostics, .. } => diagnostics,
        }
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.diagnostics().iter().map(|d| d.kind).collect()
    }
}

pub fn lex(source: &str) -> Vec<Token> {
    tokenize_source(source, Path::new("test.xml"), &Dialect::default())
}

/// Compile a source string through all phases.
pub fn compile(source: &str) -> CompileResult {
    let tokens = lex(source);
    let mut reporter = Reporter::new(source);

    let ast = match Parser::parse(&tokens, &mut reporter) {
        Ok(ast) => ast,
        Err(_) => {
            return CompileResult::ParseError {
                diagnostics: reporter.diagnostics().to_vec(),
            }
        }
    };

    let mut compilation = Compilation::new();

    match codegen::compile(&ast, &mut compilation, &mut reporter) {
        Ok(image) => CompileResult::Success {
            image,
            diagnostics: reporter.diagnostics().to_vec(),
        },
        Err(error) => CompileResult::CodegenError {
            message: error.to_string(),
            diagnostics: reporter.diagnostics().to_vec(),
        },
    }
}

/// Compile and return the binary image, panicking on any error.
pub fn compile_success(source: &str) -> Vec<u8> {
    match compile(source) {
        CompileResult::Success { image, .. } => image,
        CompileResult::ParseError { diagnostics } => {
            panic!("parse error: {:?}", diagnostics)
        }
        CompileResult::CodegenError { message, .. } => panic!("codegen error: {}", message),
    }
}

/// Parse only, returning the tree and any warnings.
pub fn parse_success(source: &str) -> (Node, Vec<Diagnostic>) {
    let tokens = lex(source);
    let mut reporter = Reporter::new(source);
    let ast = Parser::parse(&tokens, &mut reporter).expect("parse error");
    (ast, reporter.diagnostics().to_vec())
}

/// Parse only, expecting a failure; returns the diagnostics.
pub fn parse_failure(source: &str) -> Vec<Diagnostic> {
    let tokens = lex(source);
    let mut reporter = Reporter::new(source);
    assert!(
        Parser::parse(&tokens, &mut reporter).is_err(),
        "expected parsing to fail"
    );
    reporter.diagnostics().to_vec()
}

/// Lower a source string to its textual segments.
pub fn generate_success(source: &str) -> String {
    let (ast, _) = parse_success(source);
    let mut reporter = Reporter::new(source);
    let mut compilation = Compilation::new();
    codegen::generate(&ast, &mut compilation, &mut reporter).expect("codegen error")
}
