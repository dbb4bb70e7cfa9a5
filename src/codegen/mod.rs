//! Code generation for the LMX target.
//!
//! Two passes over the tree produce the textual `.data` and `.code`
//! segments; the assembler then turns that text into the binary image.
//! All symbol state lives in a per-invocation [`Compilation`], so the
//! compiler can run more than once per process.

pub mod assembler;
mod code;
mod data;

use std::fmt;

use rustc_hash::FxHashMap;

use crate::ast::{Decl, Function, Node};
use crate::diagnostics::Reporter;

pub use assembler::{assemble, AssembleError};

/// Callables provided by the VM runtime, referenced by ordinal.
pub const INTRINSICS: [&str; 3] = ["print", "println", "format"];

/// Symbol state of a single compilation run.
#[derive(Debug, Default)]
pub struct Compilation {
    /// Literal text or variable name → byte offset into the data segment.
    pub data_offsets: FxHashMap<String, u32>,
    /// Function block name (or `entrypoint`) → byte offset into the code
    /// segment; populated while the code segment is assembled.
    pub code_offsets: FxHashMap<String, u32>,
    /// Running size of the data segment during pass 1.
    pub(crate) data_bytes: u32,
}

impl Compilation {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub enum CodegenError {
    /// An interpolation or string argument referenced a name with no
    /// recorded slot or data offset.
    SymbolNotFound(String),
    /// A call site disagreed with its callee's declaration; the
    /// diagnostic has already been rendered.
    ArgumentMismatch,
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::SymbolNotFound(name) => write!(f, "undefined symbol '{}'", name),
            CodegenError::ArgumentMismatch => write!(f, "I give up. ( ; \u{03c9} ; )"),
        }
    }
}

impl std::error::Error for CodegenError {}

/// Lower the program to the concatenated segment text:
/// `.data` entries followed by the `.code` function blocks.
pub fn generate(
    ast: &Node,
    compilation: &mut Compilation,
    reporter: &mut Reporter,
) -> Result<String, CodegenError> {
    let mut text = String::from(".data\n\n");
    text.push_str(&data::generate(ast, compilation));
    text.push_str("\n\n.code\n\n");
    text.push_str(&code::generate(ast, compilation, reporter)?);
    Ok(text)
}

/// Lower the program and assemble it into a binary image.
pub fn compile(
    ast: &Node,
    compilation: &mut Compilation,
    reporter: &mut Reporter,
) -> Result<Vec<u8>, CompileError> {
    let text = generate(ast, compilation, reporter)?;
    Ok(assemble(&text, compilation)?)
}

/// Either half of the lowering can fail.
#[derive(Debug)]
pub enum CompileError {
    Codegen(CodegenError),
    Assemble(AssembleError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Codegen(e) => write!(f, "{}", e),
            CompileError::Assemble(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<CodegenError> for CompileError {
    fn from(e: CodegenError) -> Self {
        CompileError::Codegen(e)
    }
}

impl From<AssembleError> for CompileError {
    fn from(e: AssembleError) -> Self {
        CompileError::Assemble(e)
    }
}

/// Declared callables of the program: top-level functions plus class
/// members, keyed by name.
pub(crate) fn collect_functions(ast: &Node) -> FxHashMap<&str, &Function> {
    let mut functions = FxHashMap::default();

    if let Node::Decl(Decl::Program(program)) = ast {
        for node in &program.scope {
            match node {
                Node::Decl(Decl::Function(function)) => {
                    functions.insert(function.name.as_str(), function);
                }
                Node::Decl(Decl::Class(class)) => {
                    for member in &class.scope {
                        if let Some(function) = member.as_function() {
                            functions.insert(function.name.as_str(), function);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    functions
}
