//! Pass 2: code segment synthesis.
//!
//! Emits one block per declared function, then the `entrypoint` block
//! holding the program's statement-level calls. Argument lists are
//! checked against their callee's declaration on the way through.

use rustc_hash::FxHashMap;

use crate::ast::{interpolated_name, is_integer, Call, Decl, Function, Node, Stmt};
use crate::diagnostics::{DiagnosticKind, Reporter};

use super::{collect_functions, Compilation, CodegenError};

/// Variable slots of one scope: `let` statements in declaration order,
/// with their declared types.
struct Locals {
    slots: FxHashMap<String, (u32, String)>,
}

fn locals_of(scope: &[Node]) -> Locals {
    let mut slots = FxHashMap::default();
    let mut next = 0;

    for node in scope {
        if let Some(binding) = node.as_let() {
            slots.insert(binding.name.clone(), (next, binding.ty.clone()));
            next += 1;
        }
    }

    Locals { slots }
}

pub(super) fn generate(
    ast: &Node,
    compilation: &mut Compilation,
    reporter: &mut Reporter,
) -> Result<String, CodegenError> {
    let functions = collect_functions(ast);

    let Node::Decl(Decl::Program(program)) = ast else {
        return Ok(String::new());
    };

    let mut blocks = Vec::new();

    for node in &program.scope {
        match node {
            Node::Decl(Decl::Function(function)) => {
                blocks.push(emit_function(function, compilation, reporter, &functions)?);
            }
            Node::Decl(Decl::Class(class)) => {
                for member in class.scope.iter().filter_map(Node::as_function) {
                    blocks.push(emit_function(member, compilation, reporter, &functions)?);
                }
            }
            _ => {}
        }
    }

    let mut code = blocks.join("\n\n");
    if !code.is_empty() {
        code.push_str("\n\n");
    }
    code.push_str("entrypoint\n\n");

    let locals = locals_of(&program.scope);

    for node in &program.scope {
        if let Node::Stmt(Stmt::Call(call)) = node {
            code.push_str(&emit_call(call, compilation, reporter, &functions, &locals)?);
            code.push('\n');
        }
    }

    code.push_str("ret");
    Ok(code)
}

fn emit_function(
    function: &Function,
    compilation: &mut Compilation,
    reporter: &mut Reporter,
    functions: &FxHashMap<&str, &Function>,
) -> Result<String, CodegenError> {
    let locals = locals_of(&function.scope);

    let mut fragments = Vec::new();

    for node in &function.scope {
        if let Node::Stmt(stmt) = node {
            let fragment = emit_statement(stmt, compilation, reporter, functions, &locals)?;
            if !fragment.is_empty() {
                fragments.push(fragment);
            }
        }
    }

    Ok(format!("function {}\n\n{}", function.name, fragments.join("\n")))
}

fn emit_statement(
    stmt: &Stmt,
    compilation: &mut Compilation,
    reporter: &mut Reporter,
    functions: &FxHashMap<&str, &Function>,
    locals: &Locals,
) -> Result<String, CodegenError> {
    match stmt {
        Stmt::Let(binding) => {
            let Some(value) = binding.value.literal_value() else {
                return Ok(String::new());
            };
            let Some((slot, _)) = locals.slots.get(&binding.name) else {
                return Err(CodegenError::SymbolNotFound(binding.name.clone()));
            };

            match binding.ty.as_str() {
                "number" => Ok(format!("push {}\nstore scope[{}]", value, slot)),
                "string" => {
                    let offset = compilation
                        .data_offsets
                        .get(&binding.name)
                        .ok_or_else(|| CodegenError::SymbolNotFound(binding.name.clone()))?;
                    Ok(format!("load .data[{}]\nstore scope[{}]", offset, slot))
                }
                _ => Ok(String::new()),
            }
        }

        Stmt::Call(call) => emit_call(call, compilation, reporter, functions, locals),

        Stmt::Return(ret) => match ret.value.as_deref().and_then(Node::literal_value) {
            Some(text) => Ok(format!("{}\nret", emit_value(text, compilation, locals)?)),
            None => Ok("ret".to_string()),
        },

        // Arguments are emitted by their call; `if` is reserved and not
        // lowered.
        Stmt::Arg(_) | Stmt::If(_) => Ok(String::new()),
    }
}

fn emit_call(
    call: &Call,
    compilation: &mut Compilation,
    reporter: &mut Reporter,
    functions: &FxHashMap<&str, &Function>,
    locals: &Locals,
) -> Result<String, CodegenError> {
    if let Some(callee) = functions.get(call.who.as_str()) {
        check_arguments(call, callee, reporter, locals)?;
    }

    let mut lines = Vec::new();

    for argument in &call.arguments {
        if let Node::Stmt(Stmt::Arg(arg)) = argument {
            if let Some(text) = arg.value.literal_value() {
                lines.push(emit_value(text, compilation, locals)?);
            }
        }
    }

    lines.push(format!("call {}", call.who));

    // The result of a statement-level call is never used; drop it.
    if let Some(callee) = functions.get(call.who.as_str()) {
        if callee.result != "none" {
            lines.push("pop".to_string());
        }
    }

    Ok(lines.join("\n"))
}

/// One operand: integer literals push, interpolations load their slot,
/// anything else loads its data segment entry.
fn emit_value(
    text: &str,
    compilation: &Compilation,
    locals: &Locals,
) -> Result<String, CodegenError> {
    if is_integer(text) {
        return Ok(format!("push {}", text));
    }

    if let Some(name) = interpolated_name(text) {
        let (slot, _) = locals
            .slots
            .get(name)
            .ok_or_else(|| CodegenError::SymbolNotFound(name.to_string()))?;
        return Ok(format!("load scope[{}]", slot));
    }

    let offset = compilation
        .data_offsets
        .get(text)
        .ok_or_else(|| CodegenError::SymbolNotFound(text.to_string()))?;
    Ok(format!("load .data[{}]", offset))
}

fn check_arguments(
    call: &Call,
    callee: &Function,
    reporter: &mut Reporter,
    locals: &Locals,
) -> Result<(), CodegenError> {
    if call.arguments.len() != callee.parameters.len() {
        reporter.error(
            DiagnosticKind::MismatchingArgumentCount,
            &call.token,
            format!(
                "'{}' takes {} argument(s), but {} were given",
                call.who,
                callee.parameters.len(),
                call.arguments.len()
            ),
        );
        return Err(CodegenError::ArgumentMismatch);
    }

    for (argument, (name, ty)) in call.arguments.iter().zip(&callee.parameters) {
        let Node::Stmt(Stmt::Arg(arg)) = argument else {
            continue;
        };
        let Some(text) = arg.value.literal_value() else {
            continue;
        };
        let Some(inferred) = infer_type(text, locals) else {
            continue;
        };

        if inferred != *ty {
            reporter.error(
                DiagnosticKind::MismatchingArgumentType,
                &call.token,
                format!(
                    "'{}' expects a {} for '{}', but a {} was given",
                    call.who, ty, name, inferred
                ),
            );
            return Err(CodegenError::ArgumentMismatch);
        }
    }

    Ok(())
}

fn infer_type(text: &str, locals: &Locals) -> Option<String> {
    if is_integer(text) {
        return Some("number".to_string());
    }

    if let Some(name) = interpolated_name(text) {
        return locals.slots.get(name).map(|(_, ty)| ty.clone());
    }

    Some("string".to_string())
}
