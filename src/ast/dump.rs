//! Ordered JSON dump of the tree, a debugging side-channel behind
//! `--dump ast`.

use serde_json::{json, Value};

use super::{Decl, Expr, Node, Stmt};

pub fn dump_ast(node: &Node) -> Value {
    match node {
        Node::Decl(decl) => dump_decl(decl),
        Node::Stmt(stmt) => dump_stmt(stmt),
        Node::Expr(expr) => dump_expr(expr),
    }
}

fn dump_scope(scope: &[Node]) -> Value {
    Value::Array(scope.iter().map(dump_ast).collect())
}

fn dump_decl(decl: &Decl) -> Value {
    match decl {
        Decl::Program(program) => json!({
            "program": {
                "scope": dump_scope(&program.scope),
            }
        }),
        Decl::Function(function) => json!({
            "function": {
                "name": function.name,
                "result": function.result,
                "parameters": function
                    .parameters
                    .iter()
                    .map(|(name, ty)| json!({ "name": name, "type": ty }))
                    .collect::<Vec<_>>(),
                "scope": dump_scope(&function.scope),
            }
        }),
        Decl::Class(class) => json!({
            "class": {
                "name": class.name,
                "inherits": class.inherits,
                "scope": dump_scope(&class.scope),
            }
        }),
    }
}

fn dump_stmt(stmt: &Stmt) -> Value {
    match stmt {
        Stmt::Call(call) => json!({
            "call": {
                "who": call.who,
                "arguments": dump_scope(&call.arguments),
            }
        }),
        Stmt::Arg(arg) => json!({
            "arg": {
                "value": dump_ast(&arg.value),
            }
        }),
        Stmt::Let(binding) => json!({
            "let": {
                "name": binding.name,
                "type": binding.ty,
                "value": dump_ast(&binding.value),
            }
        }),
        Stmt::Return(ret) => json!({
            "return": {
                "type": ret.ty,
                "value": match &ret.value {
                    Some(value) => dump_ast(value),
                    None => json!("none"),
                },
            }
        }),
        Stmt::If(branch) => json!({
            "if": {
                "condition": dump_ast(&branch.condition),
                "true-branch": dump_scope(&branch.true_branch),
                "false-branch": dump_scope(&branch.false_branch),
            }
        }),
    }
}

fn dump_expr(expr: &Expr) -> Value {
    match expr {
        Expr::Literal { value, .. } => json!({
            "literal": { "value": value }
        }),
        Expr::Arithmetic { value, .. } => json!({
            "arithmetic": { "value": dump_ast(value) }
        }),
        Expr::Logical { value, .. } => json!({
            "logical": { "value": dump_ast(value) }
        }),
    }
}
