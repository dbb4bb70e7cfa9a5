//! Pass 1: data segment synthesis.
//!
//! Walks the tree collecting every string literal the program needs at
//! runtime into length-prefixed entries, recording each one's byte offset
//! in the compilation context. Integer literals and bare interpolations
//! stay out of the segment.

use crate::ast::{is_integer, is_interpolation, rewrite_interpolations};
use crate::ast::{Decl, Node, Stmt};

use super::Compilation;

/// Produce the data segment entries, one `<length> <text>` line each, in
/// tree order.
pub(super) fn generate(ast: &Node, compilation: &mut Compilation) -> String {
    collect(ast, compilation).unwrap_or_default()
}

fn collect(node: &Node, compilation: &mut Compilation) -> Option<String> {
    match node {
        Node::Decl(decl) => {
            let scope = match decl {
                Decl::Program(program) => &program.scope,
                Decl::Function(function) => &function.scope,
                Decl::Class(class) => &class.scope,
            };
            join_entries(scope, compilation)
        }

        Node::Stmt(Stmt::Call(call)) => join_entries(&call.arguments, compilation),

        Node::Stmt(Stmt::Arg(arg)) => {
            let value = arg.value.literal_value()?;
            if is_integer(value) || is_interpolation(value) {
                return None;
            }
            // Mixed literals keep their original text as the lookup key;
            // the stored bytes use `{}` placeholders.
            let stored = rewrite_interpolations(value);
            Some(push_entry(compilation, value, stored))
        }

        Node::Stmt(Stmt::Let(binding)) => {
            if binding.ty != "string" {
                return None;
            }
            let value = binding.value.literal_value()?.to_string();
            Some(push_entry(compilation, &binding.name, value))
        }

        Node::Stmt(Stmt::Return(ret)) => {
            if ret.ty == "none" {
                return None;
            }
            let value = ret.value.as_deref()?.literal_value()?;
            if is_integer(value) || is_interpolation(value) {
                return None;
            }
            Some(push_entry(compilation, value, value.to_string()))
        }

        // Reserved statements and bare expressions carry no data.
        Node::Stmt(Stmt::If(_)) | Node::Expr(_) => None,
    }
}

fn join_entries(scope: &[Node], compilation: &mut Compilation) -> Option<String> {
    let entries: Vec<String> = scope
        .iter()
        .filter_map(|child| collect(child, compilation))
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries.join("\n"))
    }
}

/// Record `key` at the current byte offset and advance the counter by the
/// 4-byte length prefix plus the stored text.
fn push_entry(compilation: &mut Compilation, key: &str, stored: String) -> String {
    compilation
        .data_offsets
        .insert(key.to_string(), compilation.data_bytes);
    compilation.data_bytes += 4 + stored.len() as u32;
    format!("{} {}", stored.len(), stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;
    use crate::diagnostics::Reporter;
    use crate::lexer::tokenize_source;
    use crate::parser::Parser;
    use std::path::Path;

    fn data_segment(source: &str) -> (String, Compilation) {
        let tokens = tokenize_source(source, Path::new("test.xml"), &Dialect::default());
        let mut reporter = Reporter::new(source);
        let ast = Parser::parse(&tokens, &mut reporter).expect("parse error");
        let mut compilation = Compilation::new();
        let text = generate(&ast, &mut compilation);
        (text, compilation)
    }

    #[test]
    fn string_argument_is_length_prefixed() {
        let (text, compilation) = data_segment(concat!(
            "<program>\n",
            "    <function name=\"main\" result=\"none\">\n",
            "        <call who=\"println\">\n",
            "            <arg value=\"hello, world\"/>\n",
            "        </call>\n",
            "    </function>\n",
            "</program>",
        ));

        assert_eq!(text, "12 hello, world");
        assert_eq!(compilation.data_offsets.get("hello, world"), Some(&0));
    }

    #[test]
    fn integers_and_interpolations_contribute_nothing() {
        let (text, compilation) = data_segment(concat!(
            "<program>\n",
            "    <function name=\"main\" result=\"none\">\n",
            "        <let name=\"x\" type=\"number\" value=\"7\"/>\n",
            "        <call who=\"println\">\n",
            "            <arg value=\"${x}\"/>\n",
            "        </call>\n",
            "    </function>\n",
            "</program>",
        ));

        assert_eq!(text, "");
        assert!(compilation.data_offsets.is_empty());
    }

    #[test]
    fn string_let_is_keyed_by_name() {
        let (text, compilation) = data_segment(concat!(
            "<program>\n",
            "    <function name=\"main\" result=\"none\">\n",
            "        <let name=\"greeting\" type=\"string\" value=\"hi\"/>\n",
            "    </function>\n",
            "</program>",
        ));

        assert_eq!(text, "2 hi");
        assert_eq!(compilation.data_offsets.get("greeting"), Some(&0));
    }

    #[test]
    fn mixed_literal_stores_placeholders_but_keeps_its_key() {
        let (text, compilation) = data_segment(concat!(
            "<program>\n",
            "    <function name=\"main\" result=\"none\">\n",
            "        <let name=\"x\" type=\"number\" value=\"7\"/>\n",
            "        <call who=\"println\">\n",
            "            <arg value=\"x is ${x}!\"/>\n",
            "        </call>\n",
            "    </function>\n",
            "</program>",
        ));

        assert_eq!(text, "8 x is {}!");
        assert_eq!(compilation.data_offsets.get("x is ${x}!"), Some(&0));
        // The counter advances by what was actually stored.
        assert_eq!(compilation.data_bytes, 12);
    }

    #[test]
    fn offsets_accumulate_in_tree_order() {
        let (text, compilation) = data_segment(concat!(
            "<program>\n",
            "    <function name=\"main\" result=\"none\">\n",
            "        <call who=\"print\">\n",
            "            <arg value=\"one\"/>\n",
            "            <arg value=\"three\"/>\n",
            "        </call>\n",
            "    </function>\n",
            "</program>",
        ));

        assert_eq!(text, "3 one\n5 three");
        assert_eq!(compilation.data_offsets.get("one"), Some(&0));
        assert_eq!(compilation.data_offsets.get("three"), Some(&7));
    }
}
