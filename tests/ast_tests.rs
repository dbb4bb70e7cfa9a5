//! Parse-level tests: tree shape, fixups and property validation.

mod common;

use common::*;

use xmlang::ast::{Decl, Node, Stmt};
use xmlang::diagnostics::DiagnosticKind;

fn program_scope(node: &Node) -> &[Node] {
    match node {
        Node::Decl(Decl::Program(program)) => &program.scope,
        other => panic!("expected program at the root, got {:?}", other),
    }
}

#[test]
fn root_is_always_a_program() {
    let (ast, _) = parse_success("<program>\n</program>");
    assert!(program_scope(&ast).is_empty());
}

#[test]
fn main_presence_appends_a_call_to_it() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <function name=\"main\" result=\"none\">\n",
        "    </function>\n",
        "</program>",
    ));

    let scope = program_scope(&ast);
    match scope.last() {
        Some(Node::Stmt(Stmt::Call(call))) => {
            assert_eq!(call.who, "main");
            assert!(call.arguments.is_empty());
        }
        other => panic!("expected a synthesized call to main, got {:?}", other),
    }
}

#[test]
fn no_main_means_no_synthesized_call() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <function name=\"helper\" result=\"none\">\n",
        "    </function>\n",
        "</program>",
    ));

    assert_eq!(program_scope(&ast).len(), 1);
}

#[test]
fn resultless_function_ends_with_a_return() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <function name=\"f\" result=\"none\">\n",
        "        <call who=\"println\">\n",
        "            <arg value=\"hi\"/>\n",
        "        </call>\n",
        "    </function>\n",
        "</program>",
    ));

    let function = program_scope(&ast)[0].as_function().expect("function");
    assert!(function.scope.last().map(Node::is_return).unwrap_or(false));
}

#[test]
fn return_type_is_backpatched_from_the_result() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <function name=\"f\" result=\"number\">\n",
        "        <return value=\"5\"/>\n",
        "    </function>\n",
        "</program>",
    ));

    let function = program_scope(&ast)[0].as_function().expect("function");
    match &function.scope[0] {
        Node::Stmt(Stmt::Return(ret)) => {
            assert_eq!(ret.ty, "number");
            assert_eq!(ret.value.as_deref().and_then(Node::literal_value), Some("5"));
        }
        other => panic!("expected return, got {:?}", other),
    }
}

#[test]
fn function_parameters_keep_declaration_order() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <function name=\"add\" result=\"number\" a=\"number\" b=\"number\">\n",
        "        <return value=\"0\"/>\n",
        "    </function>\n",
        "</program>",
    ));

    let function = program_scope(&ast)[0].as_function().expect("function");
    assert_eq!(
        function.parameters,
        vec![
            ("a".to_string(), "number".to_string()),
            ("b".to_string(), "number".to_string()),
        ]
    );
}

#[test]
fn class_synthesizes_missing_ctor_and_dtor() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <class name=\"P\">\n",
        "    </class>\n",
        "</program>",
    ));

    let Node::Decl(Decl::Class(class)) = &program_scope(&ast)[0] else {
        panic!("expected class");
    };

    assert_eq!(class.scope.len(), 2);

    let ctor = class.scope[0].as_function().expect("ctor");
    assert_eq!(ctor.name, "ctor");
    assert_eq!(ctor.result, "none");
    assert_eq!(ctor.parameters, vec![("self".to_string(), "P".to_string())]);

    let dtor = class.scope[1].as_function().expect("dtor");
    assert_eq!(dtor.name, "dtor");
    assert_eq!(dtor.result, "none");
    assert_eq!(dtor.parameters, vec![("self".to_string(), "P".to_string())]);
}

#[test]
fn user_ctor_leads_the_scope_and_gains_self() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <class name=\"P\">\n",
        "        <ctor>\n",
        "        </ctor>\n",
        "    </class>\n",
        "</program>",
    ));

    let Node::Decl(Decl::Class(class)) = &program_scope(&ast)[0] else {
        panic!("expected class");
    };

    let ctor = class.scope[0].as_function().expect("ctor");
    assert_eq!(ctor.name, "ctor");
    assert_eq!(ctor.parameters[0], ("self".to_string(), "P".to_string()));
    // The parsed ctor still picks up the implicit empty return.
    assert!(ctor.scope.last().map(Node::is_return).unwrap_or(false));

    let dtor = class.scope[1].as_function().expect("dtor");
    assert_eq!(dtor.name, "dtor");
    assert_eq!(dtor.result, "none");
    assert_eq!(dtor.parameters, vec![("self".to_string(), "P".to_string())]);
}

#[test]
fn every_class_has_exactly_one_ctor_and_dtor() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <class name=\"Widget\">\n",
        "        <ctor>\n",
        "        </ctor>\n",
        "        <dtor>\n",
        "        </dtor>\n",
        "    </class>\n",
        "</program>",
    ));

    let Node::Decl(Decl::Class(class)) = &program_scope(&ast)[0] else {
        panic!("expected class");
    };

    let ctors = class
        .scope
        .iter()
        .filter_map(Node::as_function)
        .filter(|f| f.name == "ctor")
        .count();
    let dtors = class
        .scope
        .iter()
        .filter_map(Node::as_function)
        .filter(|f| f.name == "dtor")
        .count();

    assert_eq!(ctors, 1);
    assert_eq!(dtors, 1);
}

#[test]
fn class_inherits_splits_on_commas() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <class name=\"C\" inherits=\"A,B\">\n",
        "    </class>\n",
        "</program>",
    ));

    let Node::Decl(Decl::Class(class)) = &program_scope(&ast)[0] else {
        panic!("expected class");
    };
    assert_eq!(class.inherits, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn if_and_else_branches_are_captured() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <function name=\"f\" result=\"none\">\n",
        "        <let name=\"x\" type=\"number\" value=\"1\"/>\n",
        "        <if condition=\"${x}\">\n",
        "            <call who=\"println\">\n",
        "                <arg value=\"1\"/>\n",
        "            </call>\n",
        "        </if>\n",
        "        <else>\n",
        "            <call who=\"println\">\n",
        "                <arg value=\"2\"/>\n",
        "            </call>\n",
        "        </else>\n",
        "    </function>\n",
        "</program>",
    ));

    let function = program_scope(&ast)[0].as_function().expect("function");
    match &function.scope[1] {
        Node::Stmt(Stmt::If(branch)) => {
            assert_eq!(branch.condition.literal_value(), Some("${x}"));
            assert_eq!(branch.true_branch.len(), 1);
            assert_eq!(branch.false_branch.len(), 1);
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn misplaced_name_property_warns_but_still_binds() {
    let (ast, diagnostics) = parse_success(concat!(
        "<program>\n",
        "    <function result=\"none\" name=\"f\">\n",
        "    </function>\n",
        "</program>",
    ));

    let function = program_scope(&ast)[0].as_function().expect("function");
    assert_eq!(function.name, "f");
    assert_eq!(function.result, "none");

    let warnings: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnexpectedTokenPosition)
        .collect();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].labels[0].token.text, "name");
}

#[test]
fn ast_dump_nests_declarations_in_order() {
    let (ast, _) = parse_success(concat!(
        "<program>\n",
        "    <function name=\"main\" result=\"none\">\n",
        "        <let name=\"x\" type=\"number\" value=\"7\"/>\n",
        "    </function>\n",
        "</program>",
    ));

    let dump = xmlang::ast::dump_ast(&ast);
    let scope = dump["program"]["scope"].as_array().expect("scope array");
    assert_eq!(scope.len(), 2);
    assert_eq!(scope[0]["function"]["name"], "main");

    let body = scope[0]["function"]["scope"].as_array().expect("body");
    assert_eq!(body[0]["let"]["name"], "x");
    assert_eq!(body[0]["let"]["value"]["literal"]["value"], "7");
}
