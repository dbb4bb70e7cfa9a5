//! Declaration parsing: `program`, `function`, `class`, `ctor`, `dtor`.

use crate::ast::{Call, Class, Decl, Function, Node, Program, Return, Stmt};
use crate::diagnostics::DiagnosticKind;

use super::tag::OpeningTag;
use super::{Attempt, Failure, Parser};

impl Parser<'_> {
    pub(crate) fn parse_declaration(&mut self) -> Attempt<Option<Node>> {
        match self.peek_at(1).text.as_str() {
            "function" => self.parse_function().map(Some),
            "class" => self.parse_class().map(Some),
            "ctor" => self.parse_member("ctor").map(Some),
            "dtor" => self.parse_member("dtor").map(Some),
            _ => Ok(None),
        }
    }

    /// The unique root. Children sit at exactly one depth step inside the
    /// tag; a `main` function gets a call to it appended to the scope.
    pub(crate) fn parse_program(&mut self) -> Attempt<Node> {
        let tag = self.parse_opening_tag("program")?;

        let mut scope = Vec::new();

        if !tag.self_closed {
            while self.cursor > 0 && self.peek().depth == tag.token.depth + 1 {
                match self.parse_scope_node() {
                    Ok(Some(node)) => scope.push(node),
                    Ok(None) => break,
                    Err(Failure) => self.synchronize(&tag.token),
                }
            }
        }

        let has_main = scope
            .iter()
            .any(|node| node.as_function().map(|f| f.name == "main").unwrap_or(false));

        if has_main {
            scope.push(Node::Stmt(Stmt::Call(Call {
                token: crate::lexer::Token::synthetic(),
                who: "main".to_string(),
                arguments: Vec::new(),
            })));
        }

        if !tag.self_closed {
            self.parse_closing_tag(&tag.token)?;
        }

        Ok(Node::Decl(Decl::Program(Program {
            token: tag.token,
            scope,
        })))
    }

    fn parse_function(&mut self) -> Attempt<Node> {
        let tag = self.parse_opening_tag("function")?;

        let name = self.required_property(&tag, "name", 0, "should appear in first")?;
        let result = self.required_property(&tag, "result", 1, "should appear in second")?;

        // Every other property is a parameter, in source order.
        let parameters = tag
            .properties
            .iter()
            .filter(|property| property.name.text != "name" && property.name.text != "result")
            .map(|property| (property.name.text.clone(), property.value.text.clone()))
            .collect();

        let mut function = Function {
            token: tag.token.clone(),
            name,
            result,
            parameters,
            scope: Vec::new(),
        };

        if !tag.self_closed {
            while self.cursor > 0 && self.peek().depth > tag.token.depth {
                match self.parse_statement() {
                    Ok(Some(node)) => function.scope.push(node),
                    Ok(None) => break,
                    Err(Failure) => self.synchronize(&tag.token),
                }
            }
        }

        self.fixup_returns(&mut function)?;

        if !tag.self_closed {
            self.parse_closing_tag(&tag.token)?;
        }

        Ok(Node::Decl(Decl::Function(function)))
    }

    /// `ctor` and `dtor` parse like result-less functions named after
    /// their tag; the enclosing class later prepends their `self`
    /// parameter.
    fn parse_member(&mut self, name: &str) -> Attempt<Node> {
        let tag = self.parse_opening_tag(name)?;

        let mut function = Function {
            token: tag.token.clone(),
            name: name.to_string(),
            result: "none".to_string(),
            parameters: Vec::new(),
            scope: Vec::new(),
        };

        if !tag.self_closed {
            while self.cursor > 0 && self.peek().depth > tag.token.depth {
                match self.parse_scope_node() {
                    Ok(Some(node)) => function.scope.push(node),
                    Ok(None) => break,
                    Err(Failure) => self.synchronize(&tag.token),
                }
            }
        }

        self.fixup_returns(&mut function)?;

        if !tag.self_closed {
            self.parse_closing_tag(&tag.token)?;
        }

        Ok(Node::Decl(Decl::Function(function)))
    }

    fn parse_class(&mut self) -> Attempt<Node> {
        let tag = self.parse_opening_tag("class")?;

        let name = self.required_property(&tag, "name", 0, "should appear in first")?;

        let inherits = match tag.property("inherits") {
            Some((position, property)) => {
                if position != 1 {
                    self.reporter.warning(
                        DiagnosticKind::UnexpectedTokenPosition,
                        &property.name,
                        "should appear in second",
                    );
                }
                property
                    .value
                    .text
                    .split(',')
                    .map(str::to_string)
                    .collect()
            }
            None => Vec::new(),
        };

        let mut scope = Vec::new();

        if !tag.self_closed {
            while self.cursor > 0 && self.peek().depth > tag.token.depth {
                match self.parse_scope_node() {
                    Ok(Some(node)) => scope.push(node),
                    Ok(None) => break,
                    Err(Failure) => self.synchronize(&tag.token),
                }
            }
        }

        Self::fixup_members(&mut scope, &name);

        if !tag.self_closed {
            self.parse_closing_tag(&tag.token)?;
        }

        Ok(Node::Decl(Decl::Class(Class {
            token: tag.token,
            name,
            inherits,
            scope,
        })))
    }

    /// A scope that admits both declarations and statements.
    fn parse_scope_node(&mut self) -> Attempt<Option<Node>> {
        if self.is_next_declaration() {
            self.parse_declaration()
        } else if self.is_next_statement() {
            self.parse_statement()
        } else {
            Ok(None)
        }
    }

    /// Required tag property with a declaration-site position; a wrong
    /// position is a warning, a missing property is fatal.
    fn required_property(
        &mut self,
        tag: &OpeningTag,
        name: &str,
        position: usize,
        position_message: &str,
    ) -> Attempt<String> {
        match tag.property(name) {
            None => {
                self.reporter.error(
                    DiagnosticKind::ExpectedTokenMissing,
                    &tag.token,
                    format!("requires property '{}'", name),
                );
                Err(Failure)
            }
            Some((found_at, property)) => {
                if found_at != position {
                    self.reporter.warning(
                        DiagnosticKind::UnexpectedTokenPosition,
                        &property.name,
                        position_message,
                    );
                }
                Ok(property.value.text.clone())
            }
        }
    }

    /// Back-patch the return type from the declared result, append the
    /// implicit empty return to result-less functions, and reject
    /// functions that promise a result without returning one.
    fn fixup_returns(&mut self, function: &mut Function) -> Attempt<()> {
        let result = function.result.clone();

        if let Some(ret) = function.scope.iter_mut().find_map(|node| match node {
            Node::Stmt(Stmt::Return(ret)) => Some(ret),
            _ => None,
        }) {
            ret.ty = result;
            return Ok(());
        }

        if function.result == "none" {
            function.scope.push(Node::Stmt(Stmt::Return(Return::empty())));
            return Ok(());
        }

        self.reporter.error(
            DiagnosticKind::MissingReturnStatement,
            &function.token,
            "expects a value to be returned, yet no <return> tag was found.",
        );
        Err(Failure)
    }

    /// Guarantee exactly one `ctor` and one `dtor` in a class scope, each
    /// with `(self, ClassName)` as first parameter. Missing ones are
    /// synthesized; the ctor leads the scope, the dtor follows it.
    fn fixup_members(scope: &mut Vec<Node>, class_name: &str) {
        let self_parameter = ("self".to_string(), class_name.to_string());

        let member_at = |scope: &[Node], name: &str| {
            scope.iter().position(|node| {
                node.as_function().map_or(false, |function| function.name == name)
            })
        };

        match member_at(scope, "ctor") {
            Some(index) => {
                if let Some(ctor) = scope[index].as_function_mut() {
                    ctor.parameters.insert(0, self_parameter.clone());
                }
            }
            None => {
                let mut ctor = Function::synthetic("ctor", "none");
                ctor.parameters.push(self_parameter.clone());
                ctor.scope.push(Node::Stmt(Stmt::Return(Return::empty())));
                scope.insert(0, Node::Decl(Decl::Function(ctor)));
            }
        }

        match member_at(scope, "dtor") {
            Some(index) => {
                if let Some(dtor) = scope[index].as_function_mut() {
                    dtor.parameters.insert(0, self_parameter);
                }
            }
            None => {
                let mut dtor = Function::synthetic("dtor", "none");
                dtor.parameters.push(self_parameter);
                dtor.scope.push(Node::Stmt(Stmt::Return(Return::empty())));
                let position = 1.min(scope.len());
                scope.insert(position, Node::Decl(Decl::Function(dtor)));
            }
        }
    }
}
