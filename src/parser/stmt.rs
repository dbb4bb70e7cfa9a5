//! Statement parsing: `let`, `call`, `arg`, `return`, `if`/`else`.

use crate::ast::{Arg, Call, Expr, If, Let, Node, Return, Stmt};
use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;

use super::tag::OpeningTag;
use super::{Attempt, Failure, Parser};

impl Parser<'_> {
    /// Dispatch on the keyword behind the next `<`. `None` means the next
    /// tag is not a statement and the caller's scope ends here.
    pub(crate) fn parse_statement(&mut self) -> Attempt<Option<Node>> {
        match self.peek_at(1).text.as_str() {
            "let" => self.parse_let().map(Some),
            "call" => self.parse_call().map(Some),
            "return" => self.parse_return().map(Some),
            "if" => self.parse_if().map(Some),
            _ => Ok(None),
        }
    }

    /// Literals are the whole expression grammar; anything else is left
    /// for the caller to handle.
    pub(crate) fn parse_expression(&mut self) -> Attempt<Option<Node>> {
        if self.expect(TokenKind::Literal) {
            let token = self.advance();
            let value = token.text.clone();
            return Ok(Some(Expr::literal(token, value)));
        }

        Ok(None)
    }

    /// The value carried by a tag: its `value` property when present,
    /// otherwise inline text content.
    fn parse_value(&mut self, tag: &OpeningTag) -> Attempt<Option<Node>> {
        if let Some(property) = tag.property_value("value") {
            let token = property.value.clone();
            let text = token.text.clone();
            return Ok(Some(Expr::literal(token, text)));
        }

        if tag.self_closed {
            return Ok(None);
        }

        self.parse_expression()
    }

    fn parse_let(&mut self) -> Attempt<Node> {
        let tag = self.parse_opening_tag("let")?;

        let Some(name) = tag.property_value("name") else {
            self.reporter
                .error(DiagnosticKind::ExpectedTokenMissing, &tag.token, "requires property 'name'");
            return Err(Failure);
        };
        let name = name.value.text.clone();

        let Some(ty) = tag.property_value("type") else {
            self.reporter
                .error(DiagnosticKind::ExpectedTokenMissing, &tag.token, "requires property 'type'");
            return Err(Failure);
        };
        let ty = ty.value.text.clone();

        let Some(value) = self.parse_value(&tag)? else {
            self.error_at_cursor(
                DiagnosticKind::ExpectedTokenMissing,
                "was found instead of property 'value'",
            );
            return Err(Failure);
        };

        if !tag.self_closed {
            self.parse_closing_tag(&tag.token)?;
        }

        Ok(Node::Stmt(Stmt::Let(Let {
            token: tag.token,
            name,
            ty,
            value: Box::new(value),
        })))
    }

    fn parse_call(&mut self) -> Attempt<Node> {
        let tag = self.parse_opening_tag("call")?;

        let Some(who) = tag.property_value("who") else {
            self.reporter
                .error(DiagnosticKind::ExpectedTokenMissing, &tag.token, "requires property 'who'");
            return Err(Failure);
        };
        let who = who.value.text.clone();

        let mut arguments = Vec::new();

        if !tag.self_closed {
            while self.cursor > 0 && self.peek().depth > tag.token.depth {
                match self.parse_arg() {
                    Ok(argument) => arguments.push(argument),
                    Err(Failure) => self.synchronize(&tag.token),
                }
            }

            self.parse_closing_tag(&tag.token)?;
        }

        Ok(Node::Stmt(Stmt::Call(Call {
            token: tag.token,
            who,
            arguments,
        })))
    }

    fn parse_arg(&mut self) -> Attempt<Node> {
        let tag = self.parse_opening_tag("arg")?;

        let Some(value) = self.parse_value(&tag)? else {
            self.error_at_cursor(
                DiagnosticKind::ExpectedTokenMissing,
                "was found instead of 'value' property",
            );
            return Err(Failure);
        };

        if !tag.self_closed {
            self.parse_closing_tag(&tag.token)?;
        }

        Ok(Node::Stmt(Stmt::Arg(Arg {
            token: tag.token,
            value: Box::new(value),
        })))
    }

    fn parse_return(&mut self) -> Attempt<Node> {
        let tag = self.parse_opening_tag("return")?;

        // The return type is back-patched from the enclosing function.
        let value = self.parse_value(&tag)?;

        if !tag.self_closed {
            self.parse_closing_tag(&tag.token)?;
        }

        Ok(Node::Stmt(Stmt::Return(Return {
            token: tag.token,
            ty: String::new(),
            value: value.map(Box::new),
        })))
    }

    fn parse_if(&mut self) -> Attempt<Node> {
        let tag = self.parse_opening_tag("if")?;

        let Some(condition) = tag.property_value("condition") else {
            self.reporter.error(
                DiagnosticKind::ExpectedTokenMissing,
                &tag.token,
                "requires property 'condition'",
            );
            return Err(Failure);
        };
        let condition = Expr::literal(condition.value.clone(), condition.value.text.clone());

        let mut true_branch = Vec::new();

        if !tag.self_closed {
            while self.cursor > 0 && self.peek().depth > tag.token.depth {
                match self.parse_statement() {
                    Ok(Some(node)) => true_branch.push(node),
                    Ok(None) => break,
                    Err(Failure) => self.synchronize(&tag.token),
                }
            }

            self.parse_closing_tag(&tag.token)?;
        }

        let has_else = {
            let next = self.peek_at(1);
            next.kind == TokenKind::Keyword && next.text == "else"
        };
        let false_branch = if has_else {
            self.parse_else()?
        } else {
            Vec::new()
        };

        Ok(Node::Stmt(Stmt::If(If {
            token: tag.token,
            condition: Box::new(condition),
            true_branch,
            false_branch,
        })))
    }

    fn parse_else(&mut self) -> Attempt<Vec<Node>> {
        let tag = self.parse_opening_tag("else")?;

        let mut nodes = Vec::new();

        if !tag.self_closed {
            while self.cursor > 0 && self.peek().depth > tag.token.depth {
                match self.parse_statement() {
                    Ok(Some(node)) => nodes.push(node),
                    Ok(None) => break,
                    Err(Failure) => self.synchronize(&tag.token),
                }
            }

            self.parse_closing_tag(&tag.token)?;
        }

        Ok(nodes)
    }
}
