//! Opening and closing tag parsing.

use crate::diagnostics::{DiagnosticKind, Label};
use crate::lexer::{Token, TokenKind};

use super::{Attempt, Failure, Parser};

/// One `name="value"` pair of an opening tag. Source order is preserved
/// so declaration-site positions can be validated.
#[derive(Debug, Clone)]
pub(crate) struct Property {
    pub name: Token,
    pub value: Token,
}

/// A parsed opening tag. Self-closed tags (`<return/>`) have no children
/// and no closing tag.
#[derive(Debug, Clone)]
pub(crate) struct OpeningTag {
    pub token: Token,
    pub properties: Vec<Property>,
    pub self_closed: bool,
}

impl OpeningTag {
    /// Look a property up by name, with its ordinal position.
    pub fn property(&self, name: &str) -> Option<(usize, &Property)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, property)| property.name.text == name)
    }

    /// The value text of a property, if present.
    pub fn property_value(&self, name: &str) -> Option<&Property> {
        self.property(name).map(|(_, property)| property)
    }
}

impl Parser<'_> {
    /// Consume `<` `keyword` (`name`) and the flat property list up to
    /// `>` or `/>`.
    pub(crate) fn parse_opening_tag(&mut self, name: &str) -> Attempt<OpeningTag> {
        if self.advance_if(TokenKind::LeftAngle).is_none() {
            self.error_at_cursor(
                DiagnosticKind::UnexpectedTokenReached,
                "was found instead of a '<'",
            );
            return Err(Failure);
        }

        let Some(tag) = self.advance_if_text(TokenKind::Keyword, name) else {
            self.error_at_cursor(
                DiagnosticKind::UnexpectedTokenReached,
                "was found instead of a tag",
            );
            return Err(Failure);
        };

        let mut properties = Vec::new();

        while self.cursor > 1
            && !self.expect(TokenKind::RightAngle)
            && !self.expect(TokenKind::Slash)
        {
            let Some(property_name) = self.advance_if(TokenKind::Property) else {
                self.error_at_cursor(
                    DiagnosticKind::UnexpectedTokenReached,
                    "was found instead of a property",
                );
                return Err(Failure);
            };

            if self.advance_if(TokenKind::Equal).is_none() {
                self.error_at_cursor(
                    DiagnosticKind::ExpectedTokenMissing,
                    "was found instead of equals",
                );
                return Err(Failure);
            }

            if self.advance_quote().is_none() {
                self.error_at_cursor(
                    DiagnosticKind::ExpectedTokenMissing,
                    "was found instead of quotes",
                );
                return Err(Failure);
            }

            let Some(value) = self.advance_if(TokenKind::Literal) else {
                self.error_at_cursor(
                    DiagnosticKind::UnexpectedTokenReached,
                    "was found instead of a property value",
                );
                return Err(Failure);
            };

            if self.advance_quote().is_none() {
                self.error_at_cursor(
                    DiagnosticKind::ExpectedTokenMissing,
                    "was found instead of quotes",
                );
                return Err(Failure);
            }

            properties.push(Property {
                name: property_name,
                value,
            });
        }

        let self_closed = self.advance_if(TokenKind::Slash).is_some();

        if self.advance_if(TokenKind::RightAngle).is_none() {
            self.error_at_cursor(
                DiagnosticKind::UnexpectedTokenReached,
                "was found instead of a '>'",
            );
            return Err(Failure);
        }

        Ok(OpeningTag {
            token: tag,
            properties,
            self_closed,
        })
    }

    /// Consume `<` `/` `keyword` `>`, where the keyword must repeat the
    /// opening tag's.
    pub(crate) fn parse_closing_tag(&mut self, opening: &Token) -> Attempt<()> {
        if self.advance_if(TokenKind::LeftAngle).is_none() {
            self.error_at_cursor(
                DiagnosticKind::UnexpectedTokenReached,
                "was found instead of a '<'",
            );
            return Err(Failure);
        }

        if self.advance_if(TokenKind::Slash).is_none() {
            self.error_at_cursor(
                DiagnosticKind::UnexpectedTokenReached,
                "was found instead of a '/'",
            );
            return Err(Failure);
        }

        let Some(closing) = self.advance_if(TokenKind::Keyword) else {
            self.error_at_cursor(
                DiagnosticKind::UnexpectedTokenReached,
                "was found instead of a tag",
            );
            return Err(Failure);
        };

        if closing.text != opening.text {
            self.reporter().report(
                DiagnosticKind::EnclosingTokenMismatch,
                vec![
                    Label::new(opening, "this tag"),
                    Label::new(&closing, "does not match with this one"),
                ],
            );
            return Err(Failure);
        }

        if self.advance_if(TokenKind::RightAngle).is_none() {
            self.error_at_cursor(
                DiagnosticKind::UnexpectedTokenReached,
                "was found instead of '>'",
            );
            return Err(Failure);
        }

        Ok(())
    }

    /// Either quote kind opens and closes a property value.
    fn advance_quote(&mut self) -> Option<Token> {
        self.advance_if(TokenKind::DoubleQuote)
            .or_else(|| self.advance_if(TokenKind::SingleQuote))
    }
}
