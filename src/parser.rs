use crate::{
    ast::{Expr, Token, TokenKind},
    grammar::Grammar,
    value::Value,
};

/// Errors raised while building a syntax tree from tokens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("token `{found}` unexpected at position {position}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        position: usize,
    },

    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEof { expected: String },

    /// `.name` used where there is no filtered element to read from
    #[error("relative identifier `.{name}` used outside of a filter")]
    RelativeOutsideFilter { name: String },

    #[error("expression nested too deeply at position {position}")]
    TooDeep { position: usize },
}

/// Deepest nesting of groups, operators, postfix steps and literals the
/// parser accepts. Parsing and evaluation both recurse once per level.
pub const MAX_DEPTH: usize = 64;

/// Precedence-climbing parser driven by the grammar's operator table.
///
/// Binding, loosest first:
///
/// 1. conditional `test ? a : b` and `test ?: b`
/// 2. binary operators, by registered precedence, left associative
/// 3. prefix operators
/// 4. postfix chain: member `.name`, filter `[expr]`, transform `|name(args)`
/// 5. primaries: literals, identifiers, calls, groups, array and object
///    literals, relative identifiers
pub struct Parser<'g> {
    tokens: Vec<Token>,
    position: usize,
    grammar: &'g Grammar,
    eof: Token,
    depth: usize,
}

impl<'g> Parser<'g> {
    pub fn new(tokens: Vec<Token>, grammar: &'g Grammar) -> Self {
        let end = tokens.last().map_or(0, |t| t.position + t.raw.chars().count());
        Parser {
            tokens,
            position: 0,
            grammar,
            eof: Token::new(TokenKind::Eof, "", end),
            depth: 0,
        }
    }

    /// Parses the whole token sequence as one expression.
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        if self.current().kind != TokenKind::Eof {
            return Err(self.unexpected("end of expression"));
        }
        check_relative(&expr, false)?;
        Ok(expr)
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.position + 1)
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        match token.kind {
            TokenKind::Eof => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
            _ => ParseError::UnexpectedToken {
                found: token.describe(),
                expected: expected.to_string(),
                position: token.position,
            },
        }
    }

    /// Goes one level deeper, failing past [`MAX_DEPTH`].
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                position: self.current().position,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Runs `f` one level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let depth = self.depth;
        let result = self.descend().and_then(|()| f(self));
        self.depth = depth;
        result
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_conditional)
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.parse_binary(i64::MIN)?;
        if !self.check(&TokenKind::Question) {
            return Ok(test);
        }
        self.advance();

        let consequent = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_expression()?;

        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent,
            alternate: Box::new(alternate),
        })
    }

    /// Folds binary operators whose precedence is at least `min_precedence`.
    ///
    /// The threshold is wider than a precedence so that `precedence + 1`
    /// never saturates and ties always fold left.
    fn parse_binary(&mut self, min_precedence: i64) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_unary()?;

        while let TokenKind::BinaryOp(symbol) = &self.current().kind {
            let Some(op) = self.grammar.binary_op(symbol) else {
                return Err(self.unexpected("binary operator"));
            };
            let precedence = i64::from(op.precedence);
            if precedence < min_precedence {
                break;
            }
            let symbol = symbol.clone();
            // each fold puts the tree built so far one level down
            self.descend()?;
            self.advance();

            let right = self.parse_binary(precedence + 1)?;
            left = Expr::BinaryOp {
                op: symbol,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = depth;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if let TokenKind::UnaryOp(symbol) = &self.current().kind {
            if self.grammar.unary_op(symbol).is_none() {
                return Err(self.unexpected("operand"));
            }
            let op = symbol.clone();
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut expr = self.parse_primary()?;

        loop {
            let kind = self.current().kind.clone();
            if matches!(kind, TokenKind::Dot | TokenKind::OpenBracket | TokenKind::Pipe) {
                self.descend()?;
            }
            match kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.expect_identifier()?;
                    let relative = expr.is_relative_path();
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        relative,
                    };
                }
                TokenKind::OpenBracket => {
                    self.advance();
                    let predicate = self.parse_expression()?;
                    self.expect(TokenKind::CloseBracket)?;
                    let relative = predicate.references_relative();
                    expr = Expr::Filter {
                        subject: Box::new(expr),
                        predicate: Box::new(predicate),
                        relative,
                    };
                }
                TokenKind::Pipe => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    let args = if self.check(&TokenKind::OpenParen) {
                        self.parse_args()?
                    } else {
                        Vec::new()
                    };
                    expr = Expr::Transform {
                        name,
                        subject: Box::new(expr),
                        args,
                    };
                }
                _ => {
                    self.depth = depth;
                    return Ok(expr);
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current().kind.clone() {
            TokenKind::Literal(value) => {
                self.advance();
                Ok(Expr::Literal(value))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::OpenParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::FunctionCall { name, args })
                } else {
                    Ok(Expr::Identifier(name))
                }
            }
            TokenKind::Dot if matches!(self.peek(), TokenKind::Identifier(_)) => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Expr::RelativeIdentifier(name))
            }
            TokenKind::OpenParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::CloseParen)?;
                Ok(expr)
            }
            TokenKind::OpenBracket => self.parse_array_literal(),
            TokenKind::OpenBrace => self.parse_object_literal(),
            _ => Err(self.unexpected("operand")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::OpenBracket)?;
        let items = self.parse_list(TokenKind::CloseBracket)?;
        Ok(Expr::Array(items))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::OpenBrace)?;
        let mut entries = Vec::new();

        while !self.check(&TokenKind::CloseBrace) {
            let key = match self.current().kind.clone() {
                TokenKind::Identifier(name) => name,
                TokenKind::Literal(Value::String(s)) => s,
                _ => return Err(self.unexpected("object key")),
            };
            self.advance();
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));

            if !self.check(&TokenKind::CloseBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(TokenKind::CloseBrace)?;
        Ok(Expr::Object(entries))
    }

    /// Parses `( expr, ... )`.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(TokenKind::OpenParen)?;
        self.parse_list(TokenKind::CloseParen)
    }

    /// Comma separated expressions up to and including `close`.
    fn parse_list(&mut self, close: TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.check(&close) {
            items.push(self.parse_expression()?);
            if !self.check(&close) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(close)?;
        Ok(items)
    }
}

/// Rejects relative identifiers that are not inside a filter predicate.
fn check_relative(expr: &Expr, in_filter: bool) -> Result<(), ParseError> {
    match expr {
        Expr::RelativeIdentifier(name) if !in_filter => Err(ParseError::RelativeOutsideFilter {
            name: name.clone(),
        }),
        Expr::Literal(_) | Expr::Identifier(_) | Expr::RelativeIdentifier(_) => Ok(()),
        Expr::Member { object, .. } => check_relative(object, in_filter),
        Expr::Filter {
            subject, predicate, ..
        } => {
            check_relative(subject, in_filter)?;
            check_relative(predicate, true)
        }
        Expr::Array(items) => items.iter().try_for_each(|e| check_relative(e, in_filter)),
        Expr::Object(entries) => entries
            .iter()
            .try_for_each(|(_, e)| check_relative(e, in_filter)),
        Expr::UnaryOp { operand, .. } => check_relative(operand, in_filter),
        Expr::BinaryOp { left, right, .. } => {
            check_relative(left, in_filter)?;
            check_relative(right, in_filter)
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            check_relative(test, in_filter)?;
            if let Some(consequent) = consequent {
                check_relative(consequent, in_filter)?;
            }
            check_relative(alternate, in_filter)
        }
        Expr::FunctionCall { args, .. } => args.iter().try_for_each(|e| check_relative(e, in_filter)),
        Expr::Transform { subject, args, .. } => {
            check_relative(subject, in_filter)?;
            args.iter().try_for_each(|e| check_relative(e, in_filter))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(input: &str) -> Result<Expr, ParseError> {
        let grammar = Grammar::default();
        let tokens = Lexer::new(input, &grammar).tokenize().unwrap();
        Parser::new(tokens, &grammar).parse()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        let Expr::BinaryOp { op, right, .. } = expr else {
            panic!("expected binary op");
        };
        assert_eq!(op, "+");
        assert!(matches!(*right, Expr::BinaryOp { ref op, .. } if op == "*"));
    }

    #[test]
    fn test_left_associative() {
        let expr = parse("8 - 4 - 2").unwrap();
        let Expr::BinaryOp { left, right, .. } = expr else {
            panic!("expected binary op");
        };
        assert!(matches!(*left, Expr::BinaryOp { .. }));
        assert_eq!(*right, Expr::Literal(Value::Integer(2)));
    }

    #[test]
    fn test_elvis_has_no_consequent() {
        let expr = parse("a ?: b").unwrap();
        assert!(matches!(expr, Expr::Conditional { consequent: None, .. }));
    }

    #[test]
    fn test_relative_outside_filter() {
        assert!(matches!(
            parse(".a + 1"),
            Err(ParseError::RelativeOutsideFilter { name }) if name == "a"
        ));
    }

    #[test]
    fn test_unbalanced_group() {
        assert!(matches!(parse("(1 + 2"), Err(ParseError::UnexpectedEof { .. })));
        assert!(matches!(parse("1 + 2)"), Err(ParseError::UnexpectedToken { .. })));
    }
}
