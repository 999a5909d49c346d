//! Recursive descent parser for the expression sublanguage
//!
//! Precedence, lowest first:
//!
//! | level        | operators                       |
//! |--------------|---------------------------------|
//! | conditional  | `c ? a : b`                     |
//! | coalesce     | `??`                            |
//! | or           | `\|\|`, `or`                    |
//! | and          | `&&`, `and`                     |
//! | equality     | `==`, `!=`                      |
//! | comparison   | `<`, `<=`, `>`, `>=`, `in`      |
//! | additive     | `+`, `-`                        |
//! | multiplicative | `*`, `/`, `%`                 |
//! | unary        | `!`, `not`, `-`                 |
//! | postfix      | `.name`, `[index]`, `(args)`    |
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use super::ast::{BinaryOperator, Expr, UnaryOperator};
use super::error::ExpressionError;
use super::lexer::{Lexer, Token, TokenKind};
use serde_json::Value;

/// Limit on nesting plus chained operands, guarding every recursive walk
const MAX_DEPTH: usize = 128;

/// Expression parser over a token stream
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    /// Tokenize `input` and prepare a parser for it
    pub fn new(input: &str) -> Result<Self, ExpressionError> {
        if input.trim().is_empty() {
            return Err(ExpressionError::Empty);
        }
        Ok(Self {
            tokens: Lexer::new(input).tokenize()?,
            current: 0,
            depth: 0,
        })
    }

    /// Parse a complete expression, rejecting trailing tokens
    pub fn parse(mut self) -> Result<Expr, ExpressionError> {
        let expr = self.parse_expression()?;
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            return Err(ExpressionError::syntax(
                "unexpected token after expression",
                token.position,
                token.kind.to_string(),
            ));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expr, ExpressionError> {
        let entry = self.depth;
        let result = self.descend().and_then(|()| self.parse_conditional());
        // operands folded at this level are released with it
        self.depth = entry;
        result
    }

    /// Count one more level of tree height against [`MAX_DEPTH`]
    ///
    /// Called for every nested expression and every operand folded into a
    /// left-deep chain, so `1 + 1 + ...` is bounded like `((1) + 1) ...`.
    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let position = self.peek().position;
            return Err(ExpressionError::syntax(
                "expression nested too deeply",
                position,
                "",
            ));
        }
        Ok(())
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExpressionError> {
        let condition = self.parse_coalesce()?;
        if !self.matches(&TokenKind::Question) {
            return Ok(condition);
        }
        let then_branch = self.parse_expression()?;
        self.expect(&TokenKind::Colon, "':' in conditional expression")?;
        let else_branch = self.parse_expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_coalesce(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_or()?;
        while self.matches(&TokenKind::QuestionQuestion) {
            self.descend()?;
            let right = self.parse_or()?;
            expr = binary(expr, BinaryOperator::Coalesce, right);
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_and()?;
        while self.matches(&TokenKind::Or) {
            self.descend()?;
            let right = self.parse_and()?;
            expr = binary(expr, BinaryOperator::Or, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_equality()?;
        while self.matches(&TokenKind::And) {
            self.descend()?;
            let right = self.parse_equality()?;
            expr = binary(expr, BinaryOperator::And, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_comparison()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::EqEq => BinaryOperator::Equal,
                TokenKind::NotEq => BinaryOperator::NotEqual,
                _ => return Ok(expr),
            };
            self.advance();
            self.descend()?;
            let right = self.parse_comparison()?;
            expr = binary(expr, operator, right);
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_additive()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Lt => BinaryOperator::LessThan,
                TokenKind::Le => BinaryOperator::LessThanOrEqual,
                TokenKind::Gt => BinaryOperator::GreaterThan,
                TokenKind::Ge => BinaryOperator::GreaterThanOrEqual,
                TokenKind::In => BinaryOperator::In,
                _ => return Ok(expr),
            };
            self.advance();
            self.descend()?;
            let right = self.parse_additive()?;
            expr = binary(expr, operator, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => return Ok(expr),
            };
            self.advance();
            self.descend()?;
            let right = self.parse_multiplicative()?;
            expr = binary(expr, operator, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_unary()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Modulo,
                _ => return Ok(expr),
            };
            self.advance();
            self.descend()?;
            let right = self.parse_unary()?;
            expr = binary(expr, operator, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        let operator = match self.peek().kind {
            TokenKind::Bang | TokenKind::Not => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Negate,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let entry = self.depth;
        let operand = self.descend().and_then(|()| self.parse_unary());
        self.depth = entry;
        Ok(Expr::Unary {
            operator,
            operand: Box::new(operand?),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    self.descend()?;
                    let token = self.advance();
                    let property = match token.kind {
                        TokenKind::Ident(name) => name,
                        TokenKind::Integer(i) if i >= 0 => i.to_string(),
                        // keywords are valid property names after a dot
                        TokenKind::True
                        | TokenKind::False
                        | TokenKind::Nil
                        | TokenKind::And
                        | TokenKind::Or
                        | TokenKind::Not
                        | TokenKind::In => token.kind.to_string(),
                        other => {
                            return Err(unexpected(token.position, &other, "property name"));
                        }
                    };
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.descend()?;
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen => {
                    let position = self.advance().position;
                    let function = match expr {
                        Expr::Ident(name) => name,
                        other => {
                            return Err(ExpressionError::NotCallable {
                                callee: format!("{} (at position {})", other, position),
                            });
                        }
                    };
                    let args = self.parse_list(&TokenKind::RParen)?;
                    expr = Expr::Call { function, args };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Integer(i) => Ok(Expr::Literal(Value::from(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(crate::value::number(f))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::String(s))),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::Nil => Ok(Expr::Literal(Value::Null)),
            TokenKind::Ident(name) => Ok(Expr::Ident(name)),
            TokenKind::LParen => {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => Ok(Expr::Array(self.parse_list(&TokenKind::RBracket)?)),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::Eof => Err(ExpressionError::unexpected_end("expected a value")),
            other => Err(unexpected(token.position, &other, "a value")),
        }
    }

    /// Comma separated expressions up to `close`; a trailing comma is allowed
    fn parse_list(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ExpressionError> {
        let mut items = Vec::new();
        if self.matches(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.matches(close) {
                return Ok(items);
            }
            self.expect(&TokenKind::Comma, "',' or closing delimiter")?;
            if self.matches(close) {
                return Ok(items);
            }
        }
    }

    fn parse_object(&mut self) -> Result<Expr, ExpressionError> {
        let mut entries = Vec::new();
        if self.matches(&TokenKind::RBrace) {
            return Ok(Expr::Object(entries));
        }
        loop {
            let token = self.advance();
            let key = match token.kind {
                TokenKind::Ident(name) => name,
                TokenKind::Str(s) => s,
                TokenKind::Integer(i) => i.to_string(),
                other => return Err(unexpected(token.position, &other, "object key")),
            };
            self.expect(&TokenKind::Colon, "':' after object key")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if self.matches(&TokenKind::RBrace) {
                return Ok(Expr::Object(entries));
            }
            self.expect(&TokenKind::Comma, "',' or '}'")?;
            if self.matches(&TokenKind::RBrace) {
                return Ok(Expr::Object(entries));
            }
        }
    }

    fn peek(&self) -> &Token {
        // the token list always ends with Eof and we never advance past it
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<(), ExpressionError> {
        if self.matches(kind) {
            return Ok(());
        }
        let token = self.peek();
        Err(unexpected(token.position, &token.kind, expected))
    }
}

fn binary(left: Expr, operator: BinaryOperator, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

fn unexpected(position: usize, found: &TokenKind, expected: &str) -> ExpressionError {
    if *found == TokenKind::Eof {
        return ExpressionError::unexpected_end(format!("expected {}", expected));
    }
    ExpressionError::syntax(format!("expected {}", expected), position, found.to_string())
}

/// Parse `input` into an expression tree
pub fn parse(input: &str) -> Result<Expr, ExpressionError> {
    Parser::new(input)?.parse()
}
