//! Tokenizer for the expression sublanguage
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use super::error::ExpressionError;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Token kinds produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Integer(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Nil,
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Question,
    QuestionQuestion,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Bang,
    Eof,
}

/// A token with its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Integer(i) => write!(f, "{}", i),
            TokenKind::Float(x) => write!(f, "{}", x),
            TokenKind::Str(s) => write!(f, "{:?}", s),
            TokenKind::Ident(name) => write!(f, "{}", name),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Nil => write!(f, "nil"),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::Not => write!(f, "not"),
            TokenKind::In => write!(f, "in"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::QuestionQuestion => write!(f, "??"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Expression tokenizer
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenize the whole input; the last token is always [`TokenKind::Eof`]
    pub fn tokenize(mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ExpressionError> {
        self.skip_whitespace();

        let Some((position, ch)) = self.chars.next() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: self.input.len(),
            });
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '.' => {
                if self.peek_is(|c| c.is_ascii_digit()) {
                    return self.number(position);
                }
                TokenKind::Dot
            }
            '?' => {
                if self.eat('?') {
                    TokenKind::QuestionQuestion
                } else {
                    TokenKind::Question
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    return Err(ExpressionError::syntax(
                        "assignment is not supported, use '=='",
                        position,
                        "=",
                    ));
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::And
                } else {
                    return Err(ExpressionError::syntax("expected '&&'", position, "&"));
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::Or
                } else {
                    return Err(ExpressionError::syntax("expected '||'", position, "|"));
                }
            }
            '\'' | '"' => TokenKind::Str(self.string(position, ch)?),
            c if c.is_ascii_digit() => return self.number(position),
            c if c.is_alphabetic() || c == '_' || c == '$' => self.word(position),
            other => {
                return Err(ExpressionError::syntax(
                    "unexpected character",
                    position,
                    other.to_string(),
                ));
            }
        };

        Ok(Token { kind, position })
    }

    fn skip_whitespace(&mut self) {
        while self.peek_is(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn peek_is(&mut self, predicate: impl Fn(char) -> bool) -> bool {
        self.chars.peek().map(|&(_, c)| predicate(c)).unwrap_or(false)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_is(|c| c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn number(&mut self, start: usize) -> Result<Token, ExpressionError> {
        let mut is_float = self.input[start..].starts_with('.');
        while self.peek_is(|c| c.is_ascii_digit() || c == '_') {
            self.chars.next();
        }
        if !is_float && self.peek_is(|c| c == '.') {
            // `1.foo` is not a float; only consume the dot when digits follow
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().map(|&(_, c)| c.is_ascii_digit()).unwrap_or(false) {
                is_float = true;
                self.chars.next();
                while self.peek_is(|c| c.is_ascii_digit() || c == '_') {
                    self.chars.next();
                }
            }
        }
        if self.peek_is(|c| c == 'e' || c == 'E') {
            is_float = true;
            self.chars.next();
            if self.peek_is(|c| c == '+' || c == '-') {
                self.chars.next();
            }
            if !self.peek_is(|c| c.is_ascii_digit()) {
                let found = self.offset();
                return Err(ExpressionError::syntax(
                    "malformed exponent",
                    found,
                    self.input[start..found].to_string(),
                ));
            }
            while self.peek_is(|c| c.is_ascii_digit()) {
                self.chars.next();
            }
        }

        let end = self.offset();
        let text: String = self.input[start..end].chars().filter(|&c| c != '_').collect();
        let kind = if is_float {
            text.parse::<f64>().map(TokenKind::Float).ok()
        } else {
            text.parse::<i64>().map(TokenKind::Integer).ok()
        };

        kind.map(|kind| Token {
            kind,
            position: start,
        })
        .ok_or_else(|| ExpressionError::syntax("invalid number literal", start, text))
    }

    fn string(&mut self, start: usize, quote: char) -> Result<String, ExpressionError> {
        let mut value = String::new();
        loop {
            let Some((position, ch)) = self.chars.next() else {
                return Err(ExpressionError::syntax(
                    "unterminated string literal",
                    start,
                    &self.input[start..],
                ));
            };
            match ch {
                c if c == quote => return Ok(value),
                '\\' => {
                    let Some((_, escaped)) = self.chars.next() else {
                        return Err(ExpressionError::syntax(
                            "unterminated escape sequence",
                            position,
                            "\\",
                        ));
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        '\\' | '\'' | '"' => value.push(escaped),
                        'u' => value.push(self.unicode_escape(position)?),
                        other => {
                            return Err(ExpressionError::syntax(
                                "unknown escape sequence",
                                position,
                                format!("\\{}", other),
                            ));
                        }
                    }
                }
                c => value.push(c),
            }
        }
    }

    fn unicode_escape(&mut self, position: usize) -> Result<char, ExpressionError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| ExpressionError::syntax("invalid \\u escape", position, "\\u"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code)
            .ok_or_else(|| ExpressionError::syntax("invalid unicode scalar", position, "\\u"))
    }

    fn word(&mut self, start: usize) -> TokenKind {
        while self.peek_is(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            self.chars.next();
        }
        let end = self.offset();
        match &self.input[start..end] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" | "null" => TokenKind::Nil,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            word => TokenKind::Ident(word.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a >= 1 && b != 'x' ?? c"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Ge,
                TokenKind::Integer(1),
                TokenKind::And,
                TokenKind::Ident("b".into()),
                TokenKind::NotEq,
                TokenKind::Str("x".into()),
                TokenKind::QuestionQuestion,
                TokenKind::Ident("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 1.5 .5 2e3 1_000"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Float(1.5),
                TokenKind::Float(0.5),
                TokenKind::Float(2000.0),
                TokenKind::Integer(1000),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_member_after_integer_is_not_float() {
        assert_eq!(
            kinds("a.0.b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Dot,
                TokenKind::Integer(0),
                TokenKind::Dot,
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b" 'it\'s' "é""#),
            vec![
                TokenKind::Str("a\"b".into()),
                TokenKind::Str("it's".into()),
                TokenKind::Str("é".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("not x and y or nil in z"),
            vec![
                TokenKind::Not,
                TokenKind::Ident("x".into()),
                TokenKind::And,
                TokenKind::Ident("y".into()),
                TokenKind::Or,
                TokenKind::Nil,
                TokenKind::In,
                TokenKind::Ident("z".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_errors_carry_position() {
        let err = Lexer::new("value # 1").tokenize().unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { position: 6, .. }));

        let err = Lexer::new("'open").tokenize().unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { position: 0, .. }));

        assert!(Lexer::new("a = b").tokenize().is_err());
    }
}
