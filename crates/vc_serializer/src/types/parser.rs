use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::iter::Peekable;

use crate::types::{Lexer, Token, TokenKind, Type, TypeParam};

// -----------------------------------------------------------------------------
// SyntaxError

/// A type expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// The whole input.
    pub input: String,
    /// Text of the offending token, `None` at the end of the input.
    pub token: Option<String>,
    /// Kind of the offending token, `None` at the end of the input.
    pub kind: Option<TokenKind>,
    /// Position in characters.
    pub offset: usize,
    /// What the parser was looking for.
    pub expected: Cow<'static, str>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected {}, but got ", self.expected)?;
        match (&self.token, self.kind) {
            (Some(token), Some(kind)) => write!(f, "\"{token}\" of type {kind}")?,
            _ => f.write_str("end of string")?,
        }
        write!(f, " at position {} (0-based) in \"{}\"", self.offset, self.input)
    }
}

impl core::error::Error for SyntaxError {}

// -----------------------------------------------------------------------------
// TypeParser

/// Recursive-descent parser for type expressions.
///
/// ```text
/// Type  := Identifier ( '<' Param ( ',' Param )* '>' )?
/// Param := Type | QuotedString
/// ```
pub(crate) struct TypeParser<'a> {
    input: &'a str,
    tokens: Peekable<Lexer<'a>>,
    // Character length of the input, reported for "end of string".
    end: usize,
}

impl<'a> TypeParser<'a> {
    pub(crate) fn parse(input: &'a str) -> Result<Type, SyntaxError> {
        let mut parser = Self {
            input,
            tokens: Lexer::new(input).peekable(),
            end: input.chars().count(),
        };

        let ty = parser.parse_type()?;
        match parser.tokens.next() {
            None => Ok(ty),
            Some(token) => Err(parser.error(Some(token), "end of string")),
        }
    }

    fn error(&self, token: Option<Token<'_>>, expected: &'static str) -> SyntaxError {
        let (token, kind, offset) = match token {
            Some(t) => (Some(t.text.to_string()), Some(t.kind), t.offset),
            None => (None, None, self.end),
        };
        SyntaxError {
            input: self.input.to_string(),
            token,
            kind,
            offset,
            expected: Cow::Borrowed(expected),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, SyntaxError> {
        match self.tokens.next() {
            Some(token) if token.kind == kind => Ok(token),
            other => Err(self.error(other, kind.name())),
        }
    }

    fn parse_type(&mut self) -> Result<Type, SyntaxError> {
        let name = self.expect(TokenKind::Identifier)?;
        let name = name.text.to_string();

        if !matches!(self.tokens.peek(), Some(t) if t.kind == TokenKind::Open) {
            return Ok(Type::with_params(name, Vec::new()));
        }
        self.tokens.next();

        let mut params = Vec::new();
        loop {
            params.push(self.parse_param()?);

            match self.tokens.next() {
                Some(t) if t.kind == TokenKind::Comma => continue,
                Some(t) if t.kind == TokenKind::Close => break,
                other => return Err(self.error(other, "T_COMMA or T_CLOSE_BRACKET")),
            }
        }

        Ok(Type::with_params(name, params))
    }

    fn parse_param(&mut self) -> Result<TypeParam, SyntaxError> {
        match self.tokens.peek().map(|t| t.kind) {
            Some(TokenKind::Identifier) => Ok(TypeParam::Type(self.parse_type()?)),
            Some(TokenKind::String) => {
                let token = self.expect(TokenKind::String)?;
                Ok(TypeParam::Literal(token.value.into_owned()))
            }
            _ => {
                let token = self.tokens.next();
                Err(self.error(token, "T_NAME or T_STRING"))
            }
        }
    }
}
