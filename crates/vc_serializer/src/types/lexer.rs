use alloc::borrow::Cow;
use alloc::string::String;
use core::fmt;
use core::iter::Peekable;
use core::str::CharIndices;

// -----------------------------------------------------------------------------
// Token

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A quoted literal, e.g. `'Y-m-d'`.
    String,
    /// `,`
    Comma,
    /// `<`
    Open,
    /// `>`
    Close,
    /// A class-like name, e.g. `Foo\Bar`.
    Identifier,
    /// Any other character.
    None,
}

impl TokenKind {
    /// Returns the diagnostic name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "T_STRING",
            Self::Comma => "T_COMMA",
            Self::Open => "T_OPEN_BRACKET",
            Self::Close => "T_CLOSE_BRACKET",
            Self::Identifier => "T_NAME",
            Self::None => "T_NONE",
        }
    }
}

impl fmt::Display for TokenKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lexical element of a type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The source text of the token, quotes included for strings.
    pub text: &'a str,
    /// The unescaped content, differs from `text` for strings only.
    pub value: Cow<'a, str>,
    /// Offset in characters from the start of the input.
    pub offset: usize,
}

// -----------------------------------------------------------------------------
// Lexer

#[inline]
fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic() || !c.is_ascii()
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

/// Splits a type expression into [`Token`]s, skipping whitespace.
///
/// The lexer never fails: characters that start no valid token, such as a
/// leading `\` or an unterminated quote, become [`TokenKind::None`] tokens and
/// are rejected by the parser.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    // Characters consumed so far, the offset reported in tokens.
    consumed: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            consumed: 0,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if next.is_some() {
            self.consumed += 1;
        }
        next
    }

    fn byte_pos(&mut self) -> usize {
        match self.chars.peek() {
            Some(&(pos, _)) => pos,
            None => self.input.len(),
        }
    }

    fn single(&self, kind: TokenKind, start: usize, offset: usize, c: char) -> Token<'a> {
        let text = &self.input[start..start + c.len_utf8()];
        Token {
            kind,
            text,
            value: Cow::Borrowed(text),
            offset,
        }
    }

    // `Segment ( '\' Segment )*`; a trailing separator is left unconsumed.
    fn identifier(&mut self, start: usize, offset: usize) -> Token<'a> {
        loop {
            while matches!(self.chars.peek(), Some(&(_, c)) if is_ident_continue(c)) {
                self.bump();
            }

            let mut ahead = self.chars.clone();
            match (ahead.next(), ahead.next()) {
                (Some((_, '\\')), Some((_, c))) if is_ident_start(c) => {
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }

        let text = &self.input[start..self.byte_pos()];
        Token {
            kind: TokenKind::Identifier,
            text,
            value: Cow::Borrowed(text),
            offset,
        }
    }

    // Quoted literal; the doubled quote char escapes a literal quote.
    fn string(&mut self, quote: char, start: usize, offset: usize) -> Token<'a> {
        let mut value = String::new();
        let mut escaped = false;

        loop {
            match self.bump() {
                Some((_, c)) if c == quote => {
                    if matches!(self.chars.peek(), Some(&(_, n)) if n == quote) {
                        self.bump();
                        value.push(quote);
                        escaped = true;
                    } else {
                        let end = self.byte_pos();
                        let text = &self.input[start..end];
                        let value = if escaped {
                            Cow::Owned(value)
                        } else {
                            Cow::Borrowed(&text[1..text.len() - 1])
                        };
                        return Token {
                            kind: TokenKind::String,
                            text,
                            value,
                            offset,
                        };
                    }
                }
                Some((_, c)) => value.push(c),
                None => {
                    // Unterminated, report the opening quote.
                    let text = &self.input[start..start + 1];
                    return Token {
                        kind: TokenKind::None,
                        text,
                        value: Cow::Borrowed(text),
                        offset,
                    };
                }
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            self.bump();
        }

        let offset = self.consumed;
        let (start, c) = self.bump()?;

        let token = match c {
            '<' => self.single(TokenKind::Open, start, offset, c),
            '>' => self.single(TokenKind::Close, start, offset, c),
            ',' => self.single(TokenKind::Comma, start, offset, c),
            '"' | '\'' => {
                // Unterminated strings must not swallow the rest of the input.
                let saved = (self.chars.clone(), self.consumed);
                let token = self.string(c, start, offset);
                if token.kind == TokenKind::None {
                    (self.chars, self.consumed) = saved;
                }
                token
            }
            c if is_ident_start(c) => self.identifier(start, offset),
            c => self.single(TokenKind::None, start, offset, c),
        };

        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{Lexer, TokenKind};

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_generics() {
        use TokenKind::*;
        assert_eq!(
            kinds("array< Foo\\Bar , 'x' >"),
            [Identifier, Open, Identifier, Comma, String, Close]
        );
    }

    #[test]
    fn unescapes_doubled_quotes() {
        let token = Lexer::new("'it''s'").next().unwrap();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.value, "it's");
        assert_eq!(token.text, "'it''s'");

        let token = Lexer::new("\"a\"\"b\"").next().unwrap();
        assert_eq!(token.value, "a\"b");
    }

    #[test]
    fn leading_backslash_is_not_an_identifier() {
        use TokenKind::*;
        assert_eq!(kinds("\\Bar"), [None, Identifier]);
        assert_eq!(kinds("Foo\\"), [Identifier, None]);
    }

    #[test]
    fn offsets_count_characters() {
        let offsets: Vec<usize> = Lexer::new("é<b>").map(|t| t.offset).collect();
        assert_eq!(offsets, [0, 1, 2, 3]);
    }

    #[test]
    fn unterminated_quote_is_reported_alone() {
        use TokenKind::*;
        assert_eq!(kinds("'ab"), [None, Identifier]);
    }
}
