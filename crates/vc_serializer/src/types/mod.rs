//! The type-descriptor language.
//!
//! Properties and top-level calls name their types with short expressions
//! such as `integer`, `array<string>`, `array<string,Foo\Bar>` or
//! `DateTime<'Y-m-d'>`. This module tokenizes and parses them into [`Type`].

mod lexer;
mod parser;
mod type_node;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::SyntaxError;
pub use type_node::{Primitive, Type, TypeParam};

pub(crate) use parser::TypeParser;
