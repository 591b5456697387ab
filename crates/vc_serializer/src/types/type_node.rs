use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::Error;
use crate::types::{SyntaxError, TypeParser};
use crate::value::Value;

// -----------------------------------------------------------------------------
// TypeParam

/// A parameter of a [`Type`]: either a nested type or a quoted literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeParam {
    Type(Type),
    Literal(String),
}

impl TypeParam {
    /// Returns the nested type, if this parameter is one.
    #[inline]
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Self::Type(ty) => Some(ty),
            Self::Literal(_) => None,
        }
    }

    /// Returns the literal, if this parameter is one.
    #[inline]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Type(_) => None,
            Self::Literal(s) => Some(s),
        }
    }
}

impl From<Type> for TypeParam {
    #[inline]
    fn from(value: Type) -> Self {
        Self::Type(value)
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => fmt::Display::fmt(ty, f),
            Self::Literal(s) => {
                f.write_str("'")?;
                for part in s.split('\'').enumerate() {
                    if part.0 > 0 {
                        f.write_str("''")?;
                    }
                    f.write_str(part.1)?;
                }
                f.write_str("'")
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Type

/// A parsed type descriptor, such as `array<string,Foo\Bar>`.
///
/// Types compare by name and parameters. Use [`is`](Type::is) to check the
/// name only.
///
/// # Examples
///
/// ```
/// use vc_serializer::types::Type;
///
/// let ty: Type = "array<integer, Foo>".parse().unwrap();
///
/// assert!(ty.is("array"));
/// assert_eq!(ty.params().len(), 2);
/// assert!(ty.param_type(1).unwrap().is("Foo"));
/// assert_eq!(ty.to_string(), "array<integer,Foo>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    name: String,
    params: Vec<TypeParam>,
}

impl Type {
    pub const NULL: &'static str = "NULL";
    pub const BOOLEAN: &'static str = "boolean";
    pub const INTEGER: &'static str = "integer";
    pub const DOUBLE: &'static str = "double";
    pub const STRING: &'static str = "string";
    pub const ARRAY: &'static str = "array";

    /// Creates a type without parameters.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "type name must not be empty");
        Self {
            name,
            params: Vec::new(),
        }
    }

    /// Creates a type with parameters.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn with_params(name: impl Into<String>, params: Vec<TypeParam>) -> Self {
        let mut ty = Self::new(name);
        ty.params = params;
        ty
    }

    /// Shorthand for `array<item>`.
    pub fn list_of(item: Type) -> Self {
        Self::with_params(Self::ARRAY, alloc::vec![TypeParam::Type(item)])
    }

    /// Shorthand for `array<key,value>`.
    pub fn map_of(key: Type, value: Type) -> Self {
        Self::with_params(
            Self::ARRAY,
            alloc::vec![TypeParam::Type(key), TypeParam::Type(value)],
        )
    }

    /// Parses a type expression.
    #[inline]
    pub fn parse(input: &str) -> Result<Self, SyntaxError> {
        TypeParser::parse(input)
    }

    /// Derives the type of a runtime value: the class name for objects, the
    /// primitive name otherwise.
    ///
    /// Fails with an invalid-argument error for an object reporting an empty
    /// class name.
    pub fn of_value(value: &Value) -> Result<Self, Error> {
        let name = match value {
            Value::Null => Self::NULL,
            Value::Bool(_) => Self::BOOLEAN,
            Value::Int(_) => Self::INTEGER,
            Value::Float(_) => Self::DOUBLE,
            Value::String(_) => Self::STRING,
            Value::List(_) | Value::Map(_) => Self::ARRAY,
            Value::Object(object) => object.class_name(),
        };
        if name.is_empty() {
            return Err(Error::invalid_argument(
                "cannot derive a type from an object with an empty class name",
            ));
        }
        Ok(Self::new(name))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[TypeParam] {
        &self.params
    }

    /// Returns the parameter at `index`.
    #[inline]
    pub fn param(&self, index: usize) -> Option<&TypeParam> {
        self.params.get(index)
    }

    /// Returns the parameter at `index` if it is a type.
    #[inline]
    pub fn param_type(&self, index: usize) -> Option<&Type> {
        self.params.get(index).and_then(TypeParam::as_type)
    }

    /// Returns `true` if the name equals `name`.
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Renames the type, used when rewriting types in flight.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        assert!(!name.is_empty(), "type name must not be empty");
        self.name = name;
    }

    /// Replaces the parameters.
    #[inline]
    pub fn set_params(&mut self, params: Vec<TypeParam>) {
        self.params = params;
    }

    /// The built-in category of this type name, if it is one.
    pub fn primitive(&self) -> Option<Primitive> {
        Primitive::from_name(&self.name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some((first, rest)) = self.params.split_first() {
            write!(f, "<{first}")?;
            for param in rest {
                write!(f, ",{param}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for Type {
    type Err = SyntaxError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeParser::parse(s)
    }
}

impl From<&Type> for String {
    #[inline]
    fn from(value: &Type) -> Self {
        value.to_string()
    }
}

// -----------------------------------------------------------------------------
// Primitive

/// Built-in type categories handled without class metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    Array,
}

impl Primitive {
    /// Maps a type name, including the accepted aliases, to its category.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "NULL" | "null" => Self::Null,
            "boolean" | "bool" => Self::Boolean,
            "integer" | "int" => Self::Integer,
            "double" | "float" => Self::Double,
            "string" => Self::String,
            "array" => Self::Array,
            _ => return None,
        })
    }
}
