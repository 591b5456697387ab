use alloc::string::String;
use alloc::vec::Vec;

use vc_utils::hash::IndexMap;

use crate::value::Key;

/// The format-neutral "array" representation of serialized data.
///
/// This is what the `array` format produces and consumes. It implements
/// serde's `Serialize` and `Deserialize`, so it can be carried by any serde
/// data format.
///
/// # Examples
///
/// ```
/// use vc_serializer::value::Data;
///
/// let data = Data::map([("id", Data::Int(1)), ("name", Data::from("Tom"))]);
///
/// assert_eq!(data.get("id"), Some(&Data::Int(1)));
/// assert_eq!(data.get("name").and_then(Data::as_str), Some("Tom"));
/// assert!(data.get("missing").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Data {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Data>),
    Map(IndexMap<Key, Data>),
}

impl Data {
    /// Builds a map from string keys.
    pub fn map<'a>(entries: impl IntoIterator<Item = (&'a str, Data)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (Key::from(k), v)).collect())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[Data]> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&IndexMap<Key, Data>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a string key in a map.
    pub fn get(&self, key: &str) -> Option<&Data> {
        match self {
            Self::Map(map) => map.get(&Key::from(key)),
            _ => None,
        }
    }

    /// A short description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "double",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Renders a scalar as a string, as used for map keys and discriminator
    /// values.
    pub fn to_key_string(&self) -> Option<String> {
        use alloc::string::ToString;

        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }
}

impl From<bool> for Data {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Data {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Data {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Data {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Data {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<Vec<Data>> for Data {
    #[inline]
    fn from(value: Vec<Data>) -> Self {
        Self::List(value)
    }
}
