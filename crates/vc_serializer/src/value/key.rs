use alloc::string::{String, ToString};
use core::fmt;

/// A map key: integer or string.
///
/// Formats whose maps only allow string keys render integers in decimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    String(String),
}

impl Key {
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::String(_) => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::String(s) => Some(s),
        }
    }

    /// Converts a string key that spells an integer, leaving others as is.
    pub fn normalize(self) -> Self {
        match self {
            Self::String(s) => match s.parse::<i64>() {
                Ok(i) if i.to_string() == s => Self::Int(i),
                _ => Self::String(s),
            },
            int => int,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => fmt::Display::fmt(i, f),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for Key {
    #[inline]
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<String> for Key {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Key {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}
