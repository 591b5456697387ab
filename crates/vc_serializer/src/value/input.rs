use alloc::vec::Vec;
use core::fmt;

use vc_utils::hash::IndexMap;

use crate::value::{Data, Key};

/// Read access to raw deserialization input, independent of its format.
///
/// The deserialization navigator and the object constructors use this to peek
/// at fields (discriminator values, identifiers) before the visitor takes over.
pub trait InputView: fmt::Debug {
    /// Returns `true` for a null input.
    fn is_null(&self) -> bool;

    /// Looks up a field of an object-like input.
    fn get_field(&self, name: &str) -> Option<&dyn InputView>;

    /// The elements of a list input, `None` for other inputs.
    fn items(&self) -> Option<Vec<&dyn InputView>>;

    /// The entries of a map input, `None` for other inputs.
    ///
    /// Keys that are canonical integers are returned as [`Key::Int`].
    fn entries(&self) -> Option<Vec<(Key, &dyn InputView)>>;

    /// Converts the input into the neutral tree.
    fn to_data(&self) -> Data;

    /// A short description used in error messages.
    fn describe(&self) -> &'static str;
}

impl InputView for Data {
    fn is_null(&self) -> bool {
        Data::is_null(self)
    }

    fn get_field(&self, name: &str) -> Option<&dyn InputView> {
        self.get(name).map(|d| d as &dyn InputView)
    }

    fn items(&self) -> Option<Vec<&dyn InputView>> {
        let list = self.as_list()?;
        Some(list.iter().map(|d| d as &dyn InputView).collect())
    }

    fn entries(&self) -> Option<Vec<(Key, &dyn InputView)>> {
        let map = self.as_map()?;
        Some(
            map.iter()
                .map(|(k, v)| (k.clone().normalize(), v as &dyn InputView))
                .collect(),
        )
    }

    fn to_data(&self) -> Data {
        self.clone()
    }

    fn describe(&self) -> &'static str {
        Data::describe(self)
    }
}

impl InputView for serde_json::Value {
    fn is_null(&self) -> bool {
        serde_json::Value::is_null(self)
    }

    fn get_field(&self, name: &str) -> Option<&dyn InputView> {
        match self {
            Self::Object(map) => map.get(name).map(|v| v as &dyn InputView),
            _ => None,
        }
    }

    fn items(&self) -> Option<Vec<&dyn InputView>> {
        match self {
            Self::Array(list) => Some(list.iter().map(|v| v as &dyn InputView).collect()),
            _ => None,
        }
    }

    fn entries(&self) -> Option<Vec<(Key, &dyn InputView)>> {
        match self {
            Self::Object(map) => Some(
                map.iter()
                    .map(|(k, v)| (Key::from(k.as_str()).normalize(), v as &dyn InputView))
                    .collect(),
            ),
            _ => None,
        }
    }

    fn to_data(&self) -> Data {
        match self {
            Self::Null => Data::Null,
            Self::Bool(b) => Data::Bool(*b),
            Self::Number(n) => match n.as_i64() {
                Some(i) => Data::Int(i),
                None => Data::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Self::String(s) => Data::String(s.clone()),
            Self::Array(list) => Data::List(list.iter().map(InputView::to_data).collect()),
            Self::Object(map) => {
                let mut out = IndexMap::with_capacity_and_hasher(map.len(), Default::default());
                for (k, v) in map {
                    out.insert(Key::from(k.as_str()), v.to_data());
                }
                Data::Map(out)
            }
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(n) if n.is_i64() => "integer",
            Self::Number(_) => "double",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}
