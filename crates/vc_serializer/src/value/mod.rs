//! The in-memory graph handed to and returned by the serializer.
//!
//! - [`Value`]: application values, where objects are `Box<dyn Object>`.
//! - [`Data`]: the format-neutral "array" tree produced by serialization.
//! - [`InputView`]: read access to raw deserialization input.

// -----------------------------------------------------------------------------
// Modules

mod data;
mod input;
mod key;
mod object;
mod serde;

// -----------------------------------------------------------------------------
// Exports

pub use data::Data;
pub use input::InputView;
pub use key::Key;
pub use object::{DynamicObject, Object};

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use vc_utils::hash::IndexMap;

// -----------------------------------------------------------------------------
// Value

/// An application value.
///
/// Scalars and collections are stored inline; class instances are trait
/// objects whose runtime class name keys the metadata lookup.
#[derive(Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<Key, Value>),
    Object(Box<dyn Object>),
}

impl Value {
    /// Wraps an object.
    #[inline]
    pub fn object(object: impl Object) -> Self {
        Self::Object(Box::new(object))
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

    /// Returns the number as `f64`, integers included.
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
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&IndexMap<Key, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&dyn Object> {
        match self {
            Self::Object(object) => Some(&**object),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        match self {
            Self::Object(object) => Some(&mut **object),
            _ => None,
        }
    }

    /// Downcasts an object value to a concrete type.
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref()
    }

    /// Takes a concrete object out of the value.
    pub fn downcast<T: Object>(self) -> Result<Box<T>, Self> {
        match self {
            Self::Object(object) => {
                if object.as_any().is::<T>() {
                    // The check above guarantees success.
                    object.into_any().downcast().map_err(|_| Self::Null)
                } else {
                    Err(Self::Object(object))
                }
            }
            other => Err(other),
        }
    }

    /// A short description used in error messages.
    pub fn describe(&self) -> String {
        use alloc::string::ToString;

        match self {
            Self::Null => "null".to_string(),
            Self::Bool(_) => "boolean".to_string(),
            Self::Int(_) => "integer".to_string(),
            Self::Float(_) => "double".to_string(),
            Self::String(_) => "string".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Map(_) => "map".to_string(),
            Self::Object(object) => alloc::format!("object of class `{}`", object.class_name()),
        }
    }

    /// Converts the value into the neutral tree.
    ///
    /// Returns `None` if the value contains an object; objects only convert
    /// through the serializer.
    pub fn to_data(&self) -> Option<Data> {
        Some(match self {
            Self::Null => Data::Null,
            Self::Bool(b) => Data::Bool(*b),
            Self::Int(i) => Data::Int(*i),
            Self::Float(f) => Data::Float(*f),
            Self::String(s) => Data::String(s.clone()),
            Self::List(list) => Data::List(list.iter().map(Self::to_data).collect::<Option<_>>()?),
            Self::Map(map) => Data::Map(
                map.iter()
                    .map(|(k, v)| Some((k.clone(), v.to_data()?)))
                    .collect::<Option<_>>()?,
            ),
            Self::Object(_) => return None,
        })
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Self::Null => Self::Null,
            Self::Bool(b) => Self::Bool(*b),
            Self::Int(i) => Self::Int(*i),
            Self::Float(f) => Self::Float(*f),
            Self::String(s) => Self::String(s.clone()),
            Self::List(list) => Self::List(list.clone()),
            Self::Map(map) => Self::Map(map.clone()),
            Self::Object(object) => Self::Object(object.clone_object()),
        }
    }
}

impl PartialEq for Value {
    /// Objects compare through [`Object::object_eq`]; objects that cannot be
    /// compared are unequal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.object_eq(&**b).unwrap_or(false),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => fmt::Debug::fmt(b, f),
            Self::Int(i) => fmt::Debug::fmt(i, f),
            Self::Float(v) => fmt::Debug::fmt(v, f),
            Self::String(s) => fmt::Debug::fmt(s, f),
            Self::List(list) => f.debug_list().entries(list).finish(),
            Self::Map(map) => fmt::Debug::fmt(map, f),
            Self::Object(object) => fmt::Debug::fmt(object, f),
        }
    }
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        match data {
            Data::Null => Self::Null,
            Data::Bool(b) => Self::Bool(b),
            Data::Int(i) => Self::Int(i),
            Data::Float(f) => Self::Float(f),
            Data::String(s) => Self::String(s),
            Data::List(list) => Self::List(list.into_iter().map(Self::from).collect()),
            Data::Map(map) => Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {$(
        impl From<$ty> for Value {
            #[inline]
            fn from(value: $ty) -> Self {
                Self::$variant(value $(as $cast)?)
            }
        }
    )*};
}

impl_from! {
    bool => Bool,
    i32 => Int as i64,
    i64 => Int,
    u32 => Int as i64,
    f64 => Float,
    String => String,
    Vec<Value> => List,
    IndexMap<Key, Value> => Map,
    Box<dyn Object> => Object,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{DynamicObject, Key, Value};
    use vc_utils::hash::IndexMap;

    #[test]
    fn objects_clone_deeply() {
        let mut car = DynamicObject::new("Car");
        car.insert("wheels", 4);
        let value = Value::object(car);

        let mut copy = value.clone();
        copy.as_object_mut()
            .unwrap()
            .set_field("wheels", Value::Int(3))
            .unwrap();

        assert_ne!(value, copy);
        assert_eq!(
            value.as_object().unwrap().get_field("wheels"),
            Some(Value::Int(4))
        );
    }

    #[test]
    fn to_data_rejects_objects() {
        let mut map = IndexMap::default();
        map.insert(Key::from("a"), Value::List(vec![Value::Int(1)]));
        assert!(Value::Map(map).to_data().is_some());

        let nested = Value::List(vec![Value::object(DynamicObject::new("Foo"))]);
        assert!(nested.to_data().is_none());
    }

    #[test]
    fn downcast_keeps_foreign_objects() {
        let value = Value::object(DynamicObject::new("Foo"));
        let object = value.downcast::<DynamicObject>().unwrap();
        assert_eq!(object.class(), "Foo");

        assert!(Value::Int(1).downcast::<DynamicObject>().is_err());
    }
}
