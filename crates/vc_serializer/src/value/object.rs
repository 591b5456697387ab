use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use vc_utils::hash::IndexMap;

use crate::error::{Error, Result};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Object

/// A class instance that can be (de)serialized.
///
/// The serializer never inspects Rust types directly. It identifies objects by
/// their runtime [`class_name`](Object::class_name), which keys the metadata
/// lookup, and reads or writes them through the field and method accessors.
///
/// Fields are read by value: implementations convert their Rust fields into
/// [`Value`]s on demand.
///
/// # Examples
///
/// ```
/// use core::any::Any;
/// use vc_serializer::Result;
/// use vc_serializer::value::{Object, Value};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Point { x: i64, y: i64 }
///
/// impl Object for Point {
///     fn class_name(&self) -> &str { "Point" }
///
///     fn has_field(&self, name: &str) -> bool {
///         matches!(name, "x" | "y")
///     }
///
///     fn get_field(&self, name: &str) -> Option<Value> {
///         match name {
///             "x" => Some(Value::Int(self.x)),
///             "y" => Some(Value::Int(self.y)),
///             _ => None,
///         }
///     }
///
///     fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
///         let slot = match name {
///             "x" => &mut self.x,
///             "y" => &mut self.y,
///             _ => return Err(vc_serializer::Error::runtime("no such field")),
///         };
///         *slot = value.as_int().ok_or_else(|| vc_serializer::Error::runtime("not an integer"))?;
///         Ok(())
///     }
///
///     fn clone_object(&self) -> Box<dyn Object> { Box::new(self.clone()) }
///
///     fn object_eq(&self, other: &dyn Object) -> Option<bool> {
///         Some(other.as_any().downcast_ref::<Self>() == Some(self))
///     }
///
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
///     fn into_any(self: Box<Self>) -> Box<dyn Any> { self }
/// }
///
/// let p = Value::object(Point { x: 1, y: 2 });
/// assert_eq!(p.as_object().unwrap().get_field("y"), Some(Value::Int(2)));
/// assert_eq!(p, p.clone());
/// ```
pub trait Object: Any + Send + Sync + fmt::Debug {
    /// The runtime class name.
    fn class_name(&self) -> &str;

    /// Returns `true` if the object has a field called `name`.
    fn has_field(&self, name: &str) -> bool;

    /// Reads a field.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Writes a field.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Returns `true` if the object has a method called `name`.
    fn has_method(&self, name: &str) -> bool {
        let _ = name;
        false
    }

    /// Calls a method that takes no arguments and does not mutate the object,
    /// such as a getter. Returns `None` if there is no such method.
    fn call(&self, name: &str) -> Option<Result<Value>> {
        let _ = name;
        None
    }

    /// Calls a method that may mutate the object, such as a setter or a
    /// lifecycle hook. Returns `None` if there is no such method.
    fn call_mut(&mut self, name: &str, args: Vec<Value>) -> Option<Result<Value>> {
        let _ = (name, args);
        None
    }

    /// Clones the object into a new box.
    fn clone_object(&self) -> Box<dyn Object>;

    /// Compares two objects. `None` means "not comparable".
    fn object_eq(&self, other: &dyn Object) -> Option<bool> {
        let _ = other;
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Object + '_ {
    /// Reads a field, reporting a missing one as an error.
    pub fn require_field(&self, name: &str) -> Result<Value> {
        self.get_field(name).ok_or_else(|| Error::MissingAccessor {
            class: self.class_name().into(),
            property: name.into(),
            tried: alloc::vec![name.into()],
        })
    }

    /// Calls a method without arguments, reporting a missing one as an error.
    pub fn invoke(&self, method: &str) -> Result<Value> {
        self.call(method).unwrap_or_else(|| {
            Err(Error::MissingMethod {
                class: self.class_name().into(),
                method: method.into(),
            })
        })
    }

    /// Calls a mutating method, reporting a missing one as an error.
    pub fn invoke_mut(&mut self, method: &str, args: Vec<Value>) -> Result<Value> {
        match self.call_mut(method, args) {
            Some(result) => result,
            None => Err(Error::MissingMethod {
                class: self.class_name().into(),
                method: method.into(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// DynamicObject

/// An [`Object`] backed by an ordered field bag.
///
/// Useful when the class only exists as metadata. Any field name can be
/// written; reading an unset field yields `None`.
///
/// # Examples
///
/// ```
/// use vc_serializer::value::{DynamicObject, Object, Value};
///
/// let mut user = DynamicObject::new("User");
/// user.insert("name", "Tom");
///
/// assert_eq!(user.class_name(), "User");
/// assert_eq!(user.get_field("name"), Some(Value::from("Tom")));
/// assert!(!user.has_field("age"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicObject {
    class: String,
    fields: IndexMap<String, Value>,
}

impl DynamicObject {
    /// Creates an object without fields.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: IndexMap::default(),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Sets a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Returns a reference to a field.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the fields in insertion order.
    #[inline]
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }
}

impl Object for DynamicObject {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.fields.insert(name.into(), value);
        Ok(())
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn object_eq(&self, other: &dyn Object) -> Option<bool> {
        let other = other.as_any().downcast_ref::<Self>()?;
        Some(self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
