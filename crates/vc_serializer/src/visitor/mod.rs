//! Format visitors.
//!
//! The navigators walk the graph and call a visitor for every node. A
//! serialization visitor assembles the format-specific output bottom-up; a
//! deserialization visitor reads scalars out of the raw input and tells the
//! navigator where the children of a collection or object are.
//!
//! Two formats are provided:
//!
//! - `json`: [`serde_json::Value`] output and input.
//! - `array`: the neutral [`Data`] tree, which any serde format can carry.

// -----------------------------------------------------------------------------
// Modules

mod array;
mod json;

// -----------------------------------------------------------------------------
// Exports

pub use array::{ArrayDeserializationVisitor, ArraySerializationVisitor};
pub use json::{JsonDeserializationVisitor, JsonSerializationVisitor};

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::metadata::{ClassMetadata, PropertyMetadata};
use crate::naming::PropertyNamingStrategy;
use crate::types::Type;
use crate::value::{Data, InputView, Key, Value};

// -----------------------------------------------------------------------------
// SerializationVisitor

/// Builds the output of one format.
///
/// Every method returns the output of the visited node. Collections and
/// objects receive the already built outputs of their children.
pub trait SerializationVisitor {
    /// The output node. Handlers see it through [`InputView::to_data`].
    type Output: InputView;

    /// The format name handlers and listeners are filtered by.
    fn format(&self) -> &str;

    fn visit_null(&mut self, ty: &Type, context: &Context) -> Result<Self::Output>;

    fn visit_boolean(&mut self, value: bool, ty: &Type, context: &Context) -> Result<Self::Output>;

    fn visit_integer(&mut self, value: i64, ty: &Type, context: &Context) -> Result<Self::Output>;

    fn visit_double(&mut self, value: f64, ty: &Type, context: &Context) -> Result<Self::Output>;

    fn visit_string(&mut self, value: &str, ty: &Type, context: &Context) -> Result<Self::Output>;

    /// A list, in order.
    fn visit_array(
        &mut self,
        items: Vec<Self::Output>,
        ty: &Type,
        context: &Context,
    ) -> Result<Self::Output>;

    /// A key/value map, in order.
    fn visit_hash(
        &mut self,
        entries: Vec<(Key, Self::Output)>,
        ty: &Type,
        context: &Context,
    ) -> Result<Self::Output>;

    /// An object with its visible properties.
    ///
    /// The visitor names each property and merges the entries of inline
    /// properties into the object.
    fn visit_object(
        &mut self,
        metadata: &ClassMetadata,
        properties: Vec<(Arc<PropertyMetadata>, Self::Output)>,
        ty: &Type,
        context: &Context,
    ) -> Result<Self::Output>;

    /// Embeds the result of a custom handler.
    fn visit_custom(&mut self, data: Data, ty: &Type, context: &Context) -> Result<Self::Output>;
}

// -----------------------------------------------------------------------------
// DeserializationVisitor

/// Reads the input of one format.
///
/// The provided methods accept the loose input the neutral tree allows:
/// scalars are cast between each other where a cast is meaningful, lists and
/// maps stand in for one another.
pub trait DeserializationVisitor {
    /// The format name handlers and listeners are filtered by.
    fn format(&self) -> &str;

    /// Names the properties looked up in object input.
    fn naming(&self) -> &dyn PropertyNamingStrategy;

    fn visit_null(&mut self, _input: &dyn InputView, _ty: &Type, _context: &Context) -> Result<Value> {
        Ok(Value::Null)
    }

    fn visit_boolean(&mut self, input: &dyn InputView, _ty: &Type, _context: &Context) -> Result<bool> {
        cast_boolean(&input.to_data())
    }

    fn visit_integer(&mut self, input: &dyn InputView, _ty: &Type, _context: &Context) -> Result<i64> {
        cast_integer(&input.to_data())
    }

    fn visit_double(&mut self, input: &dyn InputView, _ty: &Type, _context: &Context) -> Result<f64> {
        cast_double(&input.to_data())
    }

    fn visit_string(&mut self, input: &dyn InputView, _ty: &Type, _context: &Context) -> Result<String> {
        cast_string(&input.to_data())
    }

    /// The elements of a list. Map input yields its values.
    fn visit_array<'i>(
        &mut self,
        input: &'i dyn InputView,
        _ty: &Type,
        _context: &Context,
    ) -> Result<Vec<&'i dyn InputView>> {
        if let Some(items) = input.items() {
            return Ok(items);
        }
        match input.entries() {
            Some(entries) => Ok(entries.into_iter().map(|(_, v)| v).collect()),
            None => Err(Error::unexpected("array", input.describe())),
        }
    }

    /// The entries of a map. List input is keyed by index.
    fn visit_hash<'i>(
        &mut self,
        input: &'i dyn InputView,
        _ty: &Type,
        _context: &Context,
    ) -> Result<Vec<(Key, &'i dyn InputView)>> {
        if let Some(entries) = input.entries() {
            return Ok(entries);
        }
        match input.items() {
            Some(items) => Ok(items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::from(i), v))
                .collect()),
            None => Err(Error::unexpected("array", input.describe())),
        }
    }

    /// Checks that the input can hold the properties of `metadata`.
    fn visit_object(
        &mut self,
        metadata: &ClassMetadata,
        input: &dyn InputView,
        _context: &Context,
    ) -> Result<()> {
        if input.entries().is_some() {
            return Ok(());
        }
        Err(Error::unexpected(
            alloc::format!("object of class `{}`", metadata.name()),
            input.describe(),
        ))
    }

    /// The input of one property, `None` if the input does not carry it.
    fn visit_property<'i>(
        &mut self,
        property: &PropertyMetadata,
        input: &'i dyn InputView,
        _context: &Context,
    ) -> Option<&'i dyn InputView> {
        input.get_field(&self.naming().translate_name(property))
    }

    /// Raw input, for untyped values and `array` without parameters.
    fn visit_custom(&mut self, input: &dyn InputView, _context: &Context) -> Result<Data> {
        Ok(input.to_data())
    }
}

// -----------------------------------------------------------------------------
// Scalar casts

pub(crate) fn cast_boolean(data: &Data) -> Result<bool> {
    match data {
        Data::Bool(b) => Ok(*b),
        Data::Int(i) => Ok(*i != 0),
        Data::Float(f) => Ok(*f != 0.0),
        Data::String(s) => match s.as_str() {
            "1" | "true" => Ok(true),
            "" | "0" | "false" => Ok(false),
            _ => Err(Error::unexpected("boolean", alloc::format!("string \"{s}\""))),
        },
        other => Err(Error::unexpected("boolean", other.describe())),
    }
}

pub(crate) fn cast_integer(data: &Data) -> Result<i64> {
    match data {
        Data::Int(i) => Ok(*i),
        Data::Bool(b) => Ok(i64::from(*b)),
        Data::Float(f) if f.is_finite() => Ok(*f as i64),
        Data::String(s) => s
            .trim()
            .parse::<i64>()
            .or_else(|_| s.trim().parse::<f64>().map(|f| f as i64))
            .map_err(|_| Error::unexpected("integer", alloc::format!("string \"{s}\""))),
        other => Err(Error::unexpected("integer", other.describe())),
    }
}

pub(crate) fn cast_double(data: &Data) -> Result<f64> {
    match data {
        Data::Float(f) => Ok(*f),
        Data::Int(i) => Ok(*i as f64),
        Data::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::unexpected("double", alloc::format!("string \"{s}\""))),
        other => Err(Error::unexpected("double", other.describe())),
    }
}

pub(crate) fn cast_string(data: &Data) -> Result<String> {
    match data {
        Data::String(s) => Ok(s.clone()),
        Data::Int(i) => Ok(i.to_string()),
        Data::Float(f) => Ok(f.to_string()),
        Data::Bool(b) => Ok(b.to_string()),
        other => Err(Error::unexpected("string", other.describe())),
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{cast_boolean, cast_double, cast_integer, cast_string};
    use crate::error::ErrorKind;
    use crate::value::Data;

    #[test]
    fn scalar_casts() {
        assert_eq!(cast_integer(&Data::from("42")).unwrap(), 42);
        assert_eq!(cast_integer(&Data::Float(3.9)).unwrap(), 3);
        assert_eq!(cast_double(&Data::Int(2)).unwrap(), 2.0);
        assert_eq!(cast_string(&Data::Int(7)).unwrap(), "7");
        assert!(cast_boolean(&Data::from("true")).unwrap());
        assert!(!cast_boolean(&Data::Int(0)).unwrap());

        let err = cast_integer(&Data::from("seven")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(cast_string(&Data::List(vec![])).unwrap_err().kind(), ErrorKind::Runtime);
    }
}
