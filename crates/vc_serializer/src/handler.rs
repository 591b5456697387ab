//! Custom conversions for individual types.
//!
//! A handler is looked up by direction, type name and format before the
//! navigator falls back to its primitive or object handling, so handlers may
//! replace the conversion of any type, including primitives.
//!
//! Handlers work on the neutral [`Data`] tree: a serialization handler returns
//! the data that the visitor then embeds, a deserialization handler reads the
//! raw input. Nested values are converted through the [`SerializationNavigate`]
//! and [`DeserializationNavigate`] callbacks.

use alloc::string::String;
use alloc::sync::Arc;

use vc_utils::hash::HashMap;

use crate::context::{Context, Direction};
use crate::error::Result;
use crate::types::Type;
use crate::value::{Data, InputView, Value};

// -----------------------------------------------------------------------------
// Navigation callbacks

/// Recursion back into the serialization navigator, handed to handlers.
pub trait SerializationNavigate {
    /// The context of the running call.
    fn context(&self) -> &Context;

    /// Serializes a nested value; `None` uses the type of the value itself.
    fn navigate(&mut self, value: &Value, ty: Option<&Type>) -> Result<Data>;
}

/// Recursion back into the deserialization navigator, handed to handlers.
pub trait DeserializationNavigate {
    /// The context of the running call.
    fn context(&self) -> &Context;

    /// Deserializes nested input; `None` keeps the input untyped.
    fn navigate(&mut self, input: &dyn InputView, ty: Option<&Type>) -> Result<Value>;
}

/// Converts a value into data.
pub type SerializationHandler =
    Arc<dyn Fn(&Value, &Type, &mut dyn SerializationNavigate) -> Result<Data> + Send + Sync>;

/// Converts raw input into a value.
pub type DeserializationHandler =
    Arc<dyn Fn(&dyn InputView, &Type, &mut dyn DeserializationNavigate) -> Result<Value> + Send + Sync>;

// -----------------------------------------------------------------------------
// HandlerRegistry

struct Formats<H> {
    exact: HashMap<String, H>,
    any: Option<H>,
}

impl<H> Default for Formats<H> {
    fn default() -> Self {
        Self {
            exact: HashMap::default(),
            any: None,
        }
    }
}

impl<H> Formats<H> {
    fn insert(&mut self, format: Option<&str>, handler: H) {
        match format {
            Some(format) => {
                self.exact.insert(format.into(), handler);
            }
            None => self.any = Some(handler),
        }
    }

    fn get(&self, format: &str) -> Option<&H> {
        self.exact.get(format).or(self.any.as_ref())
    }
}

/// Handlers keyed by direction, type name and format.
///
/// A handler registered for a specific format wins over one registered for
/// any format.
///
/// # Examples
///
/// ```
/// use vc_serializer::handler::HandlerRegistry;
/// use vc_serializer::value::{Data, Value};
///
/// let mut handlers = HandlerRegistry::new();
/// handlers.register_serialization("DateTime", None, |value, _ty, _nav| {
///     Ok(Data::from(value.as_str().unwrap_or_default().replace(' ', "T")))
/// });
///
/// assert!(handlers.serialization("DateTime", "json").is_some());
/// assert!(handlers.deserialization("DateTime", "json").is_none());
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    serialization: HashMap<String, Formats<SerializationHandler>>,
    deserialization: HashMap<String, Formats<DeserializationHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a serialization handler; `None` matches every format.
    pub fn register_serialization<F>(&mut self, type_name: &str, format: Option<&str>, handler: F)
    where
        F: Fn(&Value, &Type, &mut dyn SerializationNavigate) -> Result<Data> + Send + Sync + 'static,
    {
        self.serialization
            .entry(type_name.into())
            .or_default()
            .insert(format, Arc::new(handler));
    }

    /// Registers a deserialization handler; `None` matches every format.
    pub fn register_deserialization<F>(&mut self, type_name: &str, format: Option<&str>, handler: F)
    where
        F: Fn(&dyn InputView, &Type, &mut dyn DeserializationNavigate) -> Result<Value>
            + Send
            + Sync
            + 'static,
    {
        self.deserialization
            .entry(type_name.into())
            .or_default()
            .insert(format, Arc::new(handler));
    }

    pub fn serialization(&self, type_name: &str, format: &str) -> Option<&SerializationHandler> {
        self.serialization.get(type_name)?.get(format)
    }

    pub fn deserialization(&self, type_name: &str, format: &str) -> Option<&DeserializationHandler> {
        self.deserialization.get(type_name)?.get(format)
    }

    /// Whether any handler exists for the direction, type and format.
    pub fn contains(&self, direction: Direction, type_name: &str, format: &str) -> bool {
        match direction {
            Direction::Serialization => self.serialization(type_name, format).is_some(),
            Direction::Deserialization => self.deserialization(type_name, format).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HandlerRegistry;
    use crate::context::Direction;
    use crate::value::{Data, Value};

    #[test]
    fn exact_format_wins_over_any() {
        let mut handlers = HandlerRegistry::new();
        handlers.register_serialization("Money", None, |_, _, _| Ok(Data::from("any")));
        handlers.register_serialization("Money", Some("json"), |_, _, _| Ok(Data::from("json")));
        handlers.register_deserialization("Money", Some("json"), |_, _, _| Ok(Value::Null));

        assert!(handlers.contains(Direction::Serialization, "Money", "array"));
        assert!(handlers.contains(Direction::Deserialization, "Money", "json"));
        assert!(!handlers.contains(Direction::Deserialization, "Money", "array"));
        assert!(!handlers.contains(Direction::Serialization, "Other", "json"));
    }
}
