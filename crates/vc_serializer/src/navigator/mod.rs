//! Graph traversal.
//!
//! A navigator walks one value graph depth-first. For every node it consults
//! the exclusion strategy of the [`Context`], the [`HandlerRegistry`], the
//! metadata and the listeners, and has a visitor produce the result.
//!
//! Both navigators are short-lived: the [`Serializer`] creates one per call
//! around the visitor and context of that call.
//!
//! [`Context`]: crate::Context
//! [`HandlerRegistry`]: crate::handler::HandlerRegistry
//! [`Serializer`]: crate::Serializer

// -----------------------------------------------------------------------------
// Modules

mod deserialization;
mod serialization;

// -----------------------------------------------------------------------------
// Exports

pub use deserialization::DeserializationNavigator;
pub use serialization::SerializationNavigator;

use crate::error::{Error, Result};
use crate::types::Type;

/// Checks the parameter count of an `array` type.
fn array_params(ty: &Type) -> Result<usize> {
    match ty.params().len() {
        n @ 0..=2 => Ok(n),
        _ => Err(Error::runtime(alloc::format!(
            "array type `{ty}` cannot have more than 2 parameters"
        ))),
    }
}
