//! Creation of the objects a deserialization fills.
//!
//! Constructors form a chain: each one either produces the object itself or
//! delegates to the constructor it wraps. The default chain is
//! [`InitializedObjectConstructor`] over [`FreshObjectConstructor`].

// -----------------------------------------------------------------------------
// Modules

mod fresh;
mod initialized;
mod repository;

// -----------------------------------------------------------------------------
// Exports

pub use fresh::FreshObjectConstructor;
pub use initialized::InitializedObjectConstructor;
pub use repository::{FallbackStrategy, ObjectRepository, RepositoryObjectConstructor};

use alloc::boxed::Box;

use crate::context::Context;
use crate::error::Result;
use crate::metadata::ClassMetadata;
use crate::types::Type;
use crate::value::{InputView, Object};

// -----------------------------------------------------------------------------
// ObjectConstructor

/// Provides the object that the properties of `input` are written to.
pub trait ObjectConstructor: Send + Sync {
    /// Returns the object to fill, or `None` if the input deserializes to
    /// `null`.
    ///
    /// Called after the depth of `context` was increased for the object, so
    /// the root object is constructed at depth 1.
    fn construct(
        &self,
        metadata: &ClassMetadata,
        input: &dyn InputView,
        ty: &Type,
        context: &mut Context,
    ) -> Result<Option<Box<dyn Object>>>;
}
