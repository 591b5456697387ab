//! Strategies deciding which classes and properties take part in a traversal.
//!
//! A [`Context`] combines every configured strategy disjunctively: a class or
//! property is skipped as soon as one strategy says so.
//!
//! [`Context`]: crate::Context

// -----------------------------------------------------------------------------
// Modules

mod depth;
mod disjunct;
mod groups;
mod version;

// -----------------------------------------------------------------------------
// Exports

pub use depth::DepthExclusionStrategy;
pub use disjunct::DisjunctExclusionStrategy;
pub use groups::{DEFAULT_GROUP, Groups, GroupsExclusionStrategy};
pub use version::{VersionExclusionStrategy, compare_versions};

use crate::context::Context;
use crate::metadata::{ClassMetadata, PropertyMetadata};

// -----------------------------------------------------------------------------
// ExclusionStrategy

/// Decides whether a class or property is skipped.
///
/// Strategies are consulted before each object is visited and before each of
/// its properties is read.
pub trait ExclusionStrategy {
    /// Returns `true` to represent the object as excluded.
    fn should_skip_class(&self, metadata: &ClassMetadata, context: &Context) -> bool;

    /// Returns `true` to leave the property out.
    fn should_skip_property(&self, metadata: &PropertyMetadata, context: &Context) -> bool;
}

/// A pair of closures acts as an ad-hoc strategy.
impl<F, G> ExclusionStrategy for (F, G)
where
    F: Fn(&ClassMetadata, &Context) -> bool,
    G: Fn(&PropertyMetadata, &Context) -> bool,
{
    #[inline]
    fn should_skip_class(&self, metadata: &ClassMetadata, context: &Context) -> bool {
        (self.0)(metadata, context)
    }

    #[inline]
    fn should_skip_property(&self, metadata: &PropertyMetadata, context: &Context) -> bool {
        (self.1)(metadata, context)
    }
}
