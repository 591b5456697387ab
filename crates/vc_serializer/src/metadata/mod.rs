//! Class and property mapping directives.
//!
//! A [`MetadataProvider`] yields the [`ClassMetadata`] a class declares. The
//! [`MetadataFactory`] merges it with its ancestors and caches the result in a
//! [`MetadataCache`]. [`ClassRegistry`] is the in-process provider.
//!
//! ## Merge rules
//!
//! Merging a parent into a child:
//!
//! - properties: parent order, child entries replace parent entries in place,
//!   new child entries are appended;
//! - lifecycle method lists: parent first;
//! - XML namespaces: child wins; XML root: taken from the child;
//! - accessor order: inherited when the child leaves it unset;
//! - discriminator: inherited, extended, or disabled by the child. Two levels
//!   using different discriminator fields is a logic error.
//!
//! Finishing adds a static discriminator tag property to concrete classes and
//! sorts properties by the accessor order.

// -----------------------------------------------------------------------------
// Modules

mod class;
mod factory;
mod property;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use class::{AccessorOrder, ClassMetadata, Discriminator, ExclusionPolicy};
pub use factory::{MetadataCache, MetadataFactory, MetadataProvider};
pub use property::{
    AccessType, Accessor, Exposure, OnExclude, PropertyKind, PropertyMetadata, XmlProperty,
};
pub use registry::{ClassRegistration, ClassRegistry, InstantiateFn, Instantiator};
