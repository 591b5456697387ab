use alloc::boxed::Box;
use alloc::string::String;

use vc_utils::hash::HashMap;

use crate::error::Result;
use crate::metadata::{ClassMetadata, MetadataProvider};
use crate::value::Object;

// -----------------------------------------------------------------------------
// Instantiator

/// Creates blank instances of classes for deserialization.
pub trait Instantiator: Send + Sync {
    /// Returns a new instance of `class` without running any user
    /// initialization, `None` if the class cannot be instantiated.
    fn instantiate(&self, class: &str) -> Option<Box<dyn Object>>;
}

/// A function creating a blank instance of one class.
pub type InstantiateFn = fn() -> Box<dyn Object>;

// -----------------------------------------------------------------------------
// ClassRegistration

/// A class submitted for automatic registration.
///
/// ```ignore
/// vc_serializer::inventory::submit! {
///     ClassRegistration::new(user_metadata, Some(new_user))
/// }
/// ```
///
/// Collected by [`ClassRegistry::auto_register`].
pub struct ClassRegistration {
    metadata: fn() -> Result<ClassMetadata>,
    instantiate: Option<InstantiateFn>,
}

impl ClassRegistration {
    pub const fn new(metadata: fn() -> Result<ClassMetadata>, instantiate: Option<InstantiateFn>) -> Self {
        Self {
            metadata,
            instantiate,
        }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(ClassRegistration);

// -----------------------------------------------------------------------------
// ClassRegistry

struct ClassEntry {
    metadata: ClassMetadata,
    instantiate: Option<InstantiateFn>,
}

/// An in-process store of class metadata and instantiators.
///
/// The registry is both the [`MetadataProvider`] and the [`Instantiator`] of
/// a serializer that is not backed by external metadata.
///
/// # Examples
///
/// ```
/// use vc_serializer::metadata::{ClassMetadata, ClassRegistry, Instantiator, MetadataProvider};
/// use vc_serializer::value::DynamicObject;
///
/// let mut registry = ClassRegistry::new();
/// registry.register_with(ClassMetadata::new("User"), || Box::new(DynamicObject::new("User")));
///
/// assert!(registry.contains("User"));
/// assert_eq!(registry.instantiate("User").unwrap().class_name(), "User");
/// assert!(registry.load_class_metadata("Ghost").unwrap().is_none());
/// ```
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassEntry>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            classes: HashMap::default(),
        }
    }

    /// Registers metadata without an instantiator.
    ///
    /// Classes registered this way can be serialized, and deserialized only
    /// into existing targets or through a custom constructor.
    pub fn register(&mut self, metadata: ClassMetadata) {
        self.insert(metadata, None);
    }

    /// Registers metadata with an instantiator.
    pub fn register_with(&mut self, metadata: ClassMetadata, instantiate: InstantiateFn) {
        self.insert(metadata, Some(instantiate));
    }

    fn insert(&mut self, metadata: ClassMetadata, instantiate: Option<InstantiateFn>) {
        let name = String::from(metadata.name());
        self.classes.insert(
            name,
            ClassEntry {
                metadata,
                instantiate,
            },
        );
    }

    /// Returns `true` if `class` is registered.
    #[inline]
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Returns the registered (unmerged) metadata of `class`.
    #[inline]
    pub fn get(&self, class: &str) -> Option<&ClassMetadata> {
        self.classes.get(class).map(|e| &e.metadata)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registers every [`ClassRegistration`] submitted through `inventory`.
    ///
    /// Registrations whose metadata fails to build are skipped with a warning.
    ///
    /// Returns `false` if the `auto_register` feature is disabled.
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            for registration in inventory::iter::<ClassRegistration> {
                match (registration.metadata)() {
                    Ok(metadata) => self.insert(metadata, registration.instantiate),
                    Err(err) => log::warn!("skipping class registration: {err}"),
                }
            }
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }
}

impl MetadataProvider for ClassRegistry {
    fn load_class_metadata(&self, class: &str) -> Result<Option<ClassMetadata>> {
        Ok(self.get(class).cloned())
    }
}

impl Instantiator for ClassRegistry {
    fn instantiate(&self, class: &str) -> Option<Box<dyn Object>> {
        let ctor = self.classes.get(class)?.instantiate?;
        Some(ctor())
    }
}

#[cfg(all(test, feature = "auto_register"))]
mod tests {
    use alloc::boxed::Box;

    use super::{ClassRegistration, ClassRegistry};
    use crate::error::Result;
    use crate::metadata::{ClassMetadata, Instantiator, PropertyMetadata};
    use crate::value::{DynamicObject, Object};

    fn tag_metadata() -> Result<ClassMetadata> {
        Ok(ClassMetadata::new("registry_test::Tag")
            .with_property(PropertyMetadata::new("registry_test::Tag", "label")))
    }

    fn new_tag() -> Box<dyn Object> {
        Box::new(DynamicObject::new("registry_test::Tag"))
    }

    inventory::submit! {
        ClassRegistration::new(tag_metadata, Some(new_tag))
    }

    #[test]
    fn auto_register_collects_submissions() {
        let mut registry = ClassRegistry::new();
        assert!(registry.auto_register());

        assert!(registry.contains("registry_test::Tag"));
        assert!(registry.instantiate("registry_test::Tag").is_some());
    }
}
