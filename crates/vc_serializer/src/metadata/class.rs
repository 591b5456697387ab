use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_utils::hash::{HashMap, IndexMap};

use crate::error::{Error, Result};
use crate::metadata::{AccessType, Exposure, PropertyKind, PropertyMetadata};

// -----------------------------------------------------------------------------
// Enums

/// Which properties are serialized unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExclusionPolicy {
    /// Every property except those marked [`Exposure::Exclude`].
    #[default]
    None,
    /// Only properties marked [`Exposure::Expose`].
    All,
}

/// Order of properties in the output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AccessorOrder {
    /// Declaration order.
    #[default]
    Undefined,
    /// Sorted by property name.
    Alphabetical,
    /// Listed names first, in list order; the rest in declaration order.
    Custom(Vec<String>),
}

// -----------------------------------------------------------------------------
// Discriminator

/// Maps a tag value to a subclass of a polymorphic base class.
///
/// # Examples
///
/// ```
/// use vc_serializer::metadata::Discriminator;
///
/// let d = Discriminator::new("type", "Vehicle", [("car", "Car"), ("moped", "Moped")]).unwrap();
///
/// assert_eq!(d.class_for("moped"), Some("Moped"));
/// assert_eq!(d.value_for("Car"), Some("car"));
/// assert!(Discriminator::new("type", "Vehicle", Vec::<(&str, &str)>::new()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    field: String,
    base_class: String,
    map: IndexMap<String, String>,
    groups: Vec<String>,
    disabled: bool,
}

impl Discriminator {
    /// Creates a discriminator.
    ///
    /// Fails with an invalid-argument error if `field` or `map` is empty, or
    /// if a value maps to an empty class name.
    pub fn new<I, K, V>(field: impl Into<String>, base_class: impl Into<String>, map: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let field = field.into();
        let base_class = base_class.into();
        let map: IndexMap<String, String> =
            map.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

        if field.is_empty() {
            return Err(Error::invalid_argument(format!(
                "the discriminator field name of class `{base_class}` must not be empty",
            )));
        }
        if map.is_empty() {
            return Err(Error::invalid_argument(format!(
                "the discriminator map of class `{base_class}` must not be empty",
            )));
        }
        if let Some((value, _)) = map.iter().find(|(_, class)| class.is_empty()) {
            return Err(Error::invalid_argument(format!(
                "the discriminator value \"{value}\" of class `{base_class}` maps to an empty class name",
            )));
        }

        Ok(Self {
            field,
            base_class,
            map,
            groups: Vec::new(),
            disabled: false,
        })
    }

    /// A marker that switches the inherited discriminator off for a subclass.
    pub fn disabled(base_class: impl Into<String>) -> Self {
        Self {
            field: String::new(),
            base_class: base_class.into(),
            map: IndexMap::default(),
            groups: Vec::new(),
            disabled: true,
        }
    }

    /// Restricts the emitted tag to these groups.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[inline]
    pub fn base_class(&self) -> &str {
        &self.base_class
    }

    #[inline]
    pub fn map(&self) -> &IndexMap<String, String> {
        &self.map
    }

    #[inline]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the class mapped to `value`.
    #[inline]
    pub fn class_for(&self, value: &str) -> Option<&str> {
        self.map.get(value).map(String::as_str)
    }

    /// Returns the tag of `class`.
    pub fn value_for(&self, class: &str) -> Option<&str> {
        self.map
            .iter()
            .find(|(_, c)| c.as_str() == class)
            .map(|(v, _)| v.as_str())
    }

    /// The map keys, in order.
    pub fn available_values(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }
}

// -----------------------------------------------------------------------------
// ClassMetadata

/// Mapping directives of one class.
///
/// A provider yields one `ClassMetadata` per class with only the properties
/// that class declares. The [`MetadataFactory`] then combines the ancestor
/// chain with [`merge`](Self::merge) and calls [`finish`](Self::finish).
///
/// [`MetadataFactory`]: crate::metadata::MetadataFactory
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    name: String,
    parent: Option<String>,
    is_abstract: bool,
    exclusion_policy: ExclusionPolicy,
    access_type: AccessType,
    read_only: bool,
    properties: IndexMap<String, Arc<PropertyMetadata>>,
    accessor_order: Option<AccessorOrder>,
    xml_root_name: Option<String>,
    xml_root_namespace: Option<String>,
    xml_namespaces: IndexMap<String, String>,
    pre_serialize: Vec<String>,
    post_serialize: Vec<String>,
    post_deserialize: Vec<String>,
    discriminator: Option<Discriminator>,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            is_abstract: false,
            exclusion_policy: ExclusionPolicy::None,
            access_type: AccessType::Property,
            read_only: false,
            properties: IndexMap::default(),
            accessor_order: None,
            xml_root_name: None,
            xml_root_namespace: None,
            xml_namespaces: IndexMap::default(),
            pre_serialize: Vec::new(),
            post_serialize: Vec::new(),
            post_deserialize: Vec::new(),
            discriminator: None,
        }
    }

    // -------------------------------------------------------------------------
    // Builder

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_exclusion_policy(mut self, policy: ExclusionPolicy) -> Self {
        self.exclusion_policy = policy;
        self
    }

    /// Sets the class default access type, applied to properties added later.
    pub fn with_access_type(mut self, access_type: AccessType) -> Self {
        self.access_type = access_type;
        self
    }

    /// Marks every property added later read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_accessor_order(mut self, order: AccessorOrder) -> Self {
        self.accessor_order = Some(order);
        self
    }

    pub fn with_xml_root(mut self, name: impl Into<String>, namespace: Option<String>) -> Self {
        self.xml_root_name = Some(name.into());
        self.xml_root_namespace = namespace;
        self
    }

    pub fn with_xml_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.xml_namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_pre_serialize(mut self, method: impl Into<String>) -> Self {
        self.pre_serialize.push(method.into());
        self
    }

    pub fn with_post_serialize(mut self, method: impl Into<String>) -> Self {
        self.post_serialize.push(method.into());
        self
    }

    pub fn with_post_deserialize(mut self, method: impl Into<String>) -> Self {
        self.post_deserialize.push(method.into());
        self
    }

    pub fn with_discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    /// Adds a property, replacing one of the same name in place.
    ///
    /// The class access type and read-only flag apply to the property when it
    /// keeps the defaults.
    pub fn with_property(mut self, property: PropertyMetadata) -> Self {
        self.add_property(property);
        self
    }

    /// See [`with_property`](Self::with_property).
    pub fn add_property(&mut self, mut property: PropertyMetadata) {
        if property.access_type() == AccessType::Property {
            property = property.with_access_type(self.access_type);
        }
        if self.read_only {
            property = property.with_read_only(true);
        }
        self.properties
            .insert(property.name().into(), Arc::new(property));
    }

    // -------------------------------------------------------------------------
    // Getters

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    #[inline]
    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        self.exclusion_policy
    }

    #[inline]
    pub fn access_type(&self) -> AccessType {
        self.access_type
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Properties in output order.
    #[inline]
    pub fn properties(&self) -> &IndexMap<String, Arc<PropertyMetadata>> {
        &self.properties
    }

    #[inline]
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.get(name).map(|p| &**p)
    }

    /// The configured order, [`AccessorOrder::Undefined`] when unset.
    pub fn accessor_order(&self) -> &AccessorOrder {
        const UNDEFINED: &AccessorOrder = &AccessorOrder::Undefined;
        self.accessor_order.as_ref().unwrap_or(UNDEFINED)
    }

    #[inline]
    pub fn xml_root_name(&self) -> Option<&str> {
        self.xml_root_name.as_deref()
    }

    #[inline]
    pub fn xml_root_namespace(&self) -> Option<&str> {
        self.xml_root_namespace.as_deref()
    }

    #[inline]
    pub fn xml_namespaces(&self) -> &IndexMap<String, String> {
        &self.xml_namespaces
    }

    #[inline]
    pub fn pre_serialize_methods(&self) -> &[String] {
        &self.pre_serialize
    }

    #[inline]
    pub fn post_serialize_methods(&self) -> &[String] {
        &self.post_serialize
    }

    #[inline]
    pub fn post_deserialize_methods(&self) -> &[String] {
        &self.post_deserialize
    }

    /// The active discriminator, `None` if unset or disabled.
    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref().filter(|d| !d.is_disabled())
    }

    // -------------------------------------------------------------------------
    // Load-time processing

    /// Drops the properties hidden by the exclusion policy.
    pub fn apply_exclusion_policy(&mut self) {
        let policy = self.exclusion_policy;
        self.properties.retain(|_, prop| match prop.exposure() {
            Exposure::Exclude => false,
            Exposure::Expose => true,
            Exposure::Default => {
                policy == ExclusionPolicy::None || !matches!(prop.kind(), PropertyKind::Field)
            }
        });
    }

    /// Combines a parent with a child, producing the child's effective
    /// metadata. The child's own settings win where both define one.
    ///
    /// Fails with a logic error if both define discriminators on different
    /// fields.
    pub fn merge(parent: &ClassMetadata, child: ClassMetadata) -> Result<ClassMetadata> {
        let mut merged = child;

        let mut properties = parent.properties.clone();
        properties.extend(merged.properties);
        merged.properties = properties;

        merged.pre_serialize = concat(&parent.pre_serialize, merged.pre_serialize);
        merged.post_serialize = concat(&parent.post_serialize, merged.post_serialize);
        merged.post_deserialize = concat(&parent.post_deserialize, merged.post_deserialize);

        let mut namespaces = parent.xml_namespaces.clone();
        namespaces.extend(merged.xml_namespaces);
        merged.xml_namespaces = namespaces;

        if merged.accessor_order.is_none() {
            merged.accessor_order = parent.accessor_order.clone();
        }

        merged.discriminator = match (&parent.discriminator, merged.discriminator.take()) {
            (None, own) => own,
            (Some(inherited), None) => Some(inherited.clone()),
            (Some(_), Some(own)) if own.is_disabled() => Some(own),
            (Some(inherited), Some(_)) if inherited.is_disabled() => {
                return Err(Error::logic(format!(
                    "class `{}` defines a discriminator below a class that disables it",
                    merged.name,
                )));
            }
            (Some(inherited), Some(own)) => {
                if inherited.field != own.field {
                    return Err(Error::logic(format!(
                        "the discriminator field `{}` of class `{}` would overwrite the discriminator field `{}` of the parent class `{}`",
                        own.field, merged.name, inherited.field, parent.name,
                    )));
                }
                let mut combined = inherited.clone();
                combined.map.extend(own.map);
                if !own.groups.is_empty() {
                    combined.groups = own.groups;
                }
                Some(combined)
            }
        };

        Ok(merged)
    }

    /// Adds the discriminator tag of a concrete class and sorts properties.
    ///
    /// Fails with a logic error if a concrete class under a discriminator is
    /// not in its map, or declares a property named like the discriminator
    /// field.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(discriminator) = self.discriminator()
            && !self.is_abstract
        {
            let Some(value) = discriminator.value_for(&self.name) else {
                return Err(Error::logic(format!(
                    "the sub-class `{}` is not listed in the discriminator of the base class `{}`",
                    self.name, discriminator.base_class,
                )));
            };

            let field = discriminator.field.clone();
            if let Some(existing) = self.properties.get(&field)
                && !existing.is_static()
            {
                return Err(Error::logic(format!(
                    "the discriminator field name `{field}` of the base-class `{}` conflicts with a regular property of the sub-class `{}`",
                    discriminator.base_class, self.name,
                )));
            }

            let tag = PropertyMetadata::static_property(self.name.clone(), field.clone(), value)
                .with_serialized_name(field.clone())
                .with_groups(discriminator.groups.iter().cloned())?;
            self.properties.insert(field, Arc::new(tag));
        }

        self.sort_properties();
        Ok(())
    }

    fn sort_properties(&mut self) {
        match self.accessor_order() {
            AccessorOrder::Undefined => {}
            AccessorOrder::Alphabetical => self.properties.sort_by(|a, _, b, _| a.cmp(b)),
            AccessorOrder::Custom(order) => {
                let rank: HashMap<String, usize> = order
                    .iter()
                    .enumerate()
                    .map(|(i, name)| (name.clone(), i))
                    .collect();
                // Stable: unlisted properties keep their relative order.
                self.properties.sort_by(|a, _, b, _| {
                    match (rank.get(a.as_str()), rank.get(b.as_str())) {
                        (Some(x), Some(y)) => x.cmp(y),
                        (Some(_), None) => core::cmp::Ordering::Less,
                        (None, Some(_)) => core::cmp::Ordering::Greater,
                        (None, None) => core::cmp::Ordering::Equal,
                    }
                });
            }
        }
    }
}

fn concat(parent: &[String], child: Vec<String>) -> Vec<String> {
    let mut out = parent.to_vec();
    out.extend(child);
    out
}
