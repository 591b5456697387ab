use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use std::sync::{PoisonError, RwLock};

use vc_utils::hash::HashMap;

use crate::error::{Error, Result};
use crate::types::Type;
use crate::value::{Data, Object, Value};

// -----------------------------------------------------------------------------
// Enums

/// How a property's value is obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// A stored field, read and written through its accessors.
    Field,
    /// A computed value returned by a method. Always read-only.
    Virtual { method: String },
    /// A constant, such as the discriminator tag of a subclass.
    Static { value: Data },
}

/// Default accessor strategy of a class or property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessType {
    /// Read and write the field directly.
    #[default]
    Property,
    /// Go through conventionally named getter and setter methods.
    PublicMethod,
}

/// What an excluded property turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OnExclude {
    /// The property is left out of the output.
    #[default]
    Skip,
    /// The property is written as `null`.
    Null,
}

/// Per-property exposure, checked against the class exclusion policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Exposure {
    #[default]
    Default,
    Expose,
    Exclude,
}

/// XML mapping flags. Carried for XML visitors, unused by the core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlProperty {
    pub attribute: bool,
    pub value: bool,
    pub cdata: bool,
    pub namespace: Option<String>,
    pub collection: bool,
    pub entry_name: Option<String>,
    pub inline: bool,
    pub key_attribute: Option<String>,
    pub attribute_map: bool,
}

/// A resolved way to read or write a property on an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// The field of this name.
    Field(String),
    /// The method of this name.
    Method(String),
}

/// Accessors resolved so far, keyed by the runtime class they were resolved on.
///
/// A clone starts empty.
#[derive(Debug, Default)]
struct AccessorMemo(RwLock<HashMap<String, Accessor>>);

impl AccessorMemo {
    fn get_or_resolve(
        &self,
        object: &dyn Object,
        resolve: impl FnOnce(&dyn Object) -> Result<Accessor>,
    ) -> Result<Accessor> {
        let class = object.class_name();
        if let Some(accessor) = self.0.read().unwrap_or_else(PoisonError::into_inner).get(class) {
            return Ok(accessor.clone());
        }
        let accessor = resolve(object)?;
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(class.into(), accessor.clone());
        Ok(accessor)
    }
}

impl Clone for AccessorMemo {
    fn clone(&self) -> Self {
        Self::default()
    }
}

// -----------------------------------------------------------------------------
// PropertyMetadata

/// Mapping directives of one property.
///
/// Accessors are resolved on first use and memoized per runtime class; a
/// property whose accessor cannot be found only fails when it is actually read
/// or written.
///
/// # Examples
///
/// ```
/// use vc_serializer::metadata::{AccessType, Accessor, PropertyMetadata};
/// use vc_serializer::value::{DynamicObject, Value};
///
/// let prop = PropertyMetadata::new("User", "name").with_access_type(AccessType::PublicMethod);
/// let user = DynamicObject::new("User").with("name", "Tom");
///
/// // No `get_name`/`is_name`/`has_name`/`name` method: the field is used.
/// assert_eq!(prop.get_value(&user).unwrap(), Value::from("Tom"));
/// assert_eq!(prop.getter(&user).unwrap(), Accessor::Field("name".into()));
/// ```
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    class: String,
    name: String,
    kind: PropertyKind,
    ty: Option<Type>,
    serialized_name: Option<String>,
    groups: Vec<String>,
    exclusion_groups: Vec<String>,
    since_version: Option<String>,
    until_version: Option<String>,
    read_only: bool,
    access_type: AccessType,
    explicit_getter: Option<String>,
    explicit_setter: Option<String>,
    inline: bool,
    max_depth: Option<usize>,
    on_exclude: OnExclude,
    exposure: Exposure,
    xml: XmlProperty,
    getter: AccessorMemo,
    setter: AccessorMemo,
}

impl PropertyMetadata {
    /// Creates a field property of `class`.
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            kind: PropertyKind::Field,
            ty: None,
            serialized_name: None,
            groups: Vec::new(),
            exclusion_groups: Vec::new(),
            since_version: None,
            until_version: None,
            read_only: false,
            access_type: AccessType::Property,
            explicit_getter: None,
            explicit_setter: None,
            inline: false,
            max_depth: None,
            on_exclude: OnExclude::Skip,
            exposure: Exposure::Default,
            xml: XmlProperty::default(),
            getter: AccessorMemo::default(),
            setter: AccessorMemo::default(),
        }
    }

    /// Creates a read-only property computed by `method`.
    pub fn virtual_property(
        class: impl Into<String>,
        name: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        let mut prop = Self::new(class, name);
        prop.kind = PropertyKind::Virtual {
            method: method.into(),
        };
        prop.read_only = true;
        prop
    }

    /// Creates a read-only property with a constant value.
    pub fn static_property(
        class: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Data>,
    ) -> Self {
        let mut prop = Self::new(class, name);
        prop.kind = PropertyKind::Static {
            value: value.into(),
        };
        prop.read_only = true;
        prop
    }

    // -------------------------------------------------------------------------
    // Builder

    pub fn with_type(mut self, ty: Type) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Parses and sets the type.
    pub fn with_type_str(self, ty: &str) -> Result<Self> {
        Ok(self.with_type(Type::parse(ty)?))
    }

    pub fn with_serialized_name(mut self, name: impl Into<String>) -> Self {
        self.serialized_name = Some(name.into());
        self
    }

    /// Sets the groups. Names prefixed with `!` become exclusion groups.
    ///
    /// Group names must not contain a comma.
    pub fn with_groups<I, S>(mut self, groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.clear();
        self.exclusion_groups.clear();
        for group in groups {
            let group: String = group.into();
            if group.contains(',') {
                return Err(Error::invalid_argument(format!(
                    "invalid group name \"{group}\" on \"{}::{}\", did you mean to create multiple groups?",
                    self.class, self.name,
                )));
            }
            match group.strip_prefix('!') {
                Some(excluded) => self.exclusion_groups.push(excluded.into()),
                None => self.groups.push(group),
            }
        }
        Ok(self)
    }

    pub fn with_since(mut self, version: impl Into<String>) -> Self {
        self.since_version = Some(version.into());
        self
    }

    pub fn with_until(mut self, version: impl Into<String>) -> Self {
        self.until_version = Some(version.into());
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only || !matches!(self.kind, PropertyKind::Field);
        self
    }

    pub fn with_access_type(mut self, access_type: AccessType) -> Self {
        self.access_type = access_type;
        self
    }

    /// Sets explicit accessor method names, bypassing naming conventions.
    pub fn with_accessors(mut self, getter: Option<String>, setter: Option<String>) -> Self {
        self.explicit_getter = getter;
        self.explicit_setter = setter;
        self
    }

    pub fn with_inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_on_exclude(mut self, on_exclude: OnExclude) -> Self {
        self.on_exclude = on_exclude;
        self
    }

    pub fn with_exposure(mut self, exposure: Exposure) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn with_xml(mut self, xml: XmlProperty) -> Self {
        self.xml = xml;
        self
    }

    // -------------------------------------------------------------------------
    // Getters

    /// The declaring class.
    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    #[inline]
    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    #[inline]
    pub fn serialized_name(&self) -> Option<&str> {
        self.serialized_name.as_deref()
    }

    #[inline]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[inline]
    pub fn exclusion_groups(&self) -> &[String] {
        &self.exclusion_groups
    }

    #[inline]
    pub fn since_version(&self) -> Option<&str> {
        self.since_version.as_deref()
    }

    #[inline]
    pub fn until_version(&self) -> Option<&str> {
        self.until_version.as_deref()
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[inline]
    pub fn access_type(&self) -> AccessType {
        self.access_type
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        self.inline
    }

    #[inline]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[inline]
    pub fn on_exclude(&self) -> OnExclude {
        self.on_exclude
    }

    #[inline]
    pub fn exposure(&self) -> Exposure {
        self.exposure
    }

    #[inline]
    pub fn xml(&self) -> &XmlProperty {
        &self.xml
    }

    /// Returns `true` for a static property.
    #[inline]
    pub fn is_static(&self) -> bool {
        matches!(self.kind, PropertyKind::Static { .. })
    }

    // -------------------------------------------------------------------------
    // Access

    /// Resolves the read accessor for `object`, memoized per class of `object`.
    pub fn getter(&self, object: &dyn Object) -> Result<Accessor> {
        self.getter
            .get_or_resolve(object, |object| self.resolve_getter(object))
    }

    /// Resolves the write accessor for `object`, memoized per class of `object`.
    pub fn setter(&self, object: &dyn Object) -> Result<Accessor> {
        self.setter
            .get_or_resolve(object, |object| self.resolve_setter(object))
    }

    fn resolve_getter(&self, object: &dyn Object) -> Result<Accessor> {
        if let PropertyKind::Virtual { method } = &self.kind {
            return Ok(Accessor::Method(method.clone()));
        }
        if let Some(getter) = &self.explicit_getter {
            return Ok(Accessor::Method(getter.clone()));
        }
        if self.access_type == AccessType::Property {
            return Ok(Accessor::Field(self.name.clone()));
        }

        let candidates = [
            format!("get_{}", self.name),
            format!("is_{}", self.name),
            format!("has_{}", self.name),
            self.name.clone(),
        ];
        if let Some(method) = candidates.iter().find(|m| object.has_method(m)) {
            return Ok(Accessor::Method(method.clone()));
        }
        if object.has_field(&self.name) {
            return Ok(Accessor::Field(self.name.clone()));
        }
        Err(self.missing_accessor(candidates.into_iter().collect()))
    }

    fn resolve_setter(&self, object: &dyn Object) -> Result<Accessor> {
        if !matches!(self.kind, PropertyKind::Field) {
            return Err(Error::logic(format!(
                "property `{}::{}` is not a field and cannot be written",
                self.class, self.name,
            )));
        }
        if let Some(setter) = &self.explicit_setter {
            return Ok(Accessor::Method(setter.clone()));
        }
        if self.access_type == AccessType::Property {
            return Ok(Accessor::Field(self.name.clone()));
        }

        let method = format!("set_{}", self.name);
        if object.has_method(&method) {
            return Ok(Accessor::Method(method));
        }
        if object.has_field(&self.name) {
            return Ok(Accessor::Field(self.name.clone()));
        }
        Err(self.missing_accessor(alloc::vec![method]))
    }

    fn missing_accessor(&self, tried: Vec<String>) -> Error {
        Error::MissingAccessor {
            class: self.class.clone(),
            property: self.name.clone(),
            tried,
        }
    }

    /// Reads the property from `object`.
    ///
    /// Unset fields read as `null`.
    pub fn get_value(&self, object: &dyn Object) -> Result<Value> {
        if let PropertyKind::Static { value } = &self.kind {
            return Ok(Value::from(value.clone()));
        }
        match self.getter(object)? {
            Accessor::Field(name) => Ok(object.get_field(&name).unwrap_or_default()),
            Accessor::Method(method) => object.invoke(&method),
        }
    }

    /// Writes the property on `object`.
    pub fn set_value(&self, object: &mut dyn Object, value: Value) -> Result<()> {
        if self.read_only {
            return Err(Error::logic(format!(
                "property `{}::{}` is read-only",
                self.class, self.name,
            )));
        }
        match self.setter(object)? {
            Accessor::Field(name) => object.set_field(&name, value),
            Accessor::Method(method) => object
                .invoke_mut(&method, alloc::vec![value])
                .map(|_| ()),
        }
    }
}

impl PartialEq for PropertyMetadata {
    /// Compares the mapping directives, ignoring memoized accessors.
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && self.name == other.name
            && self.kind == other.kind
            && self.ty == other.ty
            && self.serialized_name == other.serialized_name
            && self.groups == other.groups
            && self.exclusion_groups == other.exclusion_groups
            && self.since_version == other.since_version
            && self.until_version == other.until_version
            && self.read_only == other.read_only
            && self.access_type == other.access_type
            && self.explicit_getter == other.explicit_getter
            && self.explicit_setter == other.explicit_setter
            && self.inline == other.inline
            && self.max_depth == other.max_depth
            && self.on_exclude == other.on_exclude
            && self.exposure == other.exposure
            && self.xml == other.xml
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::any::Any;

    use super::{AccessType, Accessor, PropertyMetadata};
    use crate::error::{Error, ErrorKind, Result};
    use crate::value::{DynamicObject, Object, Value};

    #[derive(Debug, Clone, Default)]
    struct Account {
        active: bool,
        owner: String,
    }

    impl Object for Account {
        fn class_name(&self) -> &str {
            "Account"
        }
        fn has_field(&self, name: &str) -> bool {
            name == "owner"
        }
        fn get_field(&self, name: &str) -> Option<Value> {
            (name == "owner").then(|| Value::from(self.owner.as_str()))
        }
        fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
            match (name, value) {
                ("owner", Value::String(s)) => {
                    self.owner = s;
                    Ok(())
                }
                _ => Err(Error::runtime("bad field")),
            }
        }
        fn has_method(&self, name: &str) -> bool {
            matches!(name, "is_active" | "set_active")
        }
        fn call(&self, name: &str) -> Option<Result<Value>> {
            (name == "is_active").then_some(Ok(Value::Bool(self.active)))
        }
        fn call_mut(&mut self, name: &str, mut args: Vec<Value>) -> Option<Result<Value>> {
            (name == "set_active").then(|| {
                self.active = args.pop().and_then(|v| v.as_bool()).unwrap_or_default();
                Ok(Value::Null)
            })
        }
        fn clone_object(&self) -> Box<dyn Object> {
            Box::new(self.clone())
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

    #[test]
    fn public_method_access_prefers_conventional_methods() {
        let prop = PropertyMetadata::new("Account", "active").with_access_type(AccessType::PublicMethod);
        let mut account = Account::default();

        prop.set_value(&mut account, Value::Bool(true)).unwrap();
        assert!(account.active);
        assert_eq!(prop.get_value(&account).unwrap(), Value::Bool(true));
        assert_eq!(prop.getter(&account).unwrap(), Accessor::Method("is_active".into()));
        assert_eq!(prop.setter(&account).unwrap(), Accessor::Method("set_active".into()));
    }

    #[test]
    fn accessors_are_memoized_per_runtime_class() {
        let prop = PropertyMetadata::new("Account", "active").with_access_type(AccessType::PublicMethod);
        let account = Account {
            active: true,
            ..Account::default()
        };
        let user = DynamicObject::new("User").with("active", false);

        assert_eq!(prop.get_value(&account).unwrap(), Value::Bool(true));
        assert_eq!(prop.get_value(&user).unwrap(), Value::Bool(false));
        assert_eq!(prop.getter(&user).unwrap(), Accessor::Field("active".into()));

        let copy = prop.clone();
        assert_eq!(copy.get_value(&user).unwrap(), Value::Bool(false));
    }

    #[test]
    fn missing_accessor_fails_on_access_only() {
        let prop = PropertyMetadata::new("Account", "balance").with_access_type(AccessType::PublicMethod);
        let err = prop.get_value(&Account::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Runtime);
        match err {
            Error::MissingAccessor { tried, .. } => {
                assert_eq!(tried, ["get_balance", "is_balance", "has_balance", "balance"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn groups_split_exclusions_and_reject_commas() {
        let prop = PropertyMetadata::new("Post", "title")
            .with_groups(["list", "!admin"])
            .unwrap();
        assert_eq!(prop.groups(), ["list"]);
        assert_eq!(prop.exclusion_groups(), ["admin"]);

        let err = PropertyMetadata::new("Post", "title")
            .with_groups(["a,b"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn static_and_virtual_properties_are_read_only() {
        let tag = PropertyMetadata::static_property("Car", "type", "car");
        let mut car = DynamicObject::new("Car");

        assert_eq!(tag.get_value(&car).unwrap(), Value::from("car"));
        assert!(tag.is_read_only());
        assert_eq!(
            tag.set_value(&mut car, Value::Null).unwrap_err().kind(),
            ErrorKind::Logic
        );

        let full = PropertyMetadata::virtual_property("User", "full_name", "full_name");
        assert!(full.is_read_only());
        assert_eq!(
            full.get_value(&car).unwrap_err().kind(),
            ErrorKind::Runtime
        );
    }
}
