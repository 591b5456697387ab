//! The entry point of the crate.

use alloc::string::String;
use alloc::sync::Arc;
use std::sync::{PoisonError, RwLock};

use log::{debug, warn};
use serde_json::Value as Json;
use vc_utils::hash::HashMap;

use crate::construction::{FreshObjectConstructor, InitializedObjectConstructor, ObjectConstructor};
use crate::context::{Context, Direction};
use crate::error::{Error, Result};
use crate::event::EventDispatcher;
use crate::handler::HandlerRegistry;
use crate::metadata::{ClassRegistry, Instantiator, MetadataCache, MetadataFactory, MetadataProvider};
use crate::naming::{PropertyNamingStrategy, default_naming_strategy};
use crate::navigator::{DeserializationNavigator, SerializationNavigator};
use crate::types::Type;
use crate::value::{Data, InputView, Value};
use crate::visitor::{
    ArrayDeserializationVisitor, ArraySerializationVisitor, DeserializationVisitor,
    JsonDeserializationVisitor, JsonSerializationVisitor, SerializationVisitor,
};

fn unsupported(format: &str) -> Error {
    warn!("the format `{format}` is not supported, use `json` or the `Data` methods");
    Error::UnsupportedFormat(format.into())
}

// -----------------------------------------------------------------------------
// Serializer

/// Converts [`Value`] graphs to and from JSON and the neutral [`Data`] tree.
///
/// Every call takes an optional [`Context`]; without one, a default context is
/// used. A context serves exactly one call. Type expressions are parsed once
/// and cached.
///
/// # Examples
///
/// ```
/// use vc_serializer::Serializer;
/// use vc_serializer::metadata::{ClassMetadata, ClassRegistry, PropertyMetadata};
/// use vc_serializer::value::{DynamicObject, Value};
///
/// let mut registry = ClassRegistry::new();
/// registry.register_with(
///     ClassMetadata::new("User")
///         .with_property(PropertyMetadata::new("User", "firstName").with_type_str("string")?),
///     || Box::new(DynamicObject::new("User")),
/// );
/// let serializer = Serializer::builder().registry(registry).build();
///
/// let user = Value::object(DynamicObject::new("User").with("firstName", "Ann"));
/// let json = serializer.serialize(&user, "json", None, None)?;
/// assert_eq!(json, r#"{"first_name":"Ann"}"#);
///
/// let back = serializer.deserialize(&json, "User", "json", None)?;
/// assert_eq!(back, user);
/// # Ok::<(), vc_serializer::Error>(())
/// ```
pub struct Serializer {
    metadata: MetadataFactory,
    handlers: HandlerRegistry,
    events: EventDispatcher,
    constructor: Arc<dyn ObjectConstructor>,
    naming: Arc<dyn PropertyNamingStrategy>,
    pretty_json: bool,
    serialize_null: bool,
    types: RwLock<HashMap<String, Type>>,
}

impl Serializer {
    pub fn builder() -> SerializerBuilder {
        SerializerBuilder::new()
    }

    #[inline]
    pub fn metadata(&self) -> &MetadataFactory {
        &self.metadata
    }

    #[inline]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Serializes `value` into a string of `format`.
    ///
    /// `ty` is a type expression; `None` uses the type of `value` itself.
    pub fn serialize(
        &self,
        value: &Value,
        format: &str,
        context: Option<&mut Context>,
        ty: Option<&str>,
    ) -> Result<String> {
        match format {
            "json" => {
                let json = self.to_json(value, context, ty)?;
                let out = if self.pretty_json {
                    serde_json::to_string_pretty(&json)?
                } else {
                    serde_json::to_string(&json)?
                };
                Ok(out)
            }
            _ => Err(unsupported(format)),
        }
    }

    /// Deserializes a string of `format` as the type expression `ty`.
    pub fn deserialize(
        &self,
        input: &str,
        ty: &str,
        format: &str,
        context: Option<&mut Context>,
    ) -> Result<Value> {
        match format {
            "json" => {
                let mut visitor = JsonDeserializationVisitor::new(Arc::clone(&self.naming));
                let json = visitor.prepare(input)?;
                self.run_deserialization(&mut visitor, &json, ty, context)
            }
            _ => Err(unsupported(format)),
        }
    }

    /// Serializes `value` into a [`serde_json::Value`].
    pub fn to_json(&self, value: &Value, context: Option<&mut Context>, ty: Option<&str>) -> Result<Json> {
        let mut visitor = JsonSerializationVisitor::new(Arc::clone(&self.naming));
        self.run_serialization(&mut visitor, value, context, ty)
    }

    /// Deserializes a [`serde_json::Value`] as the type expression `ty`.
    pub fn from_json(&self, input: &Json, ty: &str, context: Option<&mut Context>) -> Result<Value> {
        let mut visitor = JsonDeserializationVisitor::new(Arc::clone(&self.naming));
        self.run_deserialization(&mut visitor, input, ty, context)
    }

    /// Serializes `value` into the neutral tree (the `array` format).
    pub fn to_data(&self, value: &Value, context: Option<&mut Context>, ty: Option<&str>) -> Result<Data> {
        let mut visitor = ArraySerializationVisitor::new(Arc::clone(&self.naming));
        self.run_serialization(&mut visitor, value, context, ty)
    }

    /// Deserializes the neutral tree (the `array` format) as `ty`.
    pub fn from_data(&self, data: &Data, ty: &str, context: Option<&mut Context>) -> Result<Value> {
        let mut visitor = ArrayDeserializationVisitor::new(Arc::clone(&self.naming));
        self.run_deserialization(&mut visitor, data, ty, context)
    }

    /// Parses a type expression through the cache.
    pub fn parse_type(&self, expr: &str) -> Result<Type> {
        if let Some(ty) = self.types.read().unwrap_or_else(PoisonError::into_inner).get(expr) {
            return Ok(ty.clone());
        }
        let ty = Type::parse(expr)?;
        self.types
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(expr.into(), ty.clone());
        Ok(ty)
    }

    // -------------------------------------------------------------------------
    // Calls

    fn run_serialization<V: SerializationVisitor>(
        &self,
        visitor: &mut V,
        value: &Value,
        context: Option<&mut Context>,
        ty: Option<&str>,
    ) -> Result<V::Output> {
        let mut default = Context::new();
        let context = context.unwrap_or(&mut default);
        context.initialize(Direction::Serialization, visitor.format(), self.serialize_null)?;
        let ty = ty.map(|expr| self.parse_type(expr)).transpose()?;

        debug!(
            "serializing {} as {} to {}",
            value.describe(),
            ty.as_ref().map_or(String::from("its own type"), |ty| alloc::format!("`{ty}`")),
            visitor.format(),
        );

        let output = SerializationNavigator::new(
            visitor,
            context,
            &self.metadata,
            &self.handlers,
            &self.events,
        )
        .accept(value, ty.as_ref())?;

        match output {
            Some(output) => Ok(output),
            None => visitor.visit_null(&Type::new(Type::NULL), context),
        }
    }

    fn run_deserialization<V: DeserializationVisitor>(
        &self,
        visitor: &mut V,
        input: &dyn InputView,
        ty: &str,
        context: Option<&mut Context>,
    ) -> Result<Value> {
        let mut default = Context::new();
        let context = context.unwrap_or(&mut default);
        context.initialize(Direction::Deserialization, visitor.format(), self.serialize_null)?;
        let ty = self.parse_type(ty)?;

        debug!("deserializing {} as `{ty}` from {}", input.describe(), visitor.format());

        DeserializationNavigator::new(
            visitor,
            context,
            &self.metadata,
            &self.handlers,
            &self.events,
            &*self.constructor,
        )
        .accept(input, Some(&ty))
    }
}

// -----------------------------------------------------------------------------
// SerializerBuilder

/// Configures a [`Serializer`].
///
/// Without a metadata provider, the serializer uses a [`ClassRegistry`] filled
/// by [`ClassRegistry::auto_register`]. Metadata is cached in a private
/// [`MetadataCache`] unless [`shared_metadata_cache`] is called.
///
/// [`shared_metadata_cache`]: SerializerBuilder::shared_metadata_cache
pub struct SerializerBuilder {
    provider: Option<Arc<dyn MetadataProvider>>,
    instantiator: Option<Arc<dyn Instantiator>>,
    cache: Option<Arc<MetadataCache>>,
    naming: Option<Arc<dyn PropertyNamingStrategy>>,
    handlers: HandlerRegistry,
    events: EventDispatcher,
    constructor: Option<Arc<dyn ObjectConstructor>>,
    pretty_json: bool,
    serialize_null: bool,
}

impl Default for SerializerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializerBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            instantiator: None,
            cache: None,
            naming: None,
            handlers: HandlerRegistry::new(),
            events: EventDispatcher::new(),
            constructor: None,
            pretty_json: false,
            serialize_null: false,
        }
    }

    /// Uses `registry` as metadata provider and instantiator.
    pub fn registry(mut self, registry: ClassRegistry) -> Self {
        let registry = Arc::new(registry);
        self.provider = Some(registry.clone());
        self.instantiator = Some(registry);
        self
    }

    pub fn metadata_provider(mut self, provider: impl MetadataProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn instantiator(mut self, instantiator: impl Instantiator + 'static) -> Self {
        self.instantiator = Some(Arc::new(instantiator));
        self
    }

    pub fn metadata_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Caches metadata in [`MetadataCache::global`].
    pub fn shared_metadata_cache(self) -> Self {
        self.metadata_cache(MetadataCache::global())
    }

    pub fn naming_strategy(mut self, naming: impl PropertyNamingStrategy + 'static) -> Self {
        self.naming = Some(Arc::new(naming));
        self
    }

    pub fn configure_handlers(mut self, configure: impl FnOnce(&mut HandlerRegistry)) -> Self {
        configure(&mut self.handlers);
        self
    }

    pub fn configure_listeners(mut self, configure: impl FnOnce(&mut EventDispatcher)) -> Self {
        configure(&mut self.events);
        self
    }

    /// Replaces the default constructor chain.
    pub fn object_constructor(mut self, constructor: impl ObjectConstructor + 'static) -> Self {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }

    /// Whether `null` properties are written when the context does not say.
    pub fn serialize_null(mut self, serialize_null: bool) -> Self {
        self.serialize_null = serialize_null;
        self
    }

    pub fn build(self) -> Serializer {
        let (provider, instantiator) = match (self.provider, self.instantiator) {
            (Some(provider), Some(instantiator)) => (provider, instantiator),
            (Some(provider), None) => {
                let none: Arc<dyn Instantiator> = Arc::new(ClassRegistry::new());
                (provider, none)
            }
            (None, instantiator) => {
                let mut registry = ClassRegistry::new();
                registry.auto_register();
                let registry = Arc::new(registry);
                let instantiator = instantiator.unwrap_or_else(|| registry.clone());
                (registry as Arc<dyn MetadataProvider>, instantiator)
            }
        };

        let constructor = self.constructor.unwrap_or_else(|| {
            let fresh: Arc<dyn ObjectConstructor> = Arc::new(FreshObjectConstructor::new(instantiator));
            Arc::new(InitializedObjectConstructor::new(fresh))
        });
        let cache = self.cache.unwrap_or_else(|| Arc::new(MetadataCache::new()));

        Serializer {
            metadata: MetadataFactory::new(provider, cache),
            handlers: self.handlers,
            events: self.events,
            constructor,
            naming: self.naming.unwrap_or_else(default_naming_strategy),
            pretty_json: self.pretty_json,
            serialize_null: self.serialize_null,
            types: RwLock::new(HashMap::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::Any;

    use serde_json::json;

    use super::Serializer;
    use crate::context::Context;
    use crate::error::{Error, ErrorKind, Result};
    use crate::exclusion::Groups;
    use crate::metadata::{
        AccessType, ClassMetadata, ClassRegistry, Discriminator, OnExclude, PropertyMetadata,
    };
    use crate::value::{Data, DynamicObject, Key, Object, Value};

    fn prop(class: &str, name: &str, ty: &str) -> PropertyMetadata {
        PropertyMetadata::new(class, name).with_type_str(ty).unwrap()
    }

    fn dynamic(class: &'static str) -> fn() -> Box<dyn Object> {
        match class {
            "Car" => || Box::new(DynamicObject::new("Car")),
            "Moped" => || Box::new(DynamicObject::new("Moped")),
            "User" => || Box::new(DynamicObject::new("User")),
            "Post" => || Box::new(DynamicObject::new("Post")),
            "Comment" => || Box::new(DynamicObject::new("Comment")),
            _ => || Box::new(DynamicObject::new("Doc")),
        }
    }

    fn serializer(configure: impl FnOnce(&mut ClassRegistry)) -> Serializer {
        let mut registry = ClassRegistry::new();
        configure(&mut registry);
        Serializer::builder().registry(registry).build()
    }

    // -------------------------------------------------------------------------
    // Polymorphism

    fn vehicles(registry: &mut ClassRegistry) {
        let discriminator = Discriminator::new("type", "Vehicle", [("car", "Car"), ("moped", "Moped")]).unwrap();
        registry.register(
            ClassMetadata::new("Vehicle")
                .with_abstract(true)
                .with_discriminator(discriminator)
                .with_property(prop("Vehicle", "name", "string")),
        );
        registry.register_with(
            ClassMetadata::new("Car")
                .with_parent("Vehicle")
                .with_property(prop("Car", "seats", "integer")),
            dynamic("Car"),
        );
        registry.register_with(
            ClassMetadata::new("Moped")
                .with_parent("Vehicle")
                .with_property(prop("Moped", "topSpeed", "double")),
            dynamic("Moped"),
        );
    }

    #[test]
    fn discriminator_round_trip() {
        let serializer = serializer(vehicles);
        let car = Value::object(DynamicObject::new("Car").with("name", "a").with("seats", Value::Int(4)));

        let json = serializer.serialize(&car, "json", None, None).unwrap();
        assert_eq!(json, r#"{"name":"a","seats":4,"type":"car"}"#);
        assert_eq!(serializer.deserialize(&json, "Vehicle", "json", None).unwrap(), car);

        let moped = serializer
            .deserialize(r#"{"type":"moped","name":"m","top_speed":45}"#, "Vehicle", "json", None)
            .unwrap();
        let moped = moped.downcast::<DynamicObject>().unwrap();
        assert_eq!(moped.class(), "Moped");
        assert_eq!(moped.get("topSpeed"), Some(&Value::Float(45.0)));
    }

    #[test]
    fn discriminator_errors() {
        let serializer = serializer(vehicles);

        let err = serializer
            .deserialize(r#"{"type":"truck"}"#, "Vehicle", "json", None)
            .unwrap_err();
        assert!(err.to_string().ends_with("Available types: car, moped"));

        let err = serializer
            .deserialize(r#"{"name":"x"}"#, "Vehicle", "json", None)
            .unwrap_err();
        assert!(matches!(err, Error::DiscriminatorFieldMissing { .. }));

        // The concrete class is taken as is.
        let car = serializer.deserialize(r#"{"seats":"2"}"#, "Car", "json", None).unwrap();
        assert_eq!(car.as_object().unwrap().get_field("seats"), Some(Value::Int(2)));
    }

    // -------------------------------------------------------------------------
    // Exclusion

    fn blog(registry: &mut ClassRegistry) {
        registry.register_with(
            ClassMetadata::new("Post")
                .with_property(prop("Post", "title", "string").with_groups(["post"]).unwrap())
                .with_property(
                    prop("Post", "comments", "array<Comment>")
                        .with_groups(["post"])
                        .unwrap(),
                ),
            dynamic("Post"),
        );
        registry.register_with(
            ClassMetadata::new("Comment")
                .with_property(prop("Comment", "text", "string").with_groups(["comment"]).unwrap())
                .with_property(prop("Comment", "author", "User").with_groups(["comment"]).unwrap()),
            dynamic("Comment"),
        );
        registry.register_with(
            ClassMetadata::new("User").with_property(prop("User", "name", "string")),
            dynamic("User"),
        );
    }

    fn post() -> Value {
        let author = DynamicObject::new("User").with("name", "ann");
        let comment = DynamicObject::new("Comment")
            .with("text", "nice")
            .with("author", Value::object(author));
        Value::object(
            DynamicObject::new("Post")
                .with("title", "Hi")
                .with("comments", vec![Value::object(comment)]),
        )
    }

    #[test]
    fn nested_groups_follow_the_path() {
        let serializer = serializer(blog);

        let mut context = Context::new();
        context
            .set_groups(Groups::from(["post"]).with_nested("comments", Groups::from(["comment"])))
            .unwrap();
        let out = serializer.to_json(&post(), Some(&mut context), None).unwrap();
        assert_eq!(
            out,
            json!({ "title": "Hi", "comments": [{ "text": "nice", "author": { "name": "ann" } }] })
        );

        let mut flat = Context::new();
        flat.set_groups(["post"]).unwrap();
        let out = serializer.to_json(&post(), Some(&mut flat), None).unwrap();
        assert_eq!(out, json!({ "title": "Hi", "comments": [{}] }));

        let mut default = Context::new();
        default.set_groups(Groups::new()).unwrap();
        assert_eq!(serializer.to_json(&post(), Some(&mut default), None).unwrap(), json!({}));

        // Without groups nothing is excluded.
        let all = serializer.to_json(&post(), None, None).unwrap();
        assert_eq!(all["comments"][0]["author"], json!({ "name": "ann" }));
    }

    fn chain(registry: &mut ClassRegistry) {
        registry.register(ClassMetadata::new("A").with_property(prop("A", "b", "B").with_max_depth(2)));
        registry.register(ClassMetadata::new("B").with_property(prop("B", "c", "C")));
        registry.register(ClassMetadata::new("C").with_property(prop("C", "d", "D")));
        registry.register(ClassMetadata::new("D").with_property(prop("D", "leaf", "string")));
    }

    #[test]
    fn max_depth_cuts_the_chain() {
        let serializer = serializer(chain);
        let d = DynamicObject::new("D").with("leaf", "deep");
        let c = DynamicObject::new("C").with("d", Value::object(d));
        let b = DynamicObject::new("B").with("c", Value::object(c));
        let a = Value::object(DynamicObject::new("A").with("b", Value::object(b)));

        let mut context = Context::new();
        context.enable_max_depth_checks().unwrap();
        let out = serializer.to_json(&a, Some(&mut context), None).unwrap();
        assert_eq!(out, json!({ "b": { "c": {} } }));

        let unchecked = serializer.to_json(&a, None, None).unwrap();
        assert_eq!(unchecked, json!({ "b": { "c": { "d": { "leaf": "deep" } } } }));
    }

    #[test]
    fn depth_cut_can_write_null() {
        let serializer = serializer(|registry| {
            registry.register(ClassMetadata::new("A").with_property(prop("A", "b", "B").with_max_depth(2)));
            registry.register(ClassMetadata::new("B").with_property(prop("B", "c", "C")));
            registry.register(
                ClassMetadata::new("C")
                    .with_property(prop("C", "d", "D").with_on_exclude(OnExclude::Null)),
            );
            registry.register(ClassMetadata::new("D").with_property(prop("D", "leaf", "string")));
        });
        let d = DynamicObject::new("D").with("leaf", "deep");
        let c = DynamicObject::new("C").with("d", Value::object(d));
        let b = DynamicObject::new("B").with("c", Value::object(c));
        let a = Value::object(DynamicObject::new("A").with("b", Value::object(b)));

        let mut context = Context::new();
        context.enable_max_depth_checks().unwrap();
        let out = serializer.to_json(&a, Some(&mut context), None).unwrap();
        assert_eq!(out, json!({ "b": { "c": { "d": null } } }));
    }

    #[test]
    fn version_window() {
        let serializer = serializer(|registry| {
            registry.register(
                ClassMetadata::new("Doc")
                    .with_property(prop("Doc", "fresh", "string").with_since("2.0"))
                    .with_property(prop("Doc", "legacy", "string").with_until("2.0")),
            );
        });
        let doc = Value::object(DynamicObject::new("Doc").with("fresh", "f").with("legacy", "l"));
        let at = |version: &str| {
            let mut context = Context::new();
            context.set_version(version).unwrap();
            serializer.to_json(&doc, Some(&mut context), None).unwrap()
        };

        assert_eq!(at("1.5"), json!({ "legacy": "l" }));
        assert_eq!(at("2.0"), json!({ "fresh": "f", "legacy": "l" }));
        assert_eq!(at("2.1"), json!({ "fresh": "f" }));
    }

    #[test]
    fn null_properties() {
        let serializer = serializer(|registry| {
            registry.register(ClassMetadata::new("User").with_property(prop("User", "name", "string")));
        });
        let user = Value::object(DynamicObject::new("User"));

        assert_eq!(serializer.to_json(&user, None, None).unwrap(), json!({}));

        let mut context = Context::new();
        context.set_serialize_null(true).unwrap();
        let out = serializer.to_json(&user, Some(&mut context), None).unwrap();
        assert_eq!(out, json!({ "name": null }));
    }

    // -------------------------------------------------------------------------
    // Formats

    #[test]
    fn data_round_trips_through_serde_formats() {
        let serializer = serializer(vehicles);
        let garage = Value::List(vec![
            Value::object(DynamicObject::new("Car").with("name", "a").with("seats", Value::Int(2))),
            Value::object(DynamicObject::new("Moped").with("name", "b").with("topSpeed", 30.5)),
        ]);

        let data = serializer.to_data(&garage, None, Some("array<Vehicle>")).unwrap();
        let text = ron::to_string(&data).unwrap();
        let parsed: Data = ron::from_str(&text).unwrap();
        assert_eq!(parsed, data);
        assert_eq!(serializer.from_data(&parsed, "array<Vehicle>", None).unwrap(), garage);

        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(serializer.deserialize(&json, "array<Vehicle>", "json", None).unwrap(), garage);
    }

    #[test]
    fn unsupported_formats_and_bad_types() {
        let serializer = serializer(|_| {});

        let err = serializer.serialize(&Value::Int(1), "yaml", None, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(serializer.deserialize("1", "integer", "xml", None).is_err());

        let err = serializer.deserialize("1", "array<", "json", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let err = serializer.deserialize("{}", "Ghost", "json", None).unwrap_err();
        assert!(matches!(err, Error::MetadataNotFound(_)));
    }

    #[test]
    fn pretty_json_and_scalars() {
        let serializer = Serializer::builder()
            .registry(ClassRegistry::new())
            .pretty_json(true)
            .build();
        let map = Value::Map([(Key::from("a"), Value::Int(1))].into_iter().collect());

        assert_eq!(serializer.serialize(&map, "json", None, None).unwrap(), "{\n  \"a\": 1\n}");
        assert_eq!(serializer.serialize(&Value::Int(7), "json", None, Some("string")).unwrap(), "\"7\"");
    }

    #[test]
    fn contexts_serve_one_call() {
        let serializer = serializer(|_| {});
        let mut context = Context::new();

        serializer.to_data(&Value::Null, Some(&mut context), None).unwrap();
        let err = serializer.to_data(&Value::Null, Some(&mut context), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Logic);
        assert_eq!(context.set_version("1").unwrap_err().kind(), ErrorKind::Logic);
    }

    // -------------------------------------------------------------------------
    // Construction, hooks and events

    #[test]
    fn target_is_filled_in_place() {
        let serializer = serializer(|registry| {
            registry.register(
                ClassMetadata::new("User")
                    .with_property(prop("User", "id", "integer"))
                    .with_property(prop("User", "name", "string")),
            );
        });

        let mut context = Context::new();
        context
            .set_target(DynamicObject::new("User").with("id", Value::Int(7)).with("name", "old"))
            .unwrap();
        let user = serializer
            .deserialize(r#"{"name":"new"}"#, "User", "json", Some(&mut context))
            .unwrap();

        let expected = DynamicObject::new("User").with("id", Value::Int(7)).with("name", "new");
        assert_eq!(user, Value::object(expected));

        // Without a target, `User` has no instantiator.
        let err = serializer.deserialize("{}", "User", "json", None).unwrap_err();
        assert!(matches!(err, Error::NotInstantiable(_)));
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Note {
        text: String,
        loaded: bool,
    }

    impl Object for Note {
        fn class_name(&self) -> &str {
            "Note"
        }

        fn has_field(&self, name: &str) -> bool {
            name == "text"
        }

        fn get_field(&self, name: &str) -> Option<Value> {
            (name == "text").then(|| Value::from(self.text.as_str()))
        }

        fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
            match (name, value) {
                ("text", Value::String(text)) => {
                    self.text = text;
                    Ok(())
                }
                _ => Err(Error::runtime("bad field")),
            }
        }

        fn call_mut(&mut self, name: &str, _args: Vec<Value>) -> Option<Result<Value>> {
            match name {
                "shout" => self.text = self.text.to_uppercase(),
                "markLoaded" => self.loaded = true,
                _ => return None,
            }
            Some(Ok(Value::Null))
        }

        fn clone_object(&self) -> Box<dyn Object> {
            Box::new(self.clone())
        }

        fn object_eq(&self, other: &dyn Object) -> Option<bool> {
            Some(other.as_any().downcast_ref::<Self>() == Some(self))
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

    fn notes() -> Serializer {
        let mut registry = ClassRegistry::new();
        registry.register_with(
            ClassMetadata::new("Note")
                .with_pre_serialize("shout")
                .with_post_deserialize("markLoaded")
                .with_property(prop("Note", "text", "string")),
            || Box::new(Note::default()),
        );
        Serializer::builder()
            .registry(registry)
            .configure_listeners(|events| {
                events.on_post_deserialize(Some("Note"), Some("json"), |event| {
                    let text = event.object().get_field("text").unwrap_or_default();
                    let suffixed = alloc::format!("{}!", text.as_str().unwrap_or_default());
                    let _ = event.object_mut().set_field("text", Value::String(suffixed));
                });
            })
            .build()
    }

    #[test]
    fn lifecycle_hooks_and_listeners() {
        let serializer = notes();
        let note = Value::object(Note {
            text: String::from("hi"),
            loaded: false,
        });

        // The hook runs on a copy.
        assert_eq!(serializer.to_data(&note, None, None).unwrap(), Data::map([("text", Data::from("HI"))]));
        assert_eq!(note.downcast_ref::<Note>().unwrap().text, "hi");

        let back = serializer.deserialize(r#"{"text":"yo"}"#, "Note", "json", None).unwrap();
        let back = back.downcast::<Note>().unwrap();
        assert_eq!(*back, Note { text: String::from("yo!"), loaded: true });

        // Listeners are filtered by format.
        let from_data = serializer.from_data(&Data::map([("text", Data::from("yo"))]), "Note", None).unwrap();
        assert_eq!(from_data.downcast_ref::<Note>().unwrap().text, "yo");
    }

    #[test]
    fn handlers_replace_types() {
        let serializer = Serializer::builder()
            .registry(ClassRegistry::new())
            .configure_handlers(|handlers| {
                handlers.register_serialization("Money", None, |value, _, _| {
                    Ok(Data::from(alloc::format!("{} EUR", value.as_int().unwrap_or_default())))
                });
                handlers.register_deserialization("Money", Some("json"), |input, _, _| {
                    let text = input.to_data().as_str().unwrap_or_default().to_string();
                    let amount = text.trim_end_matches(" EUR").parse::<i64>().map_err(|_| Error::runtime("bad money"))?;
                    Ok(Value::Int(amount))
                });
            })
            .build();

        let prices = Value::List(vec![Value::Int(3), Value::Int(5)]);
        let json = serializer.serialize(&prices, "json", None, Some("array<Money>")).unwrap();
        assert_eq!(json, r#"["3 EUR","5 EUR"]"#);
        assert_eq!(serializer.deserialize(&json, "array<Money>", "json", None).unwrap(), prices);

        let err = serializer.deserialize(r#"["x"]"#, "array<Money>", "json", None).unwrap_err();
        assert_eq!(err.path(), Some("[0]"));
    }

    // -------------------------------------------------------------------------
    // Properties

    #[test]
    fn inline_properties_read_the_parent_input() {
        let serializer = serializer(|registry| {
            registry.register_with(
                ClassMetadata::new("User")
                    .with_property(prop("User", "name", "string"))
                    .with_property(prop("User", "address", "Address").with_inline(true)),
                dynamic("User"),
            );
            registry.register_with(
                ClassMetadata::new("Address")
                    .with_property(prop("Address", "street", "string"))
                    .with_property(prop("Address", "city", "string")),
                || Box::new(DynamicObject::new("Address")),
            );
        });
        let address = DynamicObject::new("Address").with("street", "Main").with("city", "Paris");
        let user = Value::object(
            DynamicObject::new("User")
                .with("name", "Ann")
                .with("address", Value::object(address)),
        );

        let json = serializer.serialize(&user, "json", None, None).unwrap();
        assert_eq!(json, r#"{"name":"Ann","street":"Main","city":"Paris"}"#);
        assert_eq!(serializer.deserialize(&json, "User", "json", None).unwrap(), user);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Robot {
        serial: String,
    }

    impl Object for Robot {
        fn class_name(&self) -> &str {
            "Robot"
        }

        fn has_field(&self, _name: &str) -> bool {
            false
        }

        fn get_field(&self, _name: &str) -> Option<Value> {
            None
        }

        fn set_field(&mut self, _name: &str, _value: Value) -> Result<()> {
            Err(Error::runtime("robots have no fields"))
        }

        fn has_method(&self, name: &str) -> bool {
            name == "get_name"
        }

        fn call(&self, name: &str) -> Option<Result<Value>> {
            (name == "get_name").then(|| Ok(Value::from(alloc::format!("R-{}", self.serial))))
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
    fn inherited_accessors_resolve_per_class() {
        let serializer = serializer(|registry| {
            registry.register(
                ClassMetadata::new("Named")
                    .with_access_type(AccessType::PublicMethod)
                    .with_property(prop("Named", "name", "string")),
            );
            registry.register(ClassMetadata::new("Robot").with_parent("Named"));
            registry.register(ClassMetadata::new("Person").with_parent("Named"));
        });
        let robot = Value::object(Robot { serial: String::from("7") });
        let person = Value::object(DynamicObject::new("Person").with("name", "Ann"));

        assert_eq!(serializer.serialize(&robot, "json", None, None).unwrap(), r#"{"name":"R-7"}"#);
        assert_eq!(serializer.serialize(&person, "json", None, None).unwrap(), r#"{"name":"Ann"}"#);
        assert_eq!(serializer.serialize(&robot, "json", None, None).unwrap(), r#"{"name":"R-7"}"#);
    }

    #[test]
    fn empty_class_names_are_rejected() {
        let serializer = serializer(|_| {});
        let nameless = Value::object(DynamicObject::new(""));

        let err = serializer.serialize(&nameless, "json", None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = serializer.to_json(&nameless, None, Some("User")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
