use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_utils::hash::IndexMap;

use crate::construction::ObjectConstructor;
use crate::context::{Context, PathSegment};
use crate::error::{Error, Result};
use crate::event::{EventDispatcher, PostDeserializeEvent, PreDeserializeEvent};
use crate::handler::{DeserializationNavigate, HandlerRegistry};
use crate::metadata::{ClassMetadata, Discriminator, MetadataFactory};
use crate::navigator::array_params;
use crate::types::{Primitive, Type};
use crate::value::{InputView, Key, Object, Value};
use crate::visitor::DeserializationVisitor;

fn resolve_discriminator(discriminator: &Discriminator, input: &dyn InputView) -> Result<String> {
    let missing = || Error::DiscriminatorFieldMissing {
        field: discriminator.field().into(),
        base_class: discriminator.base_class().into(),
    };
    let value = input
        .get_field(discriminator.field())
        .filter(|field| !field.is_null())
        .and_then(|field| field.to_data().to_key_string())
        .ok_or_else(missing)?;

    match discriminator.class_for(&value) {
        Some(class) => Ok(class.into()),
        None => Err(Error::DiscriminatorValueUnknown {
            value,
            base_class: discriminator.base_class().into(),
            available: discriminator.available_values(),
        }),
    }
}

/// Walks raw input and builds a [`Value`] graph of the requested type.
///
/// Per node, in order: untyped input, `null`, custom handler, primitive,
/// object. Objects:
///
/// 1. the pre-deserialize listeners may rewrite the type;
/// 2. a handler for the (rewritten) type takes over;
/// 3. if the type is the base class of a discriminator, the discriminator
///    field of the input selects the concrete class;
/// 4. the depth is increased; an excluded class yields `null`;
/// 5. the constructor chain provides the object;
/// 6. every property that is not excluded, not read-only and present in the
///    input is deserialized and written; inline properties read the input of
///    the object itself;
/// 7. post-deserialize methods and listeners run, and the depth is restored.
pub struct DeserializationNavigator<'a, V: DeserializationVisitor + ?Sized> {
    visitor: &'a mut V,
    context: &'a mut Context,
    metadata: &'a MetadataFactory,
    handlers: &'a HandlerRegistry,
    events: &'a EventDispatcher,
    constructor: &'a dyn ObjectConstructor,
}

impl<'a, V: DeserializationVisitor + ?Sized> DeserializationNavigator<'a, V> {
    pub fn new(
        visitor: &'a mut V,
        context: &'a mut Context,
        metadata: &'a MetadataFactory,
        handlers: &'a HandlerRegistry,
        events: &'a EventDispatcher,
        constructor: &'a dyn ObjectConstructor,
    ) -> Self {
        Self {
            visitor,
            context,
            metadata,
            handlers,
            events,
            constructor,
        }
    }

    /// Deserializes `input` as `ty`; `None` keeps the input untyped.
    pub fn accept(&mut self, input: &dyn InputView, ty: Option<&Type>) -> Result<Value> {
        let Some(ty) = ty else {
            return Ok(Value::from(self.visitor.visit_custom(input, self.context)?));
        };
        if input.is_null() {
            return self.visitor.visit_null(input, ty, self.context);
        }

        let handlers = self.handlers;
        if let Some(handler) = handlers.deserialization(ty.name(), self.visitor.format()) {
            return handler(input, ty, self);
        }

        let context = &*self.context;
        match ty.primitive() {
            Some(Primitive::Null) => self.visitor.visit_null(input, ty, context),
            Some(Primitive::Boolean) => self.visitor.visit_boolean(input, ty, context).map(Value::Bool),
            Some(Primitive::Integer) => self.visitor.visit_integer(input, ty, context).map(Value::Int),
            Some(Primitive::Double) => self.visitor.visit_double(input, ty, context).map(Value::Float),
            Some(Primitive::String) => self.visitor.visit_string(input, ty, context).map(Value::String),
            Some(Primitive::Array) => self.accept_array(input, ty),
            None => self.accept_object(input, ty.clone()),
        }
    }

    // -------------------------------------------------------------------------
    // Collections

    fn accept_array(&mut self, input: &dyn InputView, ty: &Type) -> Result<Value> {
        match array_params(ty)? {
            0 => Ok(Value::from(self.visitor.visit_custom(input, self.context)?)),
            1 => {
                let item_ty = ty.param_type(0);
                let items = self.visitor.visit_array(input, ty, self.context)?;
                let mut list = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    list.push(self.accept_entry(Key::from(index), item, item_ty)?);
                }
                Ok(Value::List(list))
            }
            _ => {
                let value_ty = ty.param_type(1);
                let entries = self.visitor.visit_hash(input, ty, self.context)?;
                let mut map = IndexMap::with_capacity_and_hasher(entries.len(), Default::default());
                for (key, item) in entries {
                    let value = self.accept_entry(key.clone(), item, value_ty)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
        }
    }

    fn accept_entry(&mut self, key: Key, item: &dyn InputView, item_ty: Option<&Type>) -> Result<Value> {
        self.context.push_path(PathSegment::Index(key));
        let result = self
            .accept(item, item_ty)
            .map_err(|e| self.context.error_at_path(e));
        self.context.pop_path();
        result
    }

    // -------------------------------------------------------------------------
    // Objects

    fn accept_object(&mut self, input: &dyn InputView, mut ty: Type) -> Result<Value> {
        self.events
            .pre_deserialize(&mut PreDeserializeEvent::new(input, &mut ty, self.context));

        let handlers = self.handlers;
        if let Some(handler) = handlers.deserialization(ty.name(), self.visitor.format()) {
            return handler(input, &ty, self);
        }

        let mut metadata = self.metadata.require_metadata_for(ty.name())?;
        let concrete = match metadata.discriminator() {
            Some(discriminator) if discriminator.base_class() == ty.name() => {
                Some(resolve_discriminator(discriminator, input)?)
            }
            _ => None,
        };
        if let Some(class) = concrete {
            ty.set_name(class);
            metadata = self.metadata.require_metadata_for(ty.name())?;
        }

        self.context.increase_depth();
        let result = self.visit_class(input, &metadata, &ty);
        self.context.decrease_depth();
        result
    }

    fn visit_class(
        &mut self,
        input: &dyn InputView,
        metadata: &Arc<ClassMetadata>,
        ty: &Type,
    ) -> Result<Value> {
        if self.context.should_skip_class(metadata) {
            return Ok(Value::Null);
        }

        self.context.push_class_metadata(Arc::clone(metadata));
        let result = self.visit_members(input, metadata, ty);
        self.context.pop_frame();
        let Some(mut object) = result? else {
            return Ok(Value::Null);
        };

        for method in metadata.post_deserialize_methods() {
            object.invoke_mut(method, Vec::new())?;
        }
        self.events
            .post_deserialize(&mut PostDeserializeEvent::new(&mut *object, ty, self.context));
        Ok(Value::Object(object))
    }

    fn visit_members(
        &mut self,
        input: &dyn InputView,
        metadata: &ClassMetadata,
        ty: &Type,
    ) -> Result<Option<Box<dyn Object>>> {
        let Some(mut object) = self.constructor.construct(metadata, input, ty, self.context)? else {
            return Ok(None);
        };
        self.visitor.visit_object(metadata, input, self.context)?;

        for property in metadata.properties().values() {
            if property.is_read_only() || self.context.should_skip_property(property) {
                continue;
            }
            let property_input = if property.is_inline() {
                Some(input)
            } else {
                self.visitor.visit_property(property, input, self.context)
            };
            let Some(property_input) = property_input else {
                continue;
            };

            self.context
                .push_path(PathSegment::Property(property.name().into()));
            self.context.push_property_metadata(Arc::clone(property));
            let result = self
                .accept(property_input, property.ty())
                .and_then(|value| property.set_value(&mut *object, value));
            self.context.pop_frame();
            let result = result.map_err(|e| self.context.error_at_path(e));
            self.context.pop_path();
            result?;
        }
        Ok(Some(object))
    }
}

impl<V: DeserializationVisitor + ?Sized> DeserializationNavigate for DeserializationNavigator<'_, V> {
    fn context(&self) -> &Context {
        self.context
    }

    fn navigate(&mut self, input: &dyn InputView, ty: Option<&Type>) -> Result<Value> {
        self.accept(input, ty)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::sync::Arc;
    use alloc::vec;

    use super::DeserializationNavigator;
    use crate::construction::FreshObjectConstructor;
    use crate::context::{Context, Direction};
    use crate::error::{Error, Result};
    use crate::event::EventDispatcher;
    use crate::handler::HandlerRegistry;
    use crate::metadata::{ClassMetadata, ClassRegistry, MetadataCache, MetadataFactory, PropertyMetadata};
    use crate::types::Type;
    use crate::value::{Data, DynamicObject, Key, Value};
    use crate::visitor::ArrayDeserializationVisitor;

    fn run(input: &Data, ty: &str) -> Result<Value> {
        let mut registry = ClassRegistry::new();
        registry.register_with(
            ClassMetadata::new("Point")
                .with_property(PropertyMetadata::new("Point", "x").with_type_str("integer")?)
                .with_property(PropertyMetadata::new("Point", "y").with_type_str("integer")?),
            || Box::new(DynamicObject::new("Point")),
        );
        let registry = Arc::new(registry);
        let metadata = MetadataFactory::new(registry.clone(), Arc::new(MetadataCache::new()));
        let constructor = FreshObjectConstructor::new(registry);
        let (handlers, events) = (HandlerRegistry::new(), EventDispatcher::new());

        let mut context = Context::new();
        context.initialize(Direction::Deserialization, "array", false)?;
        let mut visitor = ArrayDeserializationVisitor::default();
        let ty = Type::parse(ty)?;

        DeserializationNavigator::new(
            &mut visitor,
            &mut context,
            &metadata,
            &handlers,
            &events,
            &constructor,
        )
        .accept(input, Some(&ty))
    }

    #[test]
    fn typed_collections() {
        let input = Data::map([("a", Data::from("1")), ("7", Data::Int(2))]);
        let value = run(&input, "array<string,integer>").unwrap();

        let map = value.as_map().unwrap();
        assert_eq!(map.get(&Key::from("a")), Some(&Value::Int(1)));
        assert_eq!(map.get(&Key::Int(7)), Some(&Value::Int(2)));

        let list = run(&Data::List(vec![Data::Int(1), Data::Null]), "array<double>").unwrap();
        assert_eq!(list, Value::List(vec![Value::Float(1.0), Value::Null]));
    }

    #[test]
    fn missing_properties_stay_unset() {
        let value = run(&Data::map([("x", Data::Int(3))]), "Point").unwrap();
        let point = value.downcast::<DynamicObject>().unwrap();

        assert_eq!(point.get("x"), Some(&Value::Int(3)));
        assert!(point.get("y").is_none());
    }

    #[test]
    fn errors_carry_the_data_path() {
        let input = Data::List(vec![
            Data::map([("x", Data::Int(1))]),
            Data::map([("y", Data::from("up"))]),
        ]);
        let err = run(&input, "array<Point>").unwrap_err();

        assert_eq!(err.path(), Some("[1].y"));
        assert!(matches!(err.root(), Error::UnexpectedData { .. }));
    }
}
