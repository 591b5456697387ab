use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::context::{Context, PathSegment};
use crate::error::{Error, Result};
use crate::event::{EventDispatcher, PostSerializeEvent, PreSerializeEvent};
use crate::handler::{HandlerRegistry, SerializationNavigate};
use crate::metadata::{ClassMetadata, MetadataFactory, OnExclude, PropertyMetadata};
use crate::navigator::array_params;
use crate::types::{Primitive, Type};
use crate::value::{Data, InputView, Key, Object, Value};
use crate::visitor::{SerializationVisitor, cast_boolean, cast_double, cast_integer, cast_string};

/// Walks a [`Value`] graph and has a [`SerializationVisitor`] build the output.
///
/// Per node, in order: `null`, custom handler, primitive, object. Objects are
/// visited by their runtime class:
///
/// 1. the pre-serialize listeners may rewrite the type;
/// 2. a handler for the (rewritten) type takes over;
/// 3. the metadata is loaded and the depth increased;
/// 4. an excluded class yields `None`;
/// 5. pre-serialize methods run on a private copy of the object;
/// 6. each property that is not excluded is read and visited;
/// 7. post-serialize methods and listeners run, and the depth is restored.
pub struct SerializationNavigator<'a, V: SerializationVisitor> {
    visitor: &'a mut V,
    context: &'a mut Context,
    metadata: &'a MetadataFactory,
    handlers: &'a HandlerRegistry,
    events: &'a EventDispatcher,
}

impl<'a, V: SerializationVisitor> SerializationNavigator<'a, V> {
    pub fn new(
        visitor: &'a mut V,
        context: &'a mut Context,
        metadata: &'a MetadataFactory,
        handlers: &'a HandlerRegistry,
        events: &'a EventDispatcher,
    ) -> Self {
        Self {
            visitor,
            context,
            metadata,
            handlers,
            events,
        }
    }

    /// Serializes `value` as `ty`, or as its own type if `ty` is `None`.
    ///
    /// Returns `None` if `value` is an object whose class is excluded.
    pub fn accept(&mut self, value: &Value, ty: Option<&Type>) -> Result<Option<V::Output>> {
        if value.is_null() {
            let ty = Type::new(Type::NULL);
            return self.visitor.visit_null(&ty, self.context).map(Some);
        }

        if let Value::Object(object) = value {
            return self.accept_object(value, &**object, ty);
        }
        let ty = match ty {
            Some(ty) => ty.clone(),
            None => Type::of_value(value)?,
        };
        if let Some(output) = self.accept_handler(value, &ty)? {
            return Ok(Some(output));
        }
        match ty.primitive() {
            Some(primitive) => self.accept_primitive(value, primitive, &ty).map(Some),
            None => Err(Error::unexpected(
                format!("object of class `{}`", ty.name()),
                value.describe(),
            )),
        }
    }

    fn accept_handler(&mut self, value: &Value, ty: &Type) -> Result<Option<V::Output>> {
        let handlers = self.handlers;
        let Some(handler) = handlers.serialization(ty.name(), self.visitor.format()) else {
            return Ok(None);
        };
        let data = handler(value, ty, self)?;
        self.visitor.visit_custom(data, ty, self.context).map(Some)
    }

    // -------------------------------------------------------------------------
    // Primitives

    fn accept_primitive(
        &mut self,
        value: &Value,
        primitive: Primitive,
        ty: &Type,
    ) -> Result<V::Output> {
        let scalar = || {
            value
                .to_data()
                .ok_or_else(|| Error::unexpected(String::from(ty.name()), value.describe()))
        };
        let context = &*self.context;
        match primitive {
            Primitive::Null => self.visitor.visit_null(ty, context),
            Primitive::Boolean => {
                let b = cast_boolean(&scalar()?)?;
                self.visitor.visit_boolean(b, ty, context)
            }
            Primitive::Integer => {
                let i = cast_integer(&scalar()?)?;
                self.visitor.visit_integer(i, ty, context)
            }
            Primitive::Double => {
                let f = cast_double(&scalar()?)?;
                self.visitor.visit_double(f, ty, context)
            }
            Primitive::String => {
                let s = cast_string(&scalar()?)?;
                self.visitor.visit_string(&s, ty, context)
            }
            Primitive::Array => self.accept_array(value, ty),
        }
    }

    fn accept_array(&mut self, value: &Value, ty: &Type) -> Result<V::Output> {
        let entries: Vec<(Key, &Value)> = match value {
            Value::List(list) => list.iter().enumerate().map(|(i, v)| (Key::from(i), v)).collect(),
            Value::Map(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
            other => return Err(Error::unexpected("array", other.describe())),
        };

        match array_params(ty)? {
            // Without parameters, sequential integer keys from 0 make a list.
            0 => {
                let sequential = entries
                    .iter()
                    .enumerate()
                    .all(|(i, (k, _))| *k == Key::from(i));
                if sequential {
                    self.accept_list(entries, None, ty)
                } else {
                    self.accept_hash(entries, None, ty)
                }
            }
            1 => self.accept_list(entries, ty.param_type(0), ty),
            _ => self.accept_hash(entries, ty.param_type(1), ty),
        }
    }

    fn accept_list(
        &mut self,
        entries: Vec<(Key, &Value)>,
        item_ty: Option<&Type>,
        ty: &Type,
    ) -> Result<V::Output> {
        let mut items = Vec::with_capacity(entries.len());
        for (index, (_, item)) in entries.into_iter().enumerate() {
            if let Some(output) = self.accept_entry(Key::from(index), item, item_ty)? {
                items.push(output);
            }
        }
        self.visitor.visit_array(items, ty, self.context)
    }

    fn accept_hash(
        &mut self,
        entries: Vec<(Key, &Value)>,
        value_ty: Option<&Type>,
        ty: &Type,
    ) -> Result<V::Output> {
        let mut out = Vec::with_capacity(entries.len());
        for (key, item) in entries {
            if let Some(output) = self.accept_entry(key.clone(), item, value_ty)? {
                out.push((key, output));
            }
        }
        self.visitor.visit_hash(out, ty, self.context)
    }

    // An excluded element is written as null only when nulls are serialized.
    fn accept_entry(
        &mut self,
        key: Key,
        item: &Value,
        item_ty: Option<&Type>,
    ) -> Result<Option<V::Output>> {
        self.context.push_path(PathSegment::Index(key));
        let result = match self.accept(item, item_ty) {
            Ok(None) if self.context.should_serialize_null() => {
                self.visitor.visit_null(&Type::new(Type::NULL), self.context).map(Some)
            }
            other => other,
        };
        let result = result.map_err(|e| self.context.error_at_path(e));
        self.context.pop_path();
        result
    }

    // -------------------------------------------------------------------------
    // Objects

    fn accept_object(
        &mut self,
        value: &Value,
        object: &dyn Object,
        declared: Option<&Type>,
    ) -> Result<Option<V::Output>> {
        let class = object.class_name();
        if class.is_empty() {
            return Err(Error::invalid_argument(
                "cannot serialize an object with an empty class name",
            ));
        }
        let mut ty = declared.cloned().unwrap_or_else(|| Type::new(class));
        ty.set_name(class);
        self.events
            .pre_serialize(&mut PreSerializeEvent::new(object, &mut ty, self.context));

        if let Some(output) = self.accept_handler(value, &ty)? {
            return Ok(Some(output));
        }

        let metadata = self.metadata.require_metadata_for(ty.name())?;
        self.context.increase_depth();
        let result = self.visit_class(object, &metadata, &ty);
        self.context.decrease_depth();
        result
    }

    fn visit_class(
        &mut self,
        object: &dyn Object,
        metadata: &Arc<ClassMetadata>,
        ty: &Type,
    ) -> Result<Option<V::Output>> {
        if self.context.should_skip_class(metadata) {
            return Ok(None);
        }

        self.context.push_class_metadata(Arc::clone(metadata));
        let result = self.visit_members(object, metadata, ty);
        self.context.pop_frame();
        let (output, copy) = result?;

        let object: &dyn Object = match &copy {
            Some(copy) => &**copy,
            None => object,
        };
        for method in metadata.post_serialize_methods() {
            object.invoke(method)?;
        }
        self.events
            .post_serialize(&mut PostSerializeEvent::new(object, ty, self.context));
        Ok(Some(output))
    }

    fn visit_members(
        &mut self,
        object: &dyn Object,
        metadata: &ClassMetadata,
        ty: &Type,
    ) -> Result<(V::Output, Option<Box<dyn Object>>)> {
        let copy = match metadata.pre_serialize_methods() {
            [] => None,
            methods => {
                let mut copy = object.clone_object();
                for method in methods {
                    copy.invoke_mut(method, Vec::new())?;
                }
                Some(copy)
            }
        };
        let object: &dyn Object = match &copy {
            Some(copy) => &**copy,
            None => object,
        };

        let mut properties = Vec::with_capacity(metadata.properties().len());
        for property in metadata.properties().values() {
            if self.context.should_skip_property(property) {
                continue;
            }
            self.context
                .push_path(PathSegment::Property(property.name().into()));
            let result = self
                .visit_property(object, property)
                .map_err(|e| self.context.error_at_path(e));
            self.context.pop_path();

            if let Some(output) = result? {
                properties.push((Arc::clone(property), output));
            }
        }

        let output = self
            .visitor
            .visit_object(metadata, properties, ty, self.context)?;
        Ok((output, copy))
    }

    fn visit_property(
        &mut self,
        object: &dyn Object,
        property: &Arc<PropertyMetadata>,
    ) -> Result<Option<V::Output>> {
        let value = property.get_value(object)?;
        if value.is_null() && !self.context.should_serialize_null() {
            return Ok(None);
        }

        self.context.push_property_metadata(Arc::clone(property));
        let result = self.accept(&value, property.ty());
        self.context.pop_frame();

        match result? {
            Some(output) => Ok(Some(output)),
            None => match property.on_exclude() {
                OnExclude::Null => self
                    .visitor
                    .visit_null(&Type::new(Type::NULL), self.context)
                    .map(Some),
                OnExclude::Skip => Ok(None),
            },
        }
    }
}

impl<V: SerializationVisitor> SerializationNavigate for SerializationNavigator<'_, V> {
    fn context(&self) -> &Context {
        self.context
    }

    fn navigate(&mut self, value: &Value, ty: Option<&Type>) -> Result<Data> {
        Ok(self
            .accept(value, ty)?
            .map_or(Data::Null, |output| output.to_data()))
    }
}
