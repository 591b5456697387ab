//! Listeners around object visits.
//!
//! Listeners are registered per event, optionally restricted to a class name
//! and a format. The pre events may rewrite the type the navigator continues
//! with, e.g. to substitute a proxy class by its real class.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::context::Context;
use crate::types::Type;
use crate::value::{InputView, Object};

// -----------------------------------------------------------------------------
// Events

/// Raised before an object is serialized.
pub struct PreSerializeEvent<'a> {
    object: &'a dyn Object,
    ty: &'a mut Type,
    context: &'a Context,
}

impl<'a> PreSerializeEvent<'a> {
    pub(crate) fn new(object: &'a dyn Object, ty: &'a mut Type, context: &'a Context) -> Self {
        Self {
            object,
            ty,
            context,
        }
    }

    #[inline]
    pub fn object(&self) -> &dyn Object {
        self.object
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        self.ty
    }

    /// Replaces the type the object is serialized as.
    pub fn set_type(&mut self, ty: Type) {
        *self.ty = ty;
    }

    #[inline]
    pub fn context(&self) -> &Context {
        self.context
    }
}

/// Raised after an object was serialized.
pub struct PostSerializeEvent<'a> {
    object: &'a dyn Object,
    ty: &'a Type,
    context: &'a Context,
}

impl<'a> PostSerializeEvent<'a> {
    pub(crate) fn new(object: &'a dyn Object, ty: &'a Type, context: &'a Context) -> Self {
        Self {
            object,
            ty,
            context,
        }
    }

    #[inline]
    pub fn object(&self) -> &dyn Object {
        self.object
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        self.ty
    }

    #[inline]
    pub fn context(&self) -> &Context {
        self.context
    }
}

/// Raised before input is deserialized into an object.
pub struct PreDeserializeEvent<'a> {
    input: &'a dyn InputView,
    ty: &'a mut Type,
    context: &'a Context,
}

impl<'a> PreDeserializeEvent<'a> {
    pub(crate) fn new(input: &'a dyn InputView, ty: &'a mut Type, context: &'a Context) -> Self {
        Self { input, ty, context }
    }

    #[inline]
    pub fn input(&self) -> &dyn InputView {
        self.input
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        self.ty
    }

    /// Replaces the type the input is deserialized as.
    pub fn set_type(&mut self, ty: Type) {
        *self.ty = ty;
    }

    #[inline]
    pub fn context(&self) -> &Context {
        self.context
    }
}

/// Raised after an object was deserialized.
pub struct PostDeserializeEvent<'a> {
    object: &'a mut dyn Object,
    ty: &'a Type,
    context: &'a Context,
}

impl<'a> PostDeserializeEvent<'a> {
    pub(crate) fn new(object: &'a mut dyn Object, ty: &'a Type, context: &'a Context) -> Self {
        Self {
            object,
            ty,
            context,
        }
    }

    #[inline]
    pub fn object(&self) -> &dyn Object {
        self.object
    }

    #[inline]
    pub fn object_mut(&mut self) -> &mut dyn Object {
        self.object
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        self.ty
    }

    #[inline]
    pub fn context(&self) -> &Context {
        self.context
    }
}

// -----------------------------------------------------------------------------
// EventDispatcher

type PreSerializeListener = Box<dyn Fn(&mut PreSerializeEvent<'_>) + Send + Sync>;
type PostSerializeListener = Box<dyn Fn(&mut PostSerializeEvent<'_>) + Send + Sync>;
type PreDeserializeListener = Box<dyn Fn(&mut PreDeserializeEvent<'_>) + Send + Sync>;
type PostDeserializeListener = Box<dyn Fn(&mut PostDeserializeEvent<'_>) + Send + Sync>;

struct Entry<L> {
    class: Option<String>,
    format: Option<String>,
    listener: L,
}

impl<L> Entry<L> {
    fn new(class: Option<&str>, format: Option<&str>, listener: L) -> Self {
        Self {
            class: class.map(Into::into),
            format: format.map(Into::into),
            listener,
        }
    }

    fn matches(&self, class: &str, format: &str) -> bool {
        self.class.as_deref().is_none_or(|c| c == class)
            && self.format.as_deref().is_none_or(|f| f == format)
    }
}

fn matching<'a, L>(
    entries: &'a [Entry<L>],
    class: &'a str,
    format: &'a str,
) -> impl Iterator<Item = &'a L> + 'a {
    entries
        .iter()
        .filter(move |e| e.matches(class, format))
        .map(|e| &e.listener)
}

/// Listeners for the four object events, called in registration order.
///
/// The class filter is matched against the type name at the moment the event
/// is raised; a `None` filter matches everything.
///
/// # Examples
///
/// ```
/// use vc_serializer::event::EventDispatcher;
/// use vc_serializer::types::Type;
///
/// let mut events = EventDispatcher::new();
/// events.on_pre_serialize(Some("UserProxy"), None, |event| {
///     event.set_type(Type::new("User"));
/// });
///
/// assert!(!events.is_empty());
/// ```
#[derive(Default)]
pub struct EventDispatcher {
    pre_serialize: Vec<Entry<PreSerializeListener>>,
    post_serialize: Vec<Entry<PostSerializeListener>>,
    pre_deserialize: Vec<Entry<PreDeserializeListener>>,
    post_deserialize: Vec<Entry<PostDeserializeListener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pre_serialize.is_empty()
            && self.post_serialize.is_empty()
            && self.pre_deserialize.is_empty()
            && self.post_deserialize.is_empty()
    }

    pub fn on_pre_serialize<F>(&mut self, class: Option<&str>, format: Option<&str>, listener: F)
    where
        F: Fn(&mut PreSerializeEvent<'_>) + Send + Sync + 'static,
    {
        self.pre_serialize
            .push(Entry::new(class, format, Box::new(listener)));
    }

    pub fn on_post_serialize<F>(&mut self, class: Option<&str>, format: Option<&str>, listener: F)
    where
        F: Fn(&mut PostSerializeEvent<'_>) + Send + Sync + 'static,
    {
        self.post_serialize
            .push(Entry::new(class, format, Box::new(listener)));
    }

    pub fn on_pre_deserialize<F>(&mut self, class: Option<&str>, format: Option<&str>, listener: F)
    where
        F: Fn(&mut PreDeserializeEvent<'_>) + Send + Sync + 'static,
    {
        self.pre_deserialize
            .push(Entry::new(class, format, Box::new(listener)));
    }

    pub fn on_post_deserialize<F>(&mut self, class: Option<&str>, format: Option<&str>, listener: F)
    where
        F: Fn(&mut PostDeserializeEvent<'_>) + Send + Sync + 'static,
    {
        self.post_deserialize
            .push(Entry::new(class, format, Box::new(listener)));
    }

    // -------------------------------------------------------------------------
    // Dispatch

    pub(crate) fn pre_serialize(&self, event: &mut PreSerializeEvent<'_>) {
        let (class, context) = (String::from(event.ty.name()), event.context);
        for listener in matching(&self.pre_serialize, &class, context.format()) {
            listener(event);
        }
    }

    pub(crate) fn post_serialize(&self, event: &mut PostSerializeEvent<'_>) {
        let (ty, context) = (event.ty, event.context);
        for listener in matching(&self.post_serialize, ty.name(), context.format()) {
            listener(event);
        }
    }

    pub(crate) fn pre_deserialize(&self, event: &mut PreDeserializeEvent<'_>) {
        let (class, context) = (String::from(event.ty.name()), event.context);
        for listener in matching(&self.pre_deserialize, &class, context.format()) {
            listener(event);
        }
    }

    pub(crate) fn post_deserialize(&self, event: &mut PostDeserializeEvent<'_>) {
        let (ty, context) = (event.ty, event.context);
        for listener in matching(&self.post_deserialize, ty.name(), context.format()) {
            listener(event);
        }
    }
}
