//! Per-call traversal state.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt::{self, Write};

use vc_utils::hash::HashMap;

use crate::error::{Error, Result};
use crate::exclusion::{
    DepthExclusionStrategy, DisjunctExclusionStrategy, ExclusionStrategy, Groups,
    GroupsExclusionStrategy, VersionExclusionStrategy,
};
use crate::metadata::{ClassMetadata, PropertyMetadata};
use crate::value::{Key, Object, Value};

// -----------------------------------------------------------------------------
// Direction, Frame, PathSegment

/// Which way a call converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Application values to format data.
    #[default]
    Serialization,
    /// Format data to application values.
    Deserialization,
}

/// An entry of the metadata stack.
#[derive(Debug, Clone)]
pub enum Frame {
    /// An object being visited.
    Class(Arc<ClassMetadata>),
    /// A property whose value is being visited.
    Property(Arc<PropertyMetadata>),
}

/// A step of the data path, used to locate errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A property, by serialized name.
    Property(String),
    /// A list index or map key.
    Index(Key),
}

// -----------------------------------------------------------------------------
// Context

/// The mutable state of one serialize or deserialize call.
///
/// Configure a context (groups, version, depth checks, attributes, custom
/// exclusion strategies) and pass it to the serializer. The serializer
/// initializes it, after which configuration is rejected with a logic error.
/// A context serves exactly one call.
///
/// # Examples
///
/// ```
/// use vc_serializer::Context;
/// use vc_serializer::exclusion::Groups;
///
/// let mut context = Context::new();
/// context
///     .set_groups(Groups::from(["list"]))
///     .unwrap()
///     .set_version("2.0")
///     .unwrap()
///     .enable_max_depth_checks()
///     .unwrap();
///
/// assert_eq!(context.version(), Some("2.0"));
/// assert!(!context.is_initialized());
/// ```
pub struct Context {
    direction: Direction,
    format: String,
    initialized: bool,
    attributes: HashMap<String, Box<dyn Any>>,
    strategies: Vec<Box<dyn ExclusionStrategy>>,
    exclusion: Option<Box<dyn ExclusionStrategy>>,
    serialize_null: Option<bool>,
    max_depth_checks: bool,
    depth: usize,
    frames: Vec<Frame>,
    path: Vec<PathSegment>,
}

impl Default for Context {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("direction", &self.direction)
            .field("format", &self.format)
            .field("initialized", &self.initialized)
            .field("depth", &self.depth)
            .field("path", &self.path_string())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Well-known attribute: an existing object to deserialize into.
    pub const TARGET: &'static str = "target";
    /// Well-known attribute: the requested [`Groups`].
    pub const GROUPS: &'static str = "groups";
    /// Well-known attribute: the current version, a `String`.
    pub const VERSION: &'static str = "version";

    pub fn new() -> Self {
        Self {
            direction: Direction::Serialization,
            format: String::new(),
            initialized: false,
            attributes: HashMap::default(),
            strategies: Vec::new(),
            exclusion: None,
            serialize_null: None,
            max_depth_checks: false,
            depth: 0,
            frames: Vec::new(),
            path: Vec::new(),
        }
    }

    fn assert_mutable(&self) -> Result<()> {
        if self.initialized {
            return Err(Error::logic(
                "the context was already used by a serializer call and cannot be modified",
            ));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Configuration

    /// Sets an attribute.
    pub fn set_attribute<T: Any>(&mut self, key: impl Into<String>, value: T) -> Result<&mut Self> {
        self.assert_mutable()?;
        self.attributes.insert(key.into(), Box::new(value));
        Ok(self)
    }

    /// Sets the object to deserialize into.
    pub fn set_target(&mut self, target: impl Object) -> Result<&mut Self> {
        self.set_attribute(Self::TARGET, Value::object(target))
    }

    /// Requests groups; see [`GroupsExclusionStrategy`].
    pub fn set_groups(&mut self, groups: impl Into<Groups>) -> Result<&mut Self> {
        let groups: Groups = groups.into();
        self.set_attribute(Self::GROUPS, groups)
    }

    /// Sets the current version; see [`VersionExclusionStrategy`].
    pub fn set_version(&mut self, version: impl Into<String>) -> Result<&mut Self> {
        let version: String = version.into();
        self.set_attribute(Self::VERSION, version)
    }

    /// Honors property `max_depth`; see [`DepthExclusionStrategy`].
    pub fn enable_max_depth_checks(&mut self) -> Result<&mut Self> {
        self.assert_mutable()?;
        self.max_depth_checks = true;
        Ok(self)
    }

    /// Writes `null` values instead of leaving them out.
    pub fn set_serialize_null(&mut self, serialize_null: bool) -> Result<&mut Self> {
        self.assert_mutable()?;
        self.serialize_null = Some(serialize_null);
        Ok(self)
    }

    /// Adds a strategy, combined disjunctively with the others.
    pub fn add_exclusion_strategy(
        &mut self,
        strategy: impl ExclusionStrategy + 'static,
    ) -> Result<&mut Self> {
        self.assert_mutable()?;
        self.strategies.push(Box::new(strategy));
        Ok(self)
    }

    /// Prepares the context for a call. Called by the serializer.
    ///
    /// Fails with a logic error if the context was already initialized.
    pub fn initialize(
        &mut self,
        direction: Direction,
        format: impl Into<String>,
        default_serialize_null: bool,
    ) -> Result<()> {
        if self.initialized {
            return Err(Error::logic("a context cannot be used for more than one call"));
        }

        let mut strategies = core::mem::take(&mut self.strategies);
        if let Some(groups) = self.attribute::<Groups>(Self::GROUPS) {
            strategies.insert(0, Box::new(GroupsExclusionStrategy::new(groups.clone())));
        }
        if let Some(version) = self.attribute::<String>(Self::VERSION) {
            strategies.push(Box::new(VersionExclusionStrategy::new(version.clone())));
        }
        if self.max_depth_checks {
            strategies.push(Box::new(DepthExclusionStrategy));
        }

        self.exclusion = match strategies.len() {
            0 => None,
            1 => strategies.pop(),
            _ => Some(Box::new(DisjunctExclusionStrategy::new(strategies))),
        };
        self.direction = direction;
        self.format = format.into();
        self.serialize_null.get_or_insert(default_serialize_null);
        self.initialized = true;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The format name, empty before initialization.
    #[inline]
    pub fn format(&self) -> &str {
        &self.format
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns an attribute if it exists with type `T`.
    pub fn attribute<T: Any>(&self, key: &str) -> Option<&T> {
        self.attributes.get(key)?.downcast_ref()
    }

    #[inline]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Removes and returns an attribute if it exists with type `T`.
    pub fn take_attribute<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.attributes.get(key)?.is::<T>() {
            return None;
        }
        let value = self.attributes.remove(key)?;
        value.downcast().ok().map(|boxed| *boxed)
    }

    /// The requested groups, if any.
    #[inline]
    pub fn groups(&self) -> Option<&Groups> {
        self.attribute(Self::GROUPS)
    }

    /// The current version, if any.
    pub fn version(&self) -> Option<&str> {
        self.attribute::<String>(Self::VERSION).map(String::as_str)
    }

    #[inline]
    pub fn should_serialize_null(&self) -> bool {
        self.serialize_null.unwrap_or(false)
    }

    /// The combined exclusion strategy, available after initialization.
    #[inline]
    pub fn exclusion_strategy(&self) -> Option<&dyn ExclusionStrategy> {
        self.exclusion.as_deref()
    }

    /// Asks the exclusion strategy about a class.
    pub fn should_skip_class(&self, metadata: &ClassMetadata) -> bool {
        self.exclusion
            .as_deref()
            .is_some_and(|s| s.should_skip_class(metadata, self))
    }

    /// Asks the exclusion strategy about a property.
    pub fn should_skip_property(&self, metadata: &PropertyMetadata) -> bool {
        self.exclusion
            .as_deref()
            .is_some_and(|s| s.should_skip_property(metadata, self))
    }

    // -------------------------------------------------------------------------
    // Traversal state

    /// Object nesting depth; the root object is at depth 1.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn increase_depth(&mut self) {
        self.depth += 1;
    }

    pub fn decrease_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// The metadata stack, outermost first.
    #[inline]
    pub fn metadata_stack(&self) -> &[Frame] {
        &self.frames
    }

    pub fn push_class_metadata(&mut self, metadata: Arc<ClassMetadata>) {
        self.frames.push(Frame::Class(metadata));
    }

    pub fn push_property_metadata(&mut self, metadata: Arc<PropertyMetadata>) {
        self.frames.push(Frame::Property(metadata));
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// The innermost class being visited.
    pub fn current_class(&self) -> Option<&Arc<ClassMetadata>> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Class(c) => Some(c),
            Frame::Property(_) => None,
        })
    }

    /// Names of the properties on the metadata stack, outermost first.
    pub fn current_path(&self) -> Vec<&str> {
        self.frames
            .iter()
            .filter_map(|f| match f {
                Frame::Property(p) => Some(p.name()),
                Frame::Class(_) => None,
            })
            .collect()
    }

    pub fn push_path(&mut self, segment: PathSegment) {
        self.path.push(segment);
    }

    pub fn pop_path(&mut self) {
        self.path.pop();
    }

    /// The data path of the current position, such as `comments[0].author`.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            // Writing to a `String` cannot fail.
            let _ = match segment {
                PathSegment::Property(name) if out.is_empty() => out.write_str(name),
                PathSegment::Property(name) => write!(out, ".{name}"),
                PathSegment::Index(key) => write!(out, "[{key}]"),
            };
        }
        out
    }

    /// Annotates an error with the current data path.
    pub fn error_at_path(&self, error: Error) -> Error {
        error.at_path(self.path_string())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{Context, Direction, PathSegment};
    use crate::error::ErrorKind;
    use crate::value::{DynamicObject, Key, Value};

    #[test]
    fn configuration_is_frozen_after_initialize() {
        let mut context = Context::new();
        context.set_groups(["a"]).unwrap();
        context.initialize(Direction::Serialization, "json", false).unwrap();

        assert!(context.exclusion_strategy().is_some());
        assert_eq!(
            context.set_version("1.0").err().map(|e| e.kind()),
            Some(ErrorKind::Logic)
        );
        assert_eq!(
            context
                .initialize(Direction::Serialization, "json", false)
                .unwrap_err()
                .kind(),
            ErrorKind::Logic
        );
    }

    #[test]
    fn serialize_null_defaults_to_the_serializer_setting() {
        let mut context = Context::new();
        context.initialize(Direction::Serialization, "json", true).unwrap();
        assert!(context.should_serialize_null());

        let mut context = Context::new();
        context.set_serialize_null(false).unwrap();
        context.initialize(Direction::Serialization, "json", true).unwrap();
        assert!(!context.should_serialize_null());
    }

    #[test]
    fn attributes_are_typed() {
        let mut context = Context::new();
        context.set_attribute("n", 3_i64).unwrap();
        context.set_target(DynamicObject::new("User")).unwrap();

        assert_eq!(context.attribute::<i64>("n"), Some(&3));
        assert_eq!(context.attribute::<String>("n"), None);
        assert!(context.take_attribute::<String>("n").is_none());
        assert!(context.has_attribute("n"));

        let target = context.take_attribute::<Value>(Context::TARGET).unwrap();
        assert_eq!(target.as_object().unwrap().class_name(), "User");
        assert!(!context.has_attribute(Context::TARGET));
        assert!(context.groups().is_none());
    }

    #[test]
    fn path_renders_properties_and_indices() {
        let mut context = Context::new();
        context.push_path(PathSegment::Property("comments".into()));
        context.push_path(PathSegment::Index(Key::Int(0)));
        context.push_path(PathSegment::Property("author".into()));

        assert_eq!(context.path_string(), "comments[0].author");
        context.pop_path();
        assert_eq!(context.path_string(), "comments[0]");
    }
}
