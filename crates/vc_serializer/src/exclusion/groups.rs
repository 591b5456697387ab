use alloc::string::String;
use alloc::vec::Vec;

use vc_utils::hash::IndexMap;

use crate::context::Context;
use crate::exclusion::ExclusionStrategy;
use crate::metadata::{ClassMetadata, PropertyMetadata};

/// The group of properties that declare none.
pub const DEFAULT_GROUP: &str = "Default";

// -----------------------------------------------------------------------------
// Groups

/// A set of group names, optionally with per-property overrides for nested
/// objects.
///
/// # Examples
///
/// ```
/// use vc_serializer::exclusion::Groups;
///
/// // ["Default", "comments" => ["post"]]
/// let groups = Groups::from(["Default"]).with_nested("comments", Groups::from(["post"]));
///
/// assert_eq!(groups.names(), ["Default"]);
/// assert!(groups.nested("comments").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Groups {
    names: Vec<String>,
    nested: IndexMap<String, Groups>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain group name.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Sets the groups used below the property `path`.
    pub fn with_nested(mut self, path: impl Into<String>, groups: Groups) -> Self {
        self.nested.insert(path.into(), groups);
        self
    }

    /// The plain group names.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn nested(&self, path: &str) -> Option<&Groups> {
        self.nested.get(path)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.nested.is_empty()
    }

    fn has_nested(&self) -> bool {
        !self.nested.is_empty()
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Groups {
    fn from(names: [S; N]) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            nested: IndexMap::default(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Groups {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
            nested: IndexMap::default(),
        }
    }
}

// -----------------------------------------------------------------------------
// GroupsExclusionStrategy

/// Keeps the properties belonging to one of the requested groups.
///
/// - A property without groups is kept only if [`DEFAULT_GROUP`] is requested.
/// - A property with an exclusion group that is requested is skipped.
/// - Otherwise a property is kept if one of its groups is requested.
///
/// With nested groups, the requested set depends on the property path of the
/// object being visited. Each path segment descends into the nested entry of
/// that name. A segment without an entry ends the descent: at the first
/// segment the current names are kept (or [`DEFAULT_GROUP`] if there are
/// none), at any later segment only [`DEFAULT_GROUP`] applies. A nested entry
/// without plain names also gets [`DEFAULT_GROUP`].
///
/// An empty group set means [`DEFAULT_GROUP`].
#[derive(Debug, Clone)]
pub struct GroupsExclusionStrategy {
    groups: Groups,
    nested: bool,
}

impl GroupsExclusionStrategy {
    pub fn new(groups: impl Into<Groups>) -> Self {
        let mut groups = groups.into();
        if groups.is_empty() {
            groups.names.push(DEFAULT_GROUP.into());
        }
        let nested = groups.has_nested();
        Self { groups, nested }
    }

    /// The group names requested at the current position of `context`.
    pub fn groups_for(&self, context: &Context) -> Vec<String> {
        if !self.nested {
            return self.groups.names.clone();
        }

        let mut current = &self.groups;
        let mut fallback = None;
        for (index, segment) in context.current_path().into_iter().enumerate() {
            let Some(next) = current.nested(segment) else {
                fallback = Some(if index > 0 || current.names.is_empty() {
                    alloc::vec![String::from(DEFAULT_GROUP)]
                } else {
                    current.names.clone()
                });
                break;
            };
            current = next;
            if current.names.is_empty() {
                fallback = Some(alloc::vec![String::from(DEFAULT_GROUP)]);
            } else {
                fallback = None;
            }
        }

        fallback.unwrap_or_else(|| current.names.clone())
    }
}

impl ExclusionStrategy for GroupsExclusionStrategy {
    fn should_skip_class(&self, _metadata: &ClassMetadata, _context: &Context) -> bool {
        false
    }

    fn should_skip_property(&self, metadata: &PropertyMetadata, context: &Context) -> bool {
        let groups = self.groups_for(context);
        let requested = |name: &String| groups.contains(name);

        if metadata.exclusion_groups().iter().any(requested) {
            return true;
        }
        if metadata.groups().is_empty() {
            return !groups.iter().any(|g| g == DEFAULT_GROUP);
        }
        !metadata.groups().iter().any(requested)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use super::{DEFAULT_GROUP, Groups, GroupsExclusionStrategy};
    use crate::context::Context;
    use crate::exclusion::ExclusionStrategy;
    use crate::metadata::PropertyMetadata;

    fn prop(groups: &[&str]) -> PropertyMetadata {
        PropertyMetadata::new("Post", "title")
            .with_groups(groups.iter().copied())
            .unwrap()
    }

    fn context_at(path: &[&str]) -> Context {
        let mut context = Context::new();
        for segment in path {
            context.push_property_metadata(Arc::new(PropertyMetadata::new("Any", *segment)));
        }
        context
    }

    #[test]
    fn ungrouped_properties_follow_default() {
        let context = Context::new();

        let default = GroupsExclusionStrategy::new(Groups::new());
        assert!(!default.should_skip_property(&prop(&[]), &context));

        let custom = GroupsExclusionStrategy::new(["custom"]);
        assert!(custom.should_skip_property(&prop(&[]), &context));
        assert!(!custom.should_skip_property(&prop(&["custom", "other"]), &context));
        assert!(custom.should_skip_property(&prop(&["other"]), &context));
    }

    #[test]
    fn exclusion_groups_win() {
        let context = Context::new();
        let strategy = GroupsExclusionStrategy::new(["list", "admin"]);

        assert!(strategy.should_skip_property(&prop(&["list", "!admin"]), &context));
        assert!(!strategy.should_skip_property(&prop(&["list", "!guest"]), &context));
    }

    #[test]
    fn nested_groups_follow_the_path() {
        let strategy = GroupsExclusionStrategy::new(
            Groups::from(["Default", "outer"]).with_nested("comments", Groups::from(["post"])),
        );
        let names = |path: &[&str]| -> Vec<String> { strategy.groups_for(&context_at(path)) };

        assert_eq!(names(&[]), ["Default", "outer"]);
        assert_eq!(names(&["comments"]), ["post"]);
        // Not in the map at the first segment: the current names stay.
        assert_eq!(names(&["author"]), ["Default", "outer"]);
        // Not in the map below the first segment: `Default` only.
        assert_eq!(names(&["comments", "author"]), [DEFAULT_GROUP]);

        let under_comments = context_at(&["comments"]);
        assert!(!strategy.should_skip_property(&prop(&["post"]), &under_comments));
        assert!(strategy.should_skip_property(&prop(&["outer"]), &under_comments));

        let deeper = context_at(&["comments", "author"]);
        assert!(strategy.should_skip_property(&prop(&["outer"]), &deeper));
        assert!(!strategy.should_skip_property(&prop(&[]), &deeper));
    }

    #[test]
    fn nested_level_without_names_gets_default() {
        let strategy = GroupsExclusionStrategy::new(
            Groups::from(["list"])
                .with_nested("author", Groups::new().with_nested("avatar", Groups::from(["big"]))),
        );

        assert_eq!(strategy.groups_for(&context_at(&["author"])), [DEFAULT_GROUP]);
        assert_eq!(strategy.groups_for(&context_at(&["author", "avatar"])), ["big"]);
    }
}
