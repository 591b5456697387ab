//! Property naming strategies used by the visitors.

use alloc::string::String;
use alloc::sync::Arc;

use crate::metadata::PropertyMetadata;

/// Translates a property into the name used in the serialized data.
pub trait PropertyNamingStrategy: Send + Sync {
    fn translate_name(&self, property: &PropertyMetadata) -> String;
}

impl<N: PropertyNamingStrategy + ?Sized> PropertyNamingStrategy for Arc<N> {
    #[inline]
    fn translate_name(&self, property: &PropertyMetadata) -> String {
        (**self).translate_name(property)
    }
}

// -----------------------------------------------------------------------------
// IdenticalNamingStrategy

/// Uses the property name as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdenticalNamingStrategy;

impl PropertyNamingStrategy for IdenticalNamingStrategy {
    #[inline]
    fn translate_name(&self, property: &PropertyMetadata) -> String {
        property.name().into()
    }
}

// -----------------------------------------------------------------------------
// CamelCaseNamingStrategy

/// Splits camel-case names.
///
/// Every run of uppercase letters is prefixed with the separator, then the
/// name is lowercased (or only its first letter uppercased).
///
/// # Examples
///
/// ```
/// use vc_serializer::metadata::PropertyMetadata;
/// use vc_serializer::naming::{CamelCaseNamingStrategy, PropertyNamingStrategy};
///
/// let naming = CamelCaseNamingStrategy::default();
/// let name = |n: &str| naming.translate_name(&PropertyMetadata::new("User", n));
///
/// assert_eq!(name("createdAt"), "created_at");
/// assert_eq!(name("userID"), "user_id");
/// assert_eq!(name("plain"), "plain");
/// ```
#[derive(Debug, Clone)]
pub struct CamelCaseNamingStrategy {
    separator: String,
    lower_case: bool,
}

impl Default for CamelCaseNamingStrategy {
    fn default() -> Self {
        Self::new("_", true)
    }
}

impl CamelCaseNamingStrategy {
    pub fn new(separator: impl Into<String>, lower_case: bool) -> Self {
        Self {
            separator: separator.into(),
            lower_case,
        }
    }

    fn split(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 4);
        let mut in_run = false;
        for c in name.chars() {
            let upper = c.is_ascii_uppercase();
            if upper && !in_run {
                out.push_str(&self.separator);
            }
            in_run = upper;
            out.push(c);
        }
        out
    }
}

impl PropertyNamingStrategy for CamelCaseNamingStrategy {
    fn translate_name(&self, property: &PropertyMetadata) -> String {
        let name = self.split(property.name());
        if self.lower_case {
            return name.to_lowercase();
        }

        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => name,
        }
    }
}

// -----------------------------------------------------------------------------
// SerializedNameStrategy

/// Prefers the serialized name of a property over its delegate.
#[derive(Debug, Clone, Default)]
pub struct SerializedNameStrategy<N> {
    delegate: N,
}

impl<N: PropertyNamingStrategy> SerializedNameStrategy<N> {
    pub fn new(delegate: N) -> Self {
        Self { delegate }
    }
}

impl<N: PropertyNamingStrategy> PropertyNamingStrategy for SerializedNameStrategy<N> {
    fn translate_name(&self, property: &PropertyMetadata) -> String {
        match property.serialized_name() {
            Some(name) => name.into(),
            None => self.delegate.translate_name(property),
        }
    }
}

/// The default naming: serialized names, then the camel-case split.
pub fn default_naming_strategy() -> Arc<dyn PropertyNamingStrategy> {
    Arc::new(SerializedNameStrategy::new(CamelCaseNamingStrategy::default()))
}
