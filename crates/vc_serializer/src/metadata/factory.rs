use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::{LazyLock, PoisonError, RwLock};

use vc_utils::hash::HashMap;

use crate::error::{Error, Result};
use crate::metadata::ClassMetadata;

// -----------------------------------------------------------------------------
// MetadataProvider

/// Source of per-class metadata.
///
/// Implementations return the directives a class declares itself, without
/// merging in its ancestors; [`MetadataFactory`] does that. `Ok(None)` means
/// the class is not mapped.
pub trait MetadataProvider: Send + Sync {
    fn load_class_metadata(&self, class: &str) -> Result<Option<ClassMetadata>>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Arc<P> {
    #[inline]
    fn load_class_metadata(&self, class: &str) -> Result<Option<ClassMetadata>> {
        (**self).load_class_metadata(class)
    }
}

// -----------------------------------------------------------------------------
// MetadataCache

type CacheMap = HashMap<String, Option<Arc<ClassMetadata>>>;

/// A thread-safe class name to metadata cache.
///
/// Entries are only ever added until [`clear`](Self::clear) is called. Two
/// threads building the same class race harmlessly: the last write wins and
/// both results are equivalent. Unmapped classes are cached too.
#[derive(Debug, Default)]
pub struct MetadataCache {
    map: RwLock<CacheMap>,
}

static GLOBAL_CACHE: LazyLock<Arc<MetadataCache>> = LazyLock::new(|| Arc::new(MetadataCache::new()));

impl MetadataCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::default()),
        }
    }

    /// The process-wide cache.
    pub fn global() -> Arc<MetadataCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Returns the cached entry: `None` if the class was never built,
    /// `Some(None)` if it is known to be unmapped.
    pub fn get(&self, class: &str) -> Option<Option<Arc<ClassMetadata>>> {
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        map.get(class).cloned()
    }

    pub fn insert(&self, class: impl Into<String>, metadata: Option<Arc<ClassMetadata>>) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(class.into(), metadata);
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -----------------------------------------------------------------------------
// MetadataFactory

/// Builds and caches the effective metadata of classes.
///
/// For a class, the factory loads the ancestor chain from the provider, applies
/// each level's exclusion policy to the properties it declares, merges the
/// chain root first and finishes the result.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_serializer::metadata::{
///     ClassMetadata, ClassRegistry, MetadataCache, MetadataFactory, PropertyMetadata,
/// };
///
/// let mut registry = ClassRegistry::new();
/// registry.register(ClassMetadata::new("Base").with_property(PropertyMetadata::new("Base", "id")));
/// registry.register(
///     ClassMetadata::new("User")
///         .with_parent("Base")
///         .with_property(PropertyMetadata::new("User", "name")),
/// );
///
/// let factory = MetadataFactory::new(Arc::new(registry), Arc::new(MetadataCache::new()));
/// let user = factory.get_metadata_for("User").unwrap().unwrap();
///
/// let names: Vec<_> = user.properties().keys().cloned().collect();
/// assert_eq!(names, ["id", "name"]);
/// assert!(factory.get_metadata_for("Unknown").unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct MetadataFactory {
    provider: Arc<dyn MetadataProvider>,
    cache: Arc<MetadataCache>,
}

impl MetadataFactory {
    pub fn new(provider: Arc<dyn MetadataProvider>, cache: Arc<MetadataCache>) -> Self {
        Self { provider, cache }
    }

    #[inline]
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Returns the effective metadata of `class`, `None` if it is not mapped.
    pub fn get_metadata_for(&self, class: &str) -> Result<Option<Arc<ClassMetadata>>> {
        if let Some(cached) = self.cache.get(class) {
            return Ok(cached);
        }
        let built = self.build(class)?.map(Arc::new);
        self.cache.insert(class, built.clone());
        Ok(built)
    }

    /// Like [`get_metadata_for`](Self::get_metadata_for), but an unmapped
    /// class is an error.
    pub fn require_metadata_for(&self, class: &str) -> Result<Arc<ClassMetadata>> {
        self.get_metadata_for(class)?
            .ok_or_else(|| Error::MetadataNotFound(class.into()))
    }

    fn build(&self, class: &str) -> Result<Option<ClassMetadata>> {
        let Some(leaf) = self.provider.load_class_metadata(class)? else {
            return Ok(None);
        };

        // Leaf first; reversed below.
        let mut chain: Vec<ClassMetadata> = Vec::new();
        let mut next = leaf.parent().map(String::from);
        chain.push(leaf);

        while let Some(parent) = next {
            if chain.iter().any(|c| c.name() == parent) {
                return Err(Error::logic(format!(
                    "class `{class}` has a cyclic parent chain through `{parent}`",
                )));
            }
            let Some(meta) = self.provider.load_class_metadata(&parent)? else {
                return Err(Error::MetadataNotFound(parent));
            };
            next = meta.parent().map(String::from);
            chain.push(meta);
        }

        let mut levels = chain.into_iter().rev().map(|mut meta| {
            meta.apply_exclusion_policy();
            meta
        });

        let Some(mut merged) = levels.next() else {
            return Ok(None);
        };
        for child in levels {
            merged = ClassMetadata::merge(&merged, child)?;
        }
        merged.finish()?;

        Ok(Some(merged))
    }
}
