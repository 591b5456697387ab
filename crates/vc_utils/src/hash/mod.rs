//! Provide hash containers, re-exports *hashbrown*, *indexmap* and *foldhash*.

// -----------------------------------------------------------------------------
// Modules

mod hasher;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
///
/// Create instances with [`HashMap::default`] or [`HashMap::with_hasher`].
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

pub use hashbrown::hash_map::Entry;

/// An insertion-ordered [`indexmap::IndexMap`] using [`FixedHashState`].
///
/// Create instances with [`IndexMap::default`] or
/// [`IndexMap::with_capacity_and_hasher`].
///
/// # Examples
///
/// ```
/// use vc_utils::hash::IndexMap;
///
/// let mut map = IndexMap::default();
/// map.insert("b", 2);
/// map.insert("a", 1);
/// map.insert("b", 20);
///
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["b", "a"]);
/// assert_eq!(map.get_index_of("a"), Some(1));
///
/// map.shift_remove("b");
/// assert_eq!(map.get_index_of("a"), Some(0));
/// ```
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, FixedHashState>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;
pub use indexmap;
