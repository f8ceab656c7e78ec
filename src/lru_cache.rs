use crate::error::{LruError, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::mem;
use tracing::{debug, trace};

/// Smallest capacity a cache can be constructed with.
pub const MIN_CAPACITY: usize = 2;

/// The core trait that defines the behavior of a cache implementation.
///
/// # Type Parameters
///
/// * `K` - The type of keys used in the cache. `K::default()` is reserved and
///   is never a valid key.
/// * `V` - The type of values stored in the cache.
pub trait Cache<K, V>
where
    K: Clone + Debug + Hash + Eq + Default,
{
    /// Retrieves a value from the cache by its key.
    ///
    /// If the key exists the entry is marked as most recently used.
    ///
    /// # Returns
    ///
    /// * `Some(&V)` if the key exists
    /// * `None` if the key doesn't exist, is the reserved key, or the cache is empty
    fn read(&mut self, key: &K) -> Option<&V>;

    /// Inserts or overwrites a key-value pair.
    ///
    /// If the cache is full and the key is new, the least recently used
    /// entry is evicted first. On success the key is the most recently used.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(V))` if the key already existed (returns the old value)
    /// * `Ok(None)` if the key was inserted
    /// * `Err(_)` if the key is reserved or the cache has no valid capacity
    fn write(&mut self, key: K, value: V) -> Result<Option<V>>;

    /// Returns the number of entries in the cache.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of entries.
    fn capacity(&self) -> usize;
}

// One cached value plus its neighbours in the recency chain.
// `newer` points toward the most recently used end, `older` toward the least.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) value: V,
    pub(crate) newer: Option<K>,
    pub(crate) older: Option<K>,
}

impl<K, V> Entry<K, V> {
    fn new(value: V) -> Self {
        Self {
            value,
            newer: None,
            older: None,
        }
    }
}

/// A fixed-capacity LRU cache.
///
/// Entries live in a `HashMap` keyed by the cache key. The recency chain is
/// threaded through the entries by key: each entry names its newer and older
/// neighbour, and those names are resolved through the same map. No entry
/// owns or points at another, so there are no raw pointers and no reference
/// cycles to manage.
///
/// The cache is single-threaded. Callers sharing it between threads wrap the
/// whole cache in a lock.
///
/// # Examples
///
/// ```rust
/// use keyed_lru::LruCache;
///
/// let mut cache = LruCache::new(2).unwrap();
/// cache.write("a", 1).unwrap();
/// cache.write("b", 2).unwrap();
/// assert_eq!(cache.read(&"a"), Some(&1));
///
/// // "b" is now the least recently used entry and makes room for "c"
/// cache.write("c", 3).unwrap();
/// assert_eq!(cache.read(&"b"), None);
/// ```
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    pub(crate) index: HashMap<K, Entry<K, V>>,
    pub(crate) most_recent: Option<K>,
    pub(crate) least_recent: Option<K>,
    pub(crate) capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Debug + Hash + Eq + Default,
{
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`LruError::InvalidCapacity`] if `capacity` is below [`MIN_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < MIN_CAPACITY {
            return Err(LruError::InvalidCapacity {
                requested: capacity,
                minimum: MIN_CAPACITY,
            });
        }

        debug!(capacity, "created lru cache");
        Ok(Self {
            index: HashMap::with_capacity(capacity),
            most_recent: None,
            least_recent: None,
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Key of the most recently used entry.
    pub fn most_recent(&self) -> Option<&K> {
        self.most_recent.as_ref()
    }

    /// Key of the least recently used entry, the next eviction victim.
    pub fn least_recent(&self) -> Option<&K> {
        self.least_recent.as_ref()
    }

    /// Returns true if `key` is cached. Does not touch the recency order.
    pub fn contains(&self, key: &K) -> bool {
        !is_sentinel(key) && self.index.contains_key(key)
    }

    /// Looks up `key` without marking it as recently used.
    pub fn peek(&self, key: &K) -> Option<&V> {
        if is_sentinel(key) {
            return None;
        }
        self.index.get(key).map(|entry| &entry.value)
    }

    /// Looks up `key` and, on a hit, makes it the most recently used entry.
    pub fn read(&mut self, key: &K) -> Option<&V> {
        if self.most_recent.is_none() || is_sentinel(key) || !self.index.contains_key(key) {
            trace!(?key, "read miss");
            return None;
        }

        trace!(?key, "read hit");
        self.move_to_head(key, false);
        self.index.get(key).map(|entry| &entry.value)
    }

    /// Stores `value` under `key` and makes `key` the most recently used entry.
    ///
    /// A write to a new key on a full cache evicts the least recently used
    /// entry before inserting.
    ///
    /// # Errors
    ///
    /// * [`LruError::Capacity`] if the cache holds fewer than [`MIN_CAPACITY`] slots
    /// * [`LruError::InvalidKey`] if `key` is `K::default()`
    ///
    /// The cache is left unmodified on error.
    pub fn write(&mut self, key: K, value: V) -> Result<Option<V>> {
        if self.capacity < MIN_CAPACITY {
            return Err(LruError::Capacity {
                capacity: self.capacity,
            });
        }
        if is_sentinel(&key) {
            return Err(LruError::InvalidKey);
        }

        if let Some(entry) = self.index.get_mut(&key) {
            trace!(?key, "write hit");
            let old_value = mem::replace(&mut entry.value, value);
            self.move_to_head(&key, false);
            return Ok(Some(old_value));
        }

        trace!(?key, "write miss");
        if self.index.len() >= self.capacity {
            self.evict_least_recent();
        }
        self.index.insert(key.clone(), Entry::new(value));
        self.move_to_head(&key, true);
        Ok(None)
    }

    // Captures the tail key first, then advances `least_recent`, then removes.
    fn evict_least_recent(&mut self) {
        let Some(victim) = self.least_recent.take() else {
            return;
        };
        let Some(entry) = self.index.remove(&victim) else {
            return;
        };

        self.least_recent = entry.newer;
        match &self.least_recent {
            Some(newer) => {
                if let Some(node) = self.index.get_mut(newer) {
                    node.older = None;
                }
            }
            None => self.most_recent = None,
        }

        debug!(key = ?victim, "evicted least recently used entry");
    }

    // Places `key` at the most recently used end. `is_new` is true when the
    // entry was just inserted and is not yet linked into the chain.
    fn move_to_head(&mut self, key: &K, is_new: bool) {
        if self.most_recent.as_ref() == Some(key) {
            return;
        }

        let Some(head) = self.most_recent.clone() else {
            // First entry
            self.most_recent = Some(key.clone());
            self.least_recent = Some(key.clone());
            return;
        };

        if !is_new {
            self.unlink(key);
        }

        if let Some(node) = self.index.get_mut(&head) {
            node.newer = Some(key.clone());
        }
        if let Some(node) = self.index.get_mut(key) {
            node.newer = None;
            node.older = Some(head);
        }
        self.most_recent = Some(key.clone());
    }

    // Detaches a linked entry that is not the head.
    fn unlink(&mut self, key: &K) {
        let (newer, older) = match self.index.get(key) {
            Some(entry) => (entry.newer.clone(), entry.older.clone()),
            None => return,
        };

        if self.least_recent.as_ref() == Some(key) {
            if let Some(node) = newer.as_ref().and_then(|k| self.index.get_mut(k)) {
                node.older = None;
            }
            self.least_recent = newer;
        } else {
            if let Some(node) = older.as_ref().and_then(|k| self.index.get_mut(k)) {
                node.newer = newer.clone();
            }
            if let Some(node) = newer.as_ref().and_then(|k| self.index.get_mut(k)) {
                node.older = older;
            }
        }
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Clone + Debug + Hash + Eq + Default,
{
    fn read(&mut self, key: &K) -> Option<&V> {
        self.read(key)
    }

    fn write(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.write(key, value)
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }

    fn capacity(&self) -> usize {
        self.capacity()
    }
}

fn is_sentinel<K: Default + Eq>(key: &K) -> bool {
    *key == K::default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    type Link = Option<&'static str>;

    // Builds a cache directly from its parts, bypassing `write`.
    pub(crate) fn fabricate(
        capacity: usize,
        most_recent: Link,
        least_recent: Link,
        nodes: &[(&'static str, &'static str, Link, Link)],
    ) -> LruCache<&'static str, &'static str> {
        let index = nodes
            .iter()
            .map(|&(key, value, newer, older)| {
                (
                    key,
                    Entry {
                        value,
                        newer,
                        older,
                    },
                )
            })
            .collect();
        LruCache {
            index,
            most_recent,
            least_recent,
            capacity,
        }
    }

    fn chain<V: Clone + Debug>(cache: &LruCache<&'static str, V>) -> Vec<&'static str> {
        cache.inspect().walk.iter().map(|entry| entry.key).collect()
    }

    #[test]
    fn test_new_rejects_small_capacity() {
        for capacity in [0, 1] {
            assert_eq!(
                LruCache::<String, String>::new(capacity).unwrap_err(),
                LruError::InvalidCapacity {
                    requested: capacity,
                    minimum: MIN_CAPACITY,
                }
            );
        }

        let cache = LruCache::<String, String>::new(2).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.most_recent(), None);
        assert_eq!(cache.least_recent(), None);
    }

    #[test]
    fn test_read_empty_cache() {
        let mut cache = LruCache::<String, String>::new(4).unwrap();
        assert_eq!(cache.read(&"Empty cache".to_string()), None);
    }

    #[test]
    fn test_read_fabricated_chain() {
        let mut cache = fabricate(
            4,
            Some("a"),
            Some("d"),
            &[
                ("a", "0", None, Some("b")),
                ("b", "1", Some("a"), Some("c")),
                ("c", "2", Some("b"), Some("d")),
                ("d", "3", Some("c"), None),
            ],
        );

        assert_eq!(cache.read(&"a"), Some(&"0"));
        assert_eq!(cache.read(&"b"), Some(&"1"));
        assert_eq!(cache.read(&"c"), Some(&"2"));
        assert_eq!(cache.read(&"d"), Some(&"3"));
        assert_eq!(cache.read(&"invalid"), None);

        assert_eq!(chain(&cache), vec!["d", "c", "b", "a"]);
        assert_eq!(cache.least_recent(), Some(&"a"));
        assert!(cache.inspect().is_consistent());
    }

    #[test]
    fn test_read_interior_entry() {
        let mut cache = fabricate(
            4,
            Some("a"),
            Some("c"),
            &[
                ("a", "0", None, Some("b")),
                ("b", "1", Some("a"), Some("c")),
                ("c", "2", Some("b"), None),
            ],
        );

        assert_eq!(cache.read(&"b"), Some(&"1"));
        assert_eq!(chain(&cache), vec!["b", "a", "c"]);
        assert_eq!(cache.least_recent(), Some(&"c"));
    }

    #[test]
    fn test_write_in_order() {
        let mut cache = LruCache::new(4).unwrap();
        for (key, value) in [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")] {
            assert_eq!(cache.write(key, value), Ok(None));
        }

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.most_recent(), Some(&"d"));
        assert_eq!(cache.least_recent(), Some(&"a"));
        assert_eq!(cache.peek(&"c"), Some(&"3"));
        assert_eq!(chain(&cache), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_write_reserved_key() {
        let mut cache = LruCache::new(4).unwrap();
        assert_eq!(cache.write("", "Should not be here"), Err(LruError::InvalidKey));
        assert!(cache.is_empty());
        assert_eq!(cache.read(&""), None);
        assert!(!cache.contains(&""));
    }

    #[test]
    fn test_write_uninitialized_cache() {
        let mut cache = fabricate(0, None, None, &[]);
        assert_eq!(
            cache.write("a", "Should not be here"),
            Err(LruError::Capacity { capacity: 0 })
        );
        assert_eq!(cache.read(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_tail_keeps_size() {
        let mut cache = LruCache::new(3).unwrap();
        cache.write("a", 1).unwrap();
        cache.write("b", 2).unwrap();
        cache.write("c", 3).unwrap();

        assert_eq!(cache.write("a", 10), Ok(Some(1)));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.most_recent(), Some(&"a"));
        assert_eq!(cache.least_recent(), Some(&"b"));
        assert_eq!(cache.index[&"b"].older, None);
    }

    #[test]
    fn test_eviction_links_new_tail() {
        let mut cache = LruCache::new(3).unwrap();
        cache.write("a", 1).unwrap();
        cache.write("b", 2).unwrap();
        cache.write("c", 3).unwrap();
        cache.write("d", 4).unwrap();

        assert!(!cache.contains(&"a"));
        assert_eq!(cache.least_recent(), Some(&"b"));
        assert_eq!(cache.index[&"b"].older, None);
        assert_eq!(cache.index[&"b"].newer, Some("c"));
        assert_eq!(cache.index[&"d"].older, Some("c"));
    }

    #[test]
    fn test_eviction_drops_captured_tail_only() {
        // The old tail goes, the new tail stays.
        let mut cache = LruCache::new(2).unwrap();
        cache.write("a", 1).unwrap();
        cache.write("b", 2).unwrap();
        cache.write("c", 3).unwrap();

        assert_eq!(cache.peek(&"a"), None);
        assert_eq!(cache.peek(&"b"), Some(&2));
        assert_eq!(cache.peek(&"c"), Some(&3));
        assert_eq!(chain(&cache), vec!["c", "b"]);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut cache = LruCache::new(2).unwrap();
        cache.write("a", 1).unwrap();
        cache.write("b", 2).unwrap();

        assert_eq!(cache.peek(&"a"), Some(&1));
        cache.write("c", 3).unwrap();
        assert!(!cache.contains(&"a"));
    }

    #[test]
    fn test_repeated_head_read_is_noop() {
        let mut cache = LruCache::new(3).unwrap();
        cache.write("a", 1).unwrap();
        cache.write("b", 2).unwrap();

        let before = cache.inspect();
        for _ in 0..5 {
            assert_eq!(cache.read(&"b"), Some(&2));
        }
        let after = cache.inspect();
        assert_eq!(before.walk, after.walk);
    }
}
