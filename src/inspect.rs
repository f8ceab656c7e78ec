//! Side-effect-free inspection of a cache's internal state.
//!
//! [`LruCache::inspect`] snapshots the entry set and walks the recency chain
//! from the most recently used entry toward the least recently used one. The
//! walk is bounded by the cache capacity, so a corrupted chain is reported as
//! a [`ChainFault`] instead of looping forever. Besides cycles, missing keys
//! and unreachable entries, the walk checks that every `newer` link points
//! back at the entry before it and that the chain ends at `least_recent`.

use crate::lru_cache::{Entry, LruCache};
use std::fmt::{self, Debug};
use std::hash::Hash;
use tracing::error;

/// One entry as seen by [`LruCache::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot<K, V> {
    pub key: K,
    pub value: V,
    /// Neighbour one step closer to the most recently used end.
    pub newer: Option<K>,
    /// Neighbour one step closer to the least recently used end.
    pub older: Option<K>,
}

impl<K: Clone, V: Clone> EntrySnapshot<K, V> {
    fn new(key: &K, entry: &Entry<K, V>) -> Self {
        Self {
            key: key.clone(),
            value: entry.value.clone(),
            newer: entry.newer.clone(),
            older: entry.older.clone(),
        }
    }
}

/// Structural problem found while walking the recency chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainFault<K> {
    /// The walk did not terminate within `limit` steps.
    Overrun { limit: usize },
    /// A link names a key that is not in the index.
    DanglingLink { key: K },
    /// The walk ended after `walked` entries while the index holds `len`.
    Truncated { walked: usize, len: usize },
    /// The most recently used entry names a newer neighbour.
    HeadHasNewer { key: K },
    /// An entry's `newer` link does not name the entry walked just before it.
    BrokenBackLink { key: K },
    /// The walk ended at `found` while `least_recent` names `expected`.
    TailMismatch {
        expected: Option<K>,
        found: Option<K>,
    },
}

impl<K: Debug> fmt::Display for ChainFault<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFault::Overrun { limit } => {
                write!(f, "recency chain exceeds {} entries", limit)
            }
            ChainFault::DanglingLink { key } => {
                write!(f, "recency chain links to missing key {:?}", key)
            }
            ChainFault::Truncated { walked, len } => {
                write!(f, "recency chain reaches {} of {} entries", walked, len)
            }
            ChainFault::HeadHasNewer { key } => {
                write!(f, "most recent entry {:?} has a newer neighbour", key)
            }
            ChainFault::BrokenBackLink { key } => {
                write!(f, "entry {:?} does not link back to its newer neighbour", key)
            }
            ChainFault::TailMismatch { expected, found } => write!(
                f,
                "recency chain ends at {} but least recent is {}",
                Link(found),
                Link(expected)
            ),
        }
    }
}

/// Snapshot of a cache produced by [`LruCache::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection<K, V> {
    pub capacity: usize,
    pub len: usize,
    pub most_recent: Option<K>,
    pub least_recent: Option<K>,
    /// Every indexed entry, in hash order.
    pub entries: Vec<EntrySnapshot<K, V>>,
    /// Entries in recency order, most recently used first.
    pub walk: Vec<EntrySnapshot<K, V>>,
    pub fault: Option<ChainFault<K>>,
}

impl<K, V> Inspection<K, V> {
    /// Returns true if the walk covered the whole index without a fault.
    pub fn is_consistent(&self) -> bool {
        self.fault.is_none()
    }

    /// Keys in recency order, most recently used first.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.walk.iter().map(|entry| &entry.key)
    }
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Debug + Hash + Eq + Default,
    V: Clone + Debug,
{
    /// Snapshots the cache and walks its recency chain.
    ///
    /// Never modifies the cache. A structural fault is logged at error level
    /// and recorded in [`Inspection::fault`].
    ///
    /// Keys and values are cloned into the snapshot, hence the `V: Clone`
    /// bound. Caches of non-`Clone` values can store `Rc<V>` or `Arc<V>`.
    pub fn inspect(&self) -> Inspection<K, V> {
        let entries = self
            .index
            .iter()
            .map(|(key, entry)| EntrySnapshot::new(key, entry))
            .collect();

        let mut walk = Vec::with_capacity(self.index.len());
        let mut fault = None;
        let mut previous: Option<K> = None;
        let mut cursor = self.most_recent.clone();
        while let Some(key) = cursor {
            if walk.len() >= self.capacity {
                fault = Some(ChainFault::Overrun {
                    limit: self.capacity,
                });
                break;
            }
            let Some(entry) = self.index.get(&key) else {
                fault = Some(ChainFault::DanglingLink { key });
                break;
            };
            if entry.newer != previous {
                fault = Some(if previous.is_none() {
                    ChainFault::HeadHasNewer { key }
                } else {
                    ChainFault::BrokenBackLink { key }
                });
                break;
            }
            walk.push(EntrySnapshot::new(&key, entry));
            cursor = entry.older.clone();
            previous = Some(key);
        }

        if fault.is_none() && previous != self.least_recent {
            fault = Some(ChainFault::TailMismatch {
                expected: self.least_recent.clone(),
                found: previous,
            });
        }

        if fault.is_none() && walk.len() != self.index.len() {
            fault = Some(ChainFault::Truncated {
                walked: walk.len(),
                len: self.index.len(),
            });
        }

        if let Some(fault) = &fault {
            error!(
                capacity = self.capacity,
                len = self.index.len(),
                %fault,
                "error in structure of cache"
            );
        }

        Inspection {
            capacity: self.capacity,
            len: self.index.len(),
            most_recent: self.most_recent.clone(),
            least_recent: self.least_recent.clone(),
            entries,
            walk,
            fault,
        }
    }
}

struct Link<'a, K>(&'a Option<K>);

impl<K: Debug> fmt::Display for Link<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(key) => write!(f, "{:?}", key),
            None => f.write_str("-"),
        }
    }
}

impl<K: Debug, V: Debug> fmt::Display for EntrySnapshot<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node: {:?} value: {:?} newer: {} older: {}",
            self.key,
            self.value,
            Link(&self.newer),
            Link(&self.older)
        )
    }
}

impl<K: Debug, V: Debug> fmt::Display for Inspection<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "cache max: {} size: {} most recent: {} least recent: {}",
            self.capacity,
            self.len,
            Link(&self.most_recent),
            Link(&self.least_recent)
        )?;

        writeln!(f, "raw")?;
        for entry in &self.entries {
            writeln!(f, "  {}", entry)?;
        }

        writeln!(f, "traverse from most to least recently used")?;
        for entry in &self.walk {
            writeln!(f, "  {}", entry)?;
        }

        if let Some(fault) = &self.fault {
            writeln!(f, "error in structure of cache: {}", fault)?;
        }
        Ok(())
    }
}
