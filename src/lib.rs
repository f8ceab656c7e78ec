//! A fixed-capacity LRU (Least Recently Used) cache.
//!
//! [`LruCache`] holds at most `capacity` entries and evicts the least recently
//! read or written entry when a new key would exceed that bound. Reads and
//! writes run in O(1) amortized time.
//!
//! # Design
//!
//! - Entries live in a `HashMap<K, Entry>`; nothing else owns them
//! - The recency chain is linked by key: each entry stores the keys of its
//!   newer and older neighbours as `Option<K>`
//! - `K::default()` is reserved and is never a valid key
//! - Single-threaded: wrap the cache in a lock to share it
//! - [`LruCache::inspect`] produces a bounded, side-effect-free dump of the
//!   chain for tests and debugging
//!
//! # Examples
//!
//! ```rust
//! use keyed_lru::{LruCache, LruError};
//!
//! let mut cache: LruCache<&str, i32> = LruCache::new(2).unwrap();
//!
//! cache.write("a", 1).unwrap();
//! cache.write("b", 2).unwrap();
//! cache.write("a", 99).unwrap();
//!
//! // "a" was refreshed by the overwrite, so "b" is evicted
//! cache.write("c", 3).unwrap();
//! assert_eq!(cache.read(&"b"), None);
//! assert_eq!(cache.read(&"a"), Some(&99));
//!
//! assert_eq!(cache.write("", 0), Err(LruError::InvalidKey));
//! assert!(LruCache::<&str, i32>::new(1).is_err());
//! ```

pub mod error;
pub mod inspect;
pub mod lru_cache;

pub use error::{LruError, Result};
pub use inspect::{ChainFault, EntrySnapshot, Inspection};
pub use lru_cache::{Cache, LruCache, MIN_CAPACITY};
