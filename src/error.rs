//! Error types for keyed_lru

use std::fmt;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, LruError>;

/// Errors returned by cache construction and writes.
///
/// Reads never fail: a miss is reported as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LruError {
    /// Requested capacity is below the supported minimum
    InvalidCapacity {
        /// Capacity passed to the constructor
        requested: usize,
        /// Smallest capacity the cache accepts
        minimum: usize,
    },

    /// The key equals the reserved sentinel (`K::default()`)
    InvalidKey,

    /// Write attempted on a cache that was never given a valid capacity
    Capacity {
        /// Capacity the cache currently holds
        capacity: usize,
    },
}

impl fmt::Display for LruError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LruError::InvalidCapacity { requested, minimum } => write!(
                f,
                "Invalid capacity: {} (must be at least {})",
                requested, minimum
            ),
            LruError::InvalidKey => write!(f, "Invalid key: the default key is reserved"),
            LruError::Capacity { capacity } => {
                write!(f, "Cache is not initialized: capacity {}", capacity)
            }
        }
    }
}

impl std::error::Error for LruError {}
