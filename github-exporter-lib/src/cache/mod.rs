//! Storage for serialized HTTP responses.
//!
//! The cache layer of the transport pipeline stores each cacheable `200` response
//! as its HTTP/1.1 wire form under the request's cache key. Entries remember when
//! they were stored (or last confirmed by the origin), which the revalidation layer
//! uses to decide whether a round trip is needed at all.
//!
//! Implementations must be safe to share between concurrent requests. Readers
//! always receive an independent copy of an entry; mutating the cache afterwards
//! never changes what a reader already holds.

mod memory;

pub use memory::MemoryCache;

use bytes::Bytes;
use core::fmt::Debug;
use core::time::Duration;
use tokio::time::Instant;

/// A stored response plus the instant it was last known to be fresh.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    bytes: Bytes,
    stored_at: Instant,
}

impl CacheEntry {
    #[must_use]
    pub fn new(bytes: Bytes) -> Self {
        Self {
            bytes,
            stored_at: Instant::now(),
        }
    }

    /// The serialized response.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[must_use]
    pub const fn stored_at(&self) -> Instant {
        self.stored_at
    }

    /// Time elapsed since the entry was stored or last refreshed.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    /// Resets the age of the entry to zero.
    pub fn refresh(&mut self) {
        self.stored_at = Instant::now();
    }
}

/// A key/value store of serialized responses.
pub trait Cache: Send + Sync + Debug {
    /// Returns a copy of the entry stored under `key`, if any.
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Stores `bytes` under `key` with an age of zero, replacing any existing entry.
    fn set(&self, key: &str, bytes: Bytes);

    /// Removes the entry stored under `key`. Missing keys are ignored.
    fn delete(&self, key: &str);

    /// Resets the age of the entry stored under `key`. Missing keys are ignored.
    fn refresh(&self, key: &str);
}
