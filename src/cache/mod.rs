//! Listing cache.
//!
//! Serialized flat listings keyed by `(scope, house_id)`. Entries are
//! populated on read misses and dropped whenever a write could change them;
//! an LRU bound and an optional TTL act as safety nets.
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1024
//! ttl_seconds = 600
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::{ListingKey, ListingScope};
pub use store::{CacheError, CacheLookup, MemoryViewStore, ViewStore};

pub(crate) use store::METRIC_CACHE_EVICT;
