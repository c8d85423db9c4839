//! Local caching for offline and instant-start content access.
//!
//! - `CacheStore`: the persisted, versioned content record (`FileCacheStore`
//!   on disk, `MemoryCacheStore` in process)
//! - `CacheManager`: JSON files in the cache directory, plus timestamped
//!   auxiliary data such as calendar events

pub mod manager;
pub mod store;

pub use manager::{age_display, CacheManager, CachedData};
pub use store::{
    CacheRecord, CacheStore, FileCacheStore, MemoryCacheStore, CACHE_SCHEMA_VERSION,
    DEFAULT_CACHE_EXPIRY_HOURS,
};
