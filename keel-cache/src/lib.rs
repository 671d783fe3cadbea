//! Cache adapters for keel company snapshots.
//!
//! [`MemoryCache`] is an in-process key-value cache with configurable
//! capacity and per-entry expiration. With the `redis` feature,
//! [`RedisCache`] keeps snapshots in a Redis server shared by every process.
//! Both are exposed through [`keel_core::ConfigCache`].

mod cache;
#[cfg(feature = "redis")]
mod redis_cache;

pub use cache::{CacheConfig, CacheStats, MemoryCache};
#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;
