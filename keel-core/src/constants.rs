//! Cache key layout and operational defaults.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// Prefix of every company configuration cache key.
pub const CACHE_KEY_PREFIX: &str = "config:";

/// Builds the cache key holding a company's configuration snapshot.
pub fn cache_key(company_id: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{company_id}")
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default cache entry lifetime in seconds. Zero means entries never expire.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 0;

/// Default maximum number of entries held by the in-memory cache.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Default deadline for a single durable store call, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Default deadline for a single cache call, in milliseconds.
pub const DEFAULT_CACHE_TIMEOUT_MS: u64 = 250;
