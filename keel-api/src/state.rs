//! App state: store/cache wiring, service, config.

use std::sync::Arc;
use std::time::Duration;

use keel_cache::{CacheConfig, MemoryCache, RedisCache};
use keel_core::constants::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TIMEOUT_MS, DEFAULT_CACHE_TTL_SECONDS,
    DEFAULT_STORE_TIMEOUT_MS,
};
use keel_core::error::Result;
use keel_core::traits::{ConfigCache, ConfigStore};
use keel_store::{MemoryStore, SqlStore};
use keel_sync::{ConfigService, Coordinator, CoordinatorConfig};
use tracing::{info, warn};

/// Server settings, read from `KEEL_*` environment variables.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// libSQL URL or file path; `None` keeps everything in memory
    pub database_url: Option<String>,
    /// Auth token for remote databases
    pub database_token: Option<String>,
    /// Redis URL; `None` caches in process
    pub redis_url: Option<String>,
    /// Snapshot TTL; 0 keeps snapshots until evicted
    pub cache_ttl_seconds: u64,
    /// Cache capacity in companies
    pub cache_max_entries: usize,
    /// Bound on each store call
    pub store_timeout_ms: u64,
    /// Bound on each cache call
    pub cache_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_token: None,
            redis_url: None,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            cache_timeout_ms: DEFAULT_CACHE_TIMEOUT_MS,
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

impl ApiConfig {
    /// Loads `.env` if present, then reads the environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            database_url: std::env::var("KEEL_DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            database_token: std::env::var("KEEL_DATABASE_TOKEN").ok(),
            redis_url: std::env::var("KEEL_REDIS_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            cache_ttl_seconds: env_number("KEEL_CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL_SECONDS),
            cache_max_entries: env_number("KEEL_CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES),
            store_timeout_ms: env_number("KEEL_STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS),
            cache_timeout_ms: env_number("KEEL_CACHE_TIMEOUT_MS", DEFAULT_CACHE_TIMEOUT_MS),
        }
    }

    fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            cache_timeout: Duration::from_millis(self.cache_timeout_ms),
        }
    }
}

/// Where company snapshots are cached.
#[derive(Clone)]
pub enum CacheBackend {
    /// In-process cache, private to this server
    Memory(Arc<MemoryCache>),
    /// Redis server shared by every server on the same store
    Redis(RedisCache),
}

impl CacheBackend {
    /// In-process cache sized from `config`.
    pub fn memory(config: &ApiConfig) -> Self {
        CacheBackend::Memory(Arc::new(MemoryCache::with_config(CacheConfig {
            max_entries: config.cache_max_entries,
            ..CacheConfig::default()
        })))
    }

    /// Backend name reported by the health check.
    pub fn name(&self) -> &'static str {
        match self {
            CacheBackend::Memory(_) => "memory",
            CacheBackend::Redis(_) => "redis",
        }
    }

    /// The in-process cache, if that is the backend.
    pub fn as_memory(&self) -> Option<&MemoryCache> {
        match self {
            CacheBackend::Memory(cache) => Some(cache.as_ref()),
            CacheBackend::Redis(_) => None,
        }
    }

    fn handle(&self) -> Arc<dyn ConfigCache> {
        match self {
            CacheBackend::Memory(cache) => cache.clone(),
            CacheBackend::Redis(cache) => Arc::new(cache.clone()),
        }
    }
}

/// Shared handler state.
pub struct AppState {
    /// Settings the state was built from
    pub config: ApiConfig,
    /// Snapshot cache
    pub cache: CacheBackend,
    /// Field and cadence operations
    pub service: ConfigService,
}

impl AppState {
    /// Opens the configured store (provisioning its schema) and cache, and
    /// wires the service.
    pub async fn connect(config: ApiConfig) -> Result<Self> {
        let store: Arc<dyn ConfigStore> = match &config.database_url {
            Some(url) => {
                let store = SqlStore::connect(url, config.database_token.clone()).await?;
                store.migrate().await?;
                Arc::new(store)
            }
            None => {
                info!("No KEEL_DATABASE_URL set, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        let cache = match &config.redis_url {
            Some(url) => CacheBackend::Redis(RedisCache::connect(url).await?),
            None => {
                if config.database_url.is_some() {
                    warn!("No KEEL_REDIS_URL set, caching in process; other servers on this store keep their own caches");
                }
                CacheBackend::memory(&config)
            }
        };

        Ok(Self::with_cache(config, store, cache))
    }

    /// Wires the service around an in-memory store.
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Wires the service around the given store and a fresh in-process cache.
    pub fn with_store(config: ApiConfig, store: Arc<dyn ConfigStore>) -> Self {
        let cache = CacheBackend::memory(&config);
        Self::with_cache(config, store, cache)
    }

    /// Wires the service around the given store and cache.
    pub fn with_cache(config: ApiConfig, store: Arc<dyn ConfigStore>, cache: CacheBackend) -> Self {
        let coordinator = Coordinator::with_config(store, cache.handle(), config.coordinator_config());

        Self {
            config,
            cache,
            service: ConfigService::new(Arc::new(coordinator)),
        }
    }
}
