//! Fakes for coordinator and service tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use keel_cache::MemoryCache;
use keel_core::error::{KeelError, Result};
use keel_core::traits::{ConfigCache, ConfigStore};
use keel_core::types::{CompanyConfig, EmailCadence, HubSpotField, NewCadence, NewField};
use keel_store::MemoryStore;

use crate::coordinator::Coordinator;

/// Memory store and cache wired into a coordinator, all observable.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub coordinator: Coordinator,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let coordinator = Coordinator::new(store.clone(), cache.clone());
        Self { store, cache, coordinator }
    }

    pub fn cached_snapshot(&self, company_id: &str) -> Option<CompanyConfig> {
        self.cache
            .peek(&keel_core::cache_key(company_id))
            .map(|raw| CompanyConfig::from_json(&raw).unwrap())
    }
}

/// Store whose every call fails.
pub struct FailingStore;

fn down<T>() -> Result<T> {
    Err(KeelError::StoreError("connection refused".into()))
}

#[async_trait]
impl ConfigStore for FailingStore {
    async fn insert_field(&self, _: &NewField) -> Result<HubSpotField> {
        down()
    }

    async fn rename_field(&self, _: &str, _: &str, _: &str) -> Result<u64> {
        down()
    }

    async fn delete_field(&self, _: &str, _: &str) -> Result<u64> {
        down()
    }

    async fn insert_cadence(&self, _: &NewCadence) -> Result<EmailCadence> {
        down()
    }

    async fn update_cadence(&self, _: &str, _: &str, _: &str, _: u32) -> Result<u64> {
        down()
    }

    async fn load_company(&self, _: &str) -> Result<CompanyConfig> {
        down()
    }
}

/// Store whose every call hangs.
pub struct SlowStore;

#[async_trait]
impl ConfigStore for SlowStore {
    async fn insert_field(&self, _: &NewField) -> Result<HubSpotField> {
        std::future::pending().await
    }

    async fn rename_field(&self, _: &str, _: &str, _: &str) -> Result<u64> {
        std::future::pending().await
    }

    async fn delete_field(&self, _: &str, _: &str) -> Result<u64> {
        std::future::pending().await
    }

    async fn insert_cadence(&self, _: &NewCadence) -> Result<EmailCadence> {
        std::future::pending().await
    }

    async fn update_cadence(&self, _: &str, _: &str, _: &str, _: u32) -> Result<u64> {
        std::future::pending().await
    }

    async fn load_company(&self, _: &str) -> Result<CompanyConfig> {
        std::future::pending().await
    }
}

/// Memory store whose writes commit immediately but acknowledge late, and
/// whose loads take their snapshot immediately but return late.
pub struct DelayedStore {
    inner: Arc<MemoryStore>,
    ack_delay: Duration,
    load_delay: Duration,
}

impl DelayedStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            ack_delay: Duration::ZERO,
            load_delay: Duration::ZERO,
        }
    }

    pub fn ack_after(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    pub fn load_after(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    async fn ack<T>(&self, result: Result<T>) -> Result<T> {
        tokio::time::sleep(self.ack_delay).await;
        result
    }
}

#[async_trait]
impl ConfigStore for DelayedStore {
    async fn insert_field(&self, field: &NewField) -> Result<HubSpotField> {
        let result = self.inner.insert_field(field).await;
        self.ack(result).await
    }

    async fn rename_field(&self, company_id: &str, old_name: &str, new_name: &str) -> Result<u64> {
        let result = self.inner.rename_field(company_id, old_name, new_name).await;
        self.ack(result).await
    }

    async fn delete_field(&self, company_id: &str, name: &str) -> Result<u64> {
        let result = self.inner.delete_field(company_id, name).await;
        self.ack(result).await
    }

    async fn insert_cadence(&self, cadence: &NewCadence) -> Result<EmailCadence> {
        let result = self.inner.insert_cadence(cadence).await;
        self.ack(result).await
    }

    async fn update_cadence(
        &self,
        company_id: &str,
        cadence_id: &str,
        template: &str,
        delay_hours: u32,
    ) -> Result<u64> {
        let result = self
            .inner
            .update_cadence(company_id, cadence_id, template, delay_hours)
            .await;
        self.ack(result).await
    }

    async fn load_company(&self, company_id: &str) -> Result<CompanyConfig> {
        let snapshot = self.inner.load_company(company_id).await;
        tokio::time::sleep(self.load_delay).await;
        snapshot
    }
}

/// Cache that either errors or hangs on every call.
pub struct FaultyCache {
    hang: bool,
}

impl FaultyCache {
    pub fn failing() -> Self {
        Self { hang: false }
    }

    pub fn hanging() -> Self {
        Self { hang: true }
    }

    async fn fault<T>(&self) -> Result<T> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Err(KeelError::CacheError("cache unavailable".into()))
    }
}

#[async_trait]
impl ConfigCache for FaultyCache {
    async fn set(&self, _: &str, _: String, _: Duration) -> Result<()> {
        self.fault().await
    }

    async fn get(&self, _: &str) -> Result<Option<String>> {
        self.fault().await
    }

    async fn delete(&self, _: &str) -> Result<()> {
        self.fault().await
    }
}

/// Cache that records mutating calls and otherwise behaves like a miss.
#[derive(Default)]
pub struct RecordingCache {
    calls: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ConfigCache for RecordingCache {
    async fn set(&self, key: &str, _: String, _: Duration) -> Result<()> {
        self.calls.lock().push(format!("set {key}"));
        Ok(())
    }

    async fn get(&self, _: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.calls.lock().push(format!("delete {key}"));
        Ok(())
    }
}
