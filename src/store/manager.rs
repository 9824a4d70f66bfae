//! Store manager exposing key-value semantics with emulated TTLs.

use std::sync::Arc;

use crate::config::settings::{StoreBackend, StoreConfig};
use crate::store::envelope::Envelope;
use crate::store::memcache::MemcacheStore;
use crate::store::memory::MemoryStore;
use crate::store::redis::RedisStore;
use crate::store::{BackendStore, Clock, StoreError, SystemClock};

/// Key-value adapter over a [`BackendStore`].
///
/// The backend cannot report a key's remaining TTL, so `expire` stores the
/// write time and duration inside an [`Envelope`] next to the value and
/// `get_ttl` reconstructs the remainder from it.
///
/// `expire` and `persist` read and then replace the key as two separate
/// backend calls. A concurrent writer between the two is overwritten.
#[derive(Clone)]
pub struct StoreManager {
    backend: Arc<dyn BackendStore>,
    clock: Arc<dyn Clock>,
}

impl StoreManager {
    /// Connect to the backend selected in `config`.
    pub async fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let backend: Arc<dyn BackendStore> = match config.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new(clock.clone())),
            StoreBackend::Memcache => {
                Arc::new(MemcacheStore::new(&config.memcache, clock.clone())?)
            }
            StoreBackend::Redis => Arc::new(RedisStore::new(&config.redis).await?),
        };

        Ok(Self { backend, clock })
    }

    /// Wrap an already constructed backend.
    pub fn with_backend(backend: Arc<dyn BackendStore>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    // ========================================================================
    // Value operations
    // ========================================================================

    /// Raw bytes stored under `key`. Keys with a TTL return the envelope bytes.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.backend.get(key).await
    }

    /// Store a bare value with no expiry.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> Result<bool, StoreError> {
        self.backend.set(key, value, 0).await
    }

    pub async fn flush(&self) -> Result<bool, StoreError> {
        self.backend.flush().await
    }

    // ========================================================================
    // Key operations
    // ========================================================================

    pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.backend.delete(key).await
    }

    /// Set a key's time to live in seconds.
    ///
    /// Returns `false` without touching the backend when the key does not
    /// exist. The current stored bytes are wrapped as they are, so calling
    /// `expire` on a key that already has a TTL nests the previous envelope.
    pub async fn expire(&self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        let current = match self.backend.get(key).await {
            Ok(value) => value,
            Err(StoreError::KeyNotFound(_)) => {
                tracing::debug!(key, "expire skipped, key not found");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let ttl = i64::try_from(seconds)
            .map_err(|_| StoreError::Operation(format!("ttl {seconds}s out of range")))?;
        let payload = Envelope::wrap(current, self.clock.now(), ttl).encode()?;

        self.backend.replace(key, payload, seconds).await
    }

    /// Remaining time to live of a key that has a timeout.
    ///
    /// May be zero or negative when the backend has not evicted the key yet.
    pub async fn get_ttl(&self, key: &str) -> Result<i64, StoreError> {
        let raw = self.backend.get(key).await?;
        Envelope::decode(raw)
            .remaining_ttl(self.clock.now())
            .ok_or_else(|| StoreError::NoTtlAssociated(key.to_string()))
    }

    pub async fn has(&self, key: &str) -> Result<bool, StoreError> {
        match self.backend.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::KeyNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Remove the timeout on `key`, restoring its bare value.
    pub async fn persist(&self, key: &str) -> Result<bool, StoreError> {
        let raw = self.backend.get(key).await?;
        let envelope = Envelope::decode(raw);
        if !envelope.has_expiry() {
            return Err(StoreError::NoTtlAssociated(key.to_string()));
        }

        self.backend.replace(key, envelope.into_value(), 0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ManualClock;

    fn manager() -> (StoreManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let backend = Arc::new(MemoryStore::new(clock.clone()));
        (StoreManager::with_backend(backend, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_missing_key() {
        let (store, _) = manager();
        assert!(!store.has("k").await.unwrap());
        assert!(store.get_ttl("k").await.unwrap_err().is_key_not_found());
        assert!(!store.expire("k", 30).await.unwrap());
        assert!(store.persist("k").await.unwrap_err().is_key_not_found());
        assert!(!store.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_bare_value_has_no_ttl() {
        let (store, _) = manager();
        store.set("k", b"v".to_vec()).await.unwrap();
        assert!(store.has("k").await.unwrap());
        assert!(matches!(
            store.get_ttl("k").await,
            Err(StoreError::NoTtlAssociated(key)) if key == "k"
        ));
        assert!(matches!(
            store.persist("k").await,
            Err(StoreError::NoTtlAssociated(_))
        ));
    }

    #[tokio::test]
    async fn test_expire_then_ttl_counts_down() {
        let (store, clock) = manager();
        store.set("k", b"v".to_vec()).await.unwrap();
        assert!(store.expire("k", 100).await.unwrap());
        assert_eq!(store.get_ttl("k").await.unwrap(), 100);
        clock.advance(40);
        assert_eq!(store.get_ttl("k").await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_expire_sets_backend_ttl() {
        let (store, clock) = manager();
        store.set("k", b"v".to_vec()).await.unwrap();
        store.expire("k", 10).await.unwrap();
        clock.advance(10);
        assert!(!store.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_persist_restores_bare_value() {
        let (store, clock) = manager();
        store.set("k", b"hello".to_vec()).await.unwrap();
        store.expire("k", 10).await.unwrap();
        assert!(store.persist("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), b"hello".to_vec());
        clock.advance(1_000);
        assert!(store.has("k").await.unwrap());
        assert!(matches!(
            store.get_ttl("k").await,
            Err(StoreError::NoTtlAssociated(_))
        ));
    }

    #[tokio::test]
    async fn test_get_returns_envelope_bytes_for_ttl_key() {
        let (store, clock) = manager();
        store.set("k", b"hello".to_vec()).await.unwrap();
        store.expire("k", 30).await.unwrap();
        let raw = store.get("k").await.unwrap();
        assert_eq!(
            Envelope::decode(raw),
            Envelope::wrap(b"hello".to_vec(), clock.now(), 30)
        );
    }

    #[tokio::test]
    async fn test_repeated_expire_wraps_previous_envelope() {
        let (store, clock) = manager();
        store.set("k", b"hello".to_vec()).await.unwrap();
        store.expire("k", 30).await.unwrap();
        let first = store.get("k").await.unwrap();

        clock.advance(5);
        store.expire("k", 50).await.unwrap();
        assert_eq!(store.get_ttl("k").await.unwrap(), 50);

        // One persist peels one layer only.
        store.persist("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), first);
        assert_eq!(store.get_ttl("k").await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_negative_ttl_before_eviction() {
        let clock = Arc::new(ManualClock::new(1_000));
        let backend = Arc::new(MemoryStore::new(clock.clone()));
        let store = StoreManager::with_backend(backend.clone(), clock.clone());

        // Envelope says 5s, backend keeps the key for 60s.
        let payload = Envelope::wrap(b"v".to_vec(), 1_000, 5).encode().unwrap();
        backend.set("k", payload, 60).await.unwrap();
        clock.advance(8);
        assert_eq!(store.get_ttl("k").await.unwrap(), -3);
    }

    #[tokio::test]
    async fn test_delete_wrapped_and_bare() {
        let (store, _) = manager();
        store.set("bare", b"v".to_vec()).await.unwrap();
        store.set("wrapped", b"v".to_vec()).await.unwrap();
        store.expire("wrapped", 30).await.unwrap();

        assert!(store.delete("bare").await.unwrap());
        assert!(store.delete("wrapped").await.unwrap());
        assert!(!store.has("bare").await.unwrap());
        assert!(!store.has("wrapped").await.unwrap());
    }

    #[tokio::test]
    async fn test_new_memory_backend_from_config() {
        let store = StoreManager::new(&StoreConfig::default()).await.unwrap();
        assert!(store.set("k", b"v".to_vec()).await.unwrap());
        assert!(store.has("k").await.unwrap());
        assert!(store.flush().await.unwrap());
        assert!(!store.has("k").await.unwrap());
    }
}
