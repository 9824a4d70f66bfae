//! Memcached backend built on the blocking `memcache` client.
//!
//! Calls are moved onto tokio's blocking pool so the async trait surface
//! never stalls the runtime.
//!
//! The client must speak the binary protocol. Over ASCII a `replace` on a
//! missing key comes back as success, so `protocol=ascii` URLs are rejected
//! at config validation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use memcache::{Client, CommandError, MemcacheError};

use crate::config::settings::MemcacheStoreConfig;
use crate::store::{BackendStore, Clock, StoreError};

/// Longest exptime memcached reads as relative seconds. Larger values are
/// absolute Unix timestamps.
const MAX_RELATIVE_EXPIRATION: u64 = 60 * 60 * 24 * 30;

/// Memcached-backed store.
pub struct MemcacheStore {
    client: Arc<Client>,
    clock: Arc<dyn Clock>,
}

impl MemcacheStore {
    pub fn new(config: &MemcacheStoreConfig, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let client = Client::with_pool_size(config.url.as_str(), config.pool_size)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        client
            .set_read_timeout(Some(Duration::from_secs(config.read_timeout)))
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        client
            .set_write_timeout(Some(Duration::from_secs(config.write_timeout)))
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, pool_size = config.pool_size, "connected to memcached");

        Ok(Self {
            client: Arc::new(client),
            clock,
        })
    }

    async fn run<T, F>(&self, f: F) -> Result<T, MemcacheError>
    where
        F: FnOnce(&Client) -> Result<T, MemcacheError> + Send + 'static,
        T: Send + 'static,
    {
        let client = Arc::clone(&self.client);
        match tokio::task::spawn_blocking(move || f(&client)).await {
            Ok(result) => result,
            Err(e) => Err(MemcacheError::from(std::io::Error::other(e.to_string()))),
        }
    }
}

/// Convert a ttl in seconds into a memcached exptime.
///
/// Durations past 30 days are sent as `now + ttl`. The result must fit the
/// protocol's `u32`.
fn expiration(ttl_seconds: u64, now: i64) -> Result<u32, StoreError> {
    let exptime = if ttl_seconds <= MAX_RELATIVE_EXPIRATION {
        Some(ttl_seconds)
    } else {
        u64::try_from(now)
            .ok()
            .and_then(|now| now.checked_add(ttl_seconds))
    };

    exptime
        .and_then(|exptime| u32::try_from(exptime).ok())
        .ok_or_else(|| {
            StoreError::Operation(format!("ttl {ttl_seconds}s exceeds memcached range"))
        })
}

fn is_missing(error: &MemcacheError) -> bool {
    matches!(error, MemcacheError::CommandError(CommandError::KeyNotFound))
}

fn operation_error(error: MemcacheError) -> StoreError {
    StoreError::Operation(error.to_string())
}

#[async_trait]
impl BackendStore for MemcacheStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let owned = key.to_string();
        let value: Option<Vec<u8>> = self
            .run(move |client| client.get::<Vec<u8>>(&owned))
            .await
            .map_err(operation_error)?;
        value.ok_or_else(|| StoreError::key_not_found(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<bool, StoreError> {
        let exp = expiration(ttl_seconds, self.clock.now())?;
        let owned = key.to_string();
        self.run(move |client| client.set(&owned, value.as_slice(), exp))
            .await
            .map_err(operation_error)?;
        Ok(true)
    }

    async fn replace(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: u64,
    ) -> Result<bool, StoreError> {
        let exp = expiration(ttl_seconds, self.clock.now())?;
        let owned = key.to_string();
        match self
            .run(move |client| client.replace(&owned, value.as_slice(), exp))
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if is_missing(&e) => {
                tracing::debug!(key, "replace on missing key");
                Ok(false)
            }
            Err(e) => Err(operation_error(e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let owned = key.to_string();
        self.run(move |client| client.delete(&owned))
            .await
            .map_err(operation_error)
    }

    async fn flush(&self) -> Result<bool, StoreError> {
        self.run(|client| client.flush())
            .await
            .map_err(operation_error)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SystemClock;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_expiration_relative() {
        assert_eq!(expiration(0, NOW).unwrap(), 0);
        assert_eq!(expiration(30, NOW).unwrap(), 30);
        assert_eq!(expiration(2_592_000, NOW).unwrap(), 2_592_000);
    }

    #[test]
    fn test_expiration_past_thirty_days_is_absolute() {
        assert_eq!(expiration(2_592_001, NOW).unwrap(), 1_702_592_001);
        assert_eq!(
            expiration(365 * 24 * 3600, NOW).unwrap(),
            1_700_000_000 + 31_536_000
        );
    }

    #[test]
    fn test_expiration_out_of_range() {
        let err = expiration(u64::from(u32::MAX), NOW).unwrap_err();
        assert!(matches!(err, StoreError::Operation(_)));
        assert!(expiration(u64::MAX, NOW).is_err());
        assert!(expiration(2_592_001, -1).is_err());
    }

    #[test]
    fn test_missing_key_detection() {
        assert!(is_missing(&MemcacheError::CommandError(
            CommandError::KeyNotFound
        )));
        assert!(!is_missing(&MemcacheError::CommandError(
            CommandError::KeyExists
        )));
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let config = MemcacheStoreConfig {
            url: "not-a-url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            MemcacheStore::new(&config, Arc::new(SystemClock)),
            Err(StoreError::Connection(_))
        ));
    }
}
