//! BackendStore trait definition.

use async_trait::async_trait;

use crate::store::StoreError;

/// Primitive operations of the wrapped key-value client.
///
/// Every backend must implement this trait so the TTL envelope protocol can be
/// layered on top of it. A `ttl_seconds` of `0` means the entry never expires.
#[async_trait]
pub trait BackendStore: Send + Sync {
    /// Read the raw bytes stored under `key`.
    ///
    /// Fails with [`StoreError::KeyNotFound`] when the key is absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Unconditionally store `value` under `key`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<bool, StoreError>;

    /// Overwrite an existing key's value and backend-native TTL.
    ///
    /// Returns `false` when the key does not exist.
    async fn replace(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: u64,
    ) -> Result<bool, StoreError>;

    /// Remove a key. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove every key owned by this backend.
    async fn flush(&self) -> Result<bool, StoreError>;
}
