//! In-process backend with per-entry TTL support.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::store::{BackendStore, Clock, StoreError};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<i64>, // Unix timestamp in seconds
}

impl Entry {
    fn new(value: Vec<u8>, now: i64, ttl_seconds: u64) -> Self {
        let expires_at = (ttl_seconds > 0)
            .then(|| now.saturating_add(i64::try_from(ttl_seconds).unwrap_or(i64::MAX)));
        Self { value, expires_at }
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Memory-backed store. Expired entries are dropped lazily on access.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BackendStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            tracing::trace!(key, "evicting expired entry");
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        Err(StoreError::key_not_found(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<bool, StoreError> {
        let now = self.clock.now();
        self.entries
            .insert(key.to_string(), Entry::new(value, now, ttl_seconds));
        Ok(true)
    }

    async fn replace(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: u64,
    ) -> Result<bool, StoreError> {
        let now = self.clock.now();
        match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                *entry = Entry::new(value, now, ttl_seconds);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired(now)))
    }

    async fn flush(&self) -> Result<bool, StoreError> {
        self.entries.clear();
        Ok(true)
    }
}
