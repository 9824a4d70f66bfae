//! Redis backend using a bb8 connection pool.

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::config::settings::RedisStoreConfig;
use crate::store::{BackendStore, StoreError};

type RedisPool = Pool<Client>;

/// Redis-backed store. All keys live under `{key_prefix}:`.
pub struct RedisStore {
    pool: RedisPool,
    key_prefix: String,
}

impl RedisStore {
    pub async fn new(config: &RedisStoreConfig) -> Result<Self, StoreError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| StoreError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, prefix = %config.key_prefix, "connected to redis");

        Ok(Self {
            pool,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn prefixed_key(&self, key: &str) -> String {
        prefixed_key(&self.key_prefix, key)
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

fn prefixed_key(prefix: &str, key: &str) -> String {
    format!("{}:{}", prefix, key)
}

/// `SET key value XX [EX ttl]`. Without `EX` the write also drops any
/// existing expiry.
fn replace_cmd(key: &str, value: Vec<u8>, ttl_seconds: u64) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value).arg("XX");
    if ttl_seconds > 0 {
        cmd.arg("EX").arg(ttl_seconds);
    }
    cmd
}

#[async_trait]
impl BackendStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let prefixed = self.prefixed_key(key);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let value: Option<Vec<u8>> = conn_ref
            .get(&prefixed)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))?;
        value.ok_or_else(|| StoreError::key_not_found(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<bool, StoreError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let prefixed = self.prefixed_key(key);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        if ttl_seconds > 0 {
            conn_ref
                .set_ex::<_, _, ()>(&prefixed, value, ttl_seconds)
                .await
                .map_err(|e| StoreError::Operation(e.to_string()))?;
        } else {
            conn_ref
                .set::<_, _, ()>(&prefixed, value)
                .await
                .map_err(|e| StoreError::Operation(e.to_string()))?;
        }
        Ok(true)
    }

    async fn replace(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: u64,
    ) -> Result<bool, StoreError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let prefixed = self.prefixed_key(key);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let reply: Option<String> = replace_cmd(&prefixed, value, ttl_seconds)
            .query_async(conn_ref)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let prefixed = self.prefixed_key(key);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let removed: i64 = conn_ref
            .del(&prefixed)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn flush(&self) -> Result<bool, StoreError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let pattern = format!("{}:*", self.key_prefix);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(conn_ref)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))?;

        tracing::debug!(count = keys.len(), %pattern, "flushing keys");

        if !keys.is_empty() {
            let conn_ref: &mut MultiplexedConnection = &mut conn;
            conn_ref
                .del::<_, ()>(keys)
                .await
                .map_err(|e| StoreError::Operation(e.to_string()))?;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_key() {
        assert_eq!(prefixed_key("kvttl", "a"), "kvttl:a");
    }

    #[test]
    fn test_replace_cmd_with_ttl() {
        let packed = replace_cmd("kvttl:a", b"v".to_vec(), 30).get_packed_command();
        let text = String::from_utf8_lossy(&packed);
        assert!(text.contains("XX"));
        assert!(text.contains("EX"));
        assert!(text.contains("30"));
    }

    #[test]
    fn test_replace_cmd_without_ttl_drops_expiry() {
        let packed = replace_cmd("kvttl:a", b"v".to_vec(), 0).get_packed_command();
        let text = String::from_utf8_lossy(&packed);
        assert!(text.contains("XX"));
        assert!(!text.contains("\r\nEX\r\n"));
    }
}
