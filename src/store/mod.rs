//! Key-value store adapter with emulated TTL support.
//!
//! Wraps an external key-value client behind [`BackendStore`] and layers
//! `expire`, `get_ttl`, `persist` and `has` on top of its get/replace/delete
//! primitives. Supported backends:
//! - Memcached (via the `memcache` client)
//! - Redis (bb8 pool)
//! - Memory (in-process, for tests and local runs)
//!
//! # Configuration
//!
//! ```toml
//! [store]
//! backend = "memcache"  # or "redis" or "memory"
//!
//! [store.memcache]
//! url = "memcache://127.0.0.1:11211?protocol=binary"
//! pool_size = 4
//! read_timeout = 5
//! write_timeout = 5
//!
//! [store.redis]
//! url = "redis://127.0.0.1:6379"
//! pool_size = 4
//! connection_timeout = 5
//! key_prefix = "kvttl"
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let store = StoreManager::new(&settings.store).await?;
//! store.set("session", b"token".to_vec()).await?;
//! store.expire("session", 30).await?;
//! let remaining = store.get_ttl("session").await?;
//! ```

mod clock;
pub mod envelope;
mod error;
mod manager;
mod memcache;
mod memory;
mod redis;
mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::Envelope;
pub use error::StoreError;
pub use manager::StoreManager;
pub use self::memcache::MemcacheStore;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use traits::BackendStore;

// Re-export config types
pub use crate::config::settings::{
    MemcacheStoreConfig, RedisStoreConfig, StoreBackend, StoreConfig,
};
