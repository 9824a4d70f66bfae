//! kv-ttl Library
//!
//! Key-value adapter with emulated TTLs over memcached, Redis or an
//! in-process store, plus the configuration, logging and CLI around it.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod logger;
pub mod store;

pub use store::{StoreError, StoreManager};

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}
