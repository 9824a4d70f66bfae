//! Configuration validation logic
//!
//! Range and format checks for every configuration section. Only the section
//! of the selected store backend is validated.

use crate::config::error::ConfigError;
use crate::config::settings::{
    LoggerSettings, MemcacheStoreConfig, RedisStoreConfig, Settings, StoreBackend, StoreConfig,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// URL schemes understood by the memcache client as built (no TLS, and UDP
/// only speaks ASCII)
const MEMCACHE_SCHEMES: &[&str] = &["memcache://"];

const REDIS_SCHEMES: &[&str] = &["redis://", "rediss://", "redis+unix://", "unix://"];

/// ASCII replies to `replace` on a missing key can't be told apart from
/// success, so only binary connections are accepted.
fn uses_binary_protocol(url: &str) -> bool {
    let Some((_, query)) = url.split_once('?') else {
        return false;
    };
    let mut protocols = query
        .split('&')
        .filter_map(|pair| pair.strip_prefix("protocol="));
    protocols.next() == Some("binary") && protocols.next().is_none()
}

impl MemcacheStoreConfig {
    /// # Validation Rules
    /// - URL must use a memcache scheme
    /// - URL must select the binary protocol (`protocol=binary`)
    /// - Pool size must be greater than 0
    /// - Read and write timeouts must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !MEMCACHE_SCHEMES.iter().any(|s| self.url.starts_with(s)) {
            return Err(ConfigError::validation(
                "store.memcache.url",
                format!(
                    "Invalid memcache URL '{}'. Expected one of: {}",
                    self.url,
                    MEMCACHE_SCHEMES.join(", ")
                ),
            ));
        }

        if !uses_binary_protocol(&self.url) {
            return Err(ConfigError::validation(
                "store.memcache.url",
                format!(
                    "Memcache URL '{}' must select the binary protocol with 'protocol=binary'",
                    self.url
                ),
            ));
        }

        if self.pool_size == 0 {
            return Err(ConfigError::validation(
                "store.memcache.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        if self.read_timeout == 0 || self.write_timeout == 0 {
            return Err(ConfigError::validation(
                "store.memcache.timeout",
                "Read and write timeouts must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl RedisStoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !REDIS_SCHEMES.iter().any(|s| self.url.starts_with(s)) {
            return Err(ConfigError::validation(
                "store.redis.url",
                format!("Invalid redis URL '{}'", self.url),
            ));
        }

        if self.pool_size == 0 {
            return Err(ConfigError::validation(
                "store.redis.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "store.redis.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        if self.key_prefix.trim().is_empty() {
            return Err(ConfigError::validation(
                "store.redis.key_prefix",
                "Key prefix must not be empty; flush would match every key.",
            ));
        }

        Ok(())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            StoreBackend::Memory => Ok(()),
            StoreBackend::Memcache => self.memcache.validate(),
            StoreBackend::Redis => self.redis.validate(),
        }
    }
}

impl LoggerSettings {
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all sections, returning the first error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate()?;
        self.store.validate()?;
        Ok(())
    }
}
