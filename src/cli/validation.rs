//! CLI argument validation functions

use std::fs;
use std::path::PathBuf;

/// Longest key memcached accepts
const MAX_KEY_LEN: usize = 250;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!(
            "Cannot read configuration file '{}': {}",
            path_str, e
        )),
    }
}

/// Keys must be non-empty, at most 250 bytes, and free of whitespace and
/// control characters so they are valid on every backend.
pub fn validate_key(key: &str) -> Result<String, String> {
    if key.is_empty() {
        return Err("Key cannot be empty".to_string());
    }

    if key.len() > MAX_KEY_LEN {
        return Err(format!(
            "Key is {} bytes long, the limit is {}",
            key.len(),
            MAX_KEY_LEN
        ));
    }

    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("Key cannot contain whitespace or control characters".to_string());
    }

    Ok(key.to_string())
}

/// Validate a TTL is a non-negative number of seconds
pub fn validate_ttl_seconds(seconds_str: &str) -> Result<u64, String> {
    seconds_str.parse::<u64>().map_err(|_| {
        format!(
            "TTL must be a non-negative number of seconds, got: '{}'",
            seconds_str
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_config_file_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[store]").unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(validate_config_file_path(path).unwrap(), file.path());

        assert!(validate_config_file_path("/nonexistent/kv-ttl.toml").is_err());

        let dir = tempfile::tempdir().unwrap();
        let err = validate_config_file_path(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.contains("not a file"));
    }

    #[test]
    fn test_validate_key() {
        assert_eq!(validate_key("user:42").unwrap(), "user:42");
        assert!(validate_key("").is_err());
        assert!(validate_key("a b").is_err());
        assert!(validate_key("tab\tkey").is_err());
        assert!(validate_key(&"k".repeat(250)).is_ok());
        assert!(validate_key(&"k".repeat(251)).is_err());
    }

    #[test]
    fn test_validate_ttl_seconds() {
        assert_eq!(validate_ttl_seconds("0").unwrap(), 0);
        assert_eq!(validate_ttl_seconds("3600").unwrap(), 3600);
        assert!(validate_ttl_seconds("-1").is_err());
        assert!(validate_ttl_seconds("soon").is_err());
    }
}
