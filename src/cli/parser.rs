//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Environment as AppEnvironment;

/// Key-value operations with emulated TTLs over memcached, Redis or memory
#[derive(Parser, Debug)]
#[command(name = "kv-ttl")]
#[command(about = "Key-value operations with emulated TTLs")]
#[command(long_about = "
kv-ttl runs single key-value operations against the configured backend.
Memcached cannot report how long a key has left to live, so `expire` stores
the write time and duration next to the value and `ttl` reads them back.

EXAMPLES:
    # Store a value and give it 30 seconds to live
    kv-ttl set session abc123
    kv-ttl expire session 30

    # Seconds left before the key expires
    kv-ttl ttl session

    # Drop the timeout again
    kv-ttl persist session

    # Use a specific configuration file
    kv-ttl --config /etc/kv-ttl/production.toml has session

    # Validate configuration without touching the backend
    kv-ttl check
")]
#[command(version = crate::build::CLAP_LONG_VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Loads this TOML file instead of the layered `config/` directory.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Picks which `{environment}.toml` is layered over `default.toml`.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the raw value stored under KEY
    Get {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Store VALUE under KEY with no expiry
    Set {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
        value: String,
    },
    /// Remove KEY
    Delete {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Give KEY a time to live in seconds
    Expire {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
        #[arg(value_parser = super::validation::validate_ttl_seconds)]
        seconds: u64,
    },
    /// Print the seconds KEY has left to live
    Ttl {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Remove the timeout on KEY
    Persist {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Print whether KEY exists
    Has {
        #[arg(value_parser = super::validation::validate_key)]
        key: String,
    },
    /// Remove every key owned by the backend
    Flush,
    /// Validate configuration and exit
    Check,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "production", alias = "prod")]
    Production,
    #[value(name = "test")]
    Test,
}

impl From<Environment> for AppEnvironment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => AppEnvironment::Development,
            Environment::Production => AppEnvironment::Production,
            Environment::Test => AppEnvironment::Test,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expire() {
        let cli = Cli::try_parse_from(["kv-ttl", "expire", "session", "30"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Expire {
                key: "session".to_string(),
                seconds: 30
            }
        );
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["kv-ttl", "--env", "prod", "-v", "has", "a"]).unwrap();
        assert_eq!(cli.env, Some(Environment::Production));
        assert!(cli.verbose);
        assert_eq!(cli.command, Commands::Has { key: "a".to_string() });
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["kv-ttl", "-v", "-q", "check"]).is_err());
    }

    #[test]
    fn test_rejects_key_with_space() {
        assert!(Cli::try_parse_from(["kv-ttl", "get", "bad key"]).is_err());
    }

    #[test]
    fn test_rejects_negative_ttl() {
        assert!(Cli::try_parse_from(["kv-ttl", "expire", "a", "-5"]).is_err());
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["kv-ttl"]).is_err());
    }

    #[test]
    fn test_environment_conversion() {
        assert_eq!(
            AppEnvironment::from(Environment::Test),
            AppEnvironment::Test
        );
    }
}
