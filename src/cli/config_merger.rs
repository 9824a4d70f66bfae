//! Merges CLI argument overrides into file-based configuration.

use std::path::Path;

use super::parser::Cli;
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment as AppEnvironment, settings::Settings};

/// Applies CLI overrides on top of loaded settings. CLI flags win.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration from `config_path`, or from the layered
    /// loader when no path is given.
    pub fn load(
        config_path: Option<&Path>,
        environment: Option<AppEnvironment>,
    ) -> Result<Self, ConfigError> {
        let loader = match config_path {
            Some(path) => ConfigLoader::from_file(path),
            None => ConfigLoader::new()?,
        };
        let loader = match environment {
            Some(env) => loader.with_environment(env),
            None => loader,
        };

        Ok(Self::new(loader.load()?))
    }

    /// Apply CLI flags and re-validate.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
