use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::debug;
use validator::Validate;

use crate::domain::csv::ReaderConfig;
use crate::domain::error::{ReaderError, Result};

/// Environment variable prefix, e.g. `CSVLOOP_LOOP=true`
pub const ENV_PREFIX: &str = "CSVLOOP_";

/// Loads `ReaderConfig` from defaults, an optional TOML file and the environment
pub struct ConfigService {
    env_prefix: String,
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Later layers win: defaults, then `path`, then environment variables.
    ///
    /// Only the process environment is read; loading a `.env` file is left to
    /// the binary entry point. An explicit `path` that does not exist is an error.
    pub fn load(&self, path: Option<&Path>) -> Result<ReaderConfig> {
        let mut figment = Figment::from(Serialized::defaults(ReaderConfig::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ReaderError::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: ReaderConfig = figment
            .merge(Env::prefixed(&self.env_prefix))
            .extract()
            .map_err(|e| ReaderError::Config(e.to_string()))?;
        config.validate()?;

        debug!(?config, "Loaded reader config");
        Ok(config)
    }
}
