mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            providers: ProvidersConfig::default(),
            retry: RetryConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the given path, or fall back to built-in defaults when no
    /// config file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.enabled().is_empty() {
            return Err(ConfigError::NoProvidersEnabled);
        }

        // An explicitly-written provider block may leave model/api_key_env
        // blank; reject that before it turns into a confusing upstream 404.
        for (id, provider) in self.providers.enabled() {
            if provider.model.is_empty() {
                return Err(ConfigError::IncompleteProvider {
                    provider: id.to_string(),
                    field: "model".to_string(),
                });
            }
            if provider.api_key_env.is_empty() {
                return Err(ConfigError::IncompleteProvider {
                    provider: id.to_string(),
                    field: "api_key_env".to_string(),
                });
            }
        }

        Ok(())
    }
}
