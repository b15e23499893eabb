use crate::error::{ParalonError, Result};
use std::env;
use std::fs;

#[derive(Debug, Clone)]
pub struct ParalonConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

impl Default for ParalonConfig {
    fn default() -> Self {
        ParalonConfig {
            api_key: None,
            api_base: Some("https://paraloncloud.com/v1".to_string()),
        }
    }
}

impl ParalonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("PARALON_API_KEY").ok();
        let api_base = env::var("PARALON_API_BASE")
            .ok()
            .or_else(|| Some("https://paraloncloud.com/v1".to_string()));

        ParalonConfig { api_key, api_base }
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Fails fast when credentials or the base URL are missing so that no
    /// request is ever routed to a half-configured client.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().map_or(true, |k| k.is_empty()) {
            return Err(ParalonError::ConfigError(
                "PARALON_API_KEY not found in environment variables".into(),
            ));
        }
        if self.api_base.as_deref().map_or(true, |b| b.is_empty()) {
            return Err(ParalonError::ConfigError(
                "PARALON_API_BASE not found in environment variables".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub generated_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            upload_dir: "uploads".to_string(),
            generated_dir: "generated".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let generated_dir = env::var("GENERATED_DIR").unwrap_or_else(|_| "generated".to_string());

        StorageConfig {
            upload_dir,
            generated_dir,
        }
    }

    pub fn with_dirs(
        mut self,
        upload_dir: impl Into<String>,
        generated_dir: impl Into<String>,
    ) -> Self {
        self.upload_dir = upload_dir.into();
        self.generated_dir = generated_dir.into();
        self
    }

    /// Creates both storage roots. Called once at startup.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.upload_dir)?;
        fs::create_dir_all(&self.generated_dir)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub paralon: ParalonConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            paralon: ParalonConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());

        Config {
            port,
            paralon: ParalonConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_paralon(mut self, config: ParalonConfig) -> Self {
        self.paralon = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_missing_key() {
        let config = ParalonConfig::new().with_base_url("http://localhost:9999");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ParalonError::ConfigError(_)));
    }

    #[test]
    fn test_validate_rejects_empty_base() {
        let config = ParalonConfig::new()
            .with_credentials("sk-test")
            .with_base_url("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_full_config() {
        let config = ParalonConfig::new()
            .with_credentials("sk-test")
            .with_base_url("http://localhost:9999");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_base_url() {
        let config = ParalonConfig::default();
        assert_eq!(
            config.api_base.as_deref(),
            Some("https://paraloncloud.com/v1")
        );
    }
}
