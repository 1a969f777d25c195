//! # Configuration Management Module
//!
//! Centralized configuration for the EcoQuest core with validation, defaults,
//! and persistence.
//!
//! ## Configuration Structure
//!
//! - [`AppConfig`] - App identity and local data directory
//! - [`RemoteConfig`] - Remote EcoQuest service endpoint and timeouts
//! - [`SecurityConfig`] - Password hashing parameters
//! - [`LoggingConfig`] - Logging settings
//!
//! ## Configuration File Format
//!
//! ```toml
//! [app]
//! name = "EcoQuest"
//! data_dir = "data"
//!
//! [remote]
//! enabled = true
//! base_url = "http://localhost:8000/api"
//! timeout_seconds = 5
//! health_timeout_seconds = 2
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    /// Directory holding the sled profile store.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// When false, every operation is served by the local store directly.
    pub enabled: bool,
    /// Base URL of the remote EcoQuest API, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    /// Request timeout in seconds; a timed-out call counts as unavailable.
    pub timeout_seconds: u64,
    /// Short timeout for the optional `/health` liveness probe.
    #[serde(default = "default_health_timeout")]
    pub health_timeout_seconds: u64,
}

fn default_health_timeout() -> u64 {
    2
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8000/api".to_string(),
            timeout_seconds: 5,
            health_timeout_seconds: default_health_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Argon2Config {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub time_cost: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub argon2: Option<Argon2Config>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                name: "EcoQuest".to_string(),
                data_dir: "data".to_string(),
            },
            remote: RemoteConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.app.data_dir.trim().is_empty() {
            return Err(anyhow!("app.data_dir must not be empty"));
        }
        if self.remote.enabled {
            if self.remote.base_url.trim().is_empty() {
                return Err(anyhow!("remote.base_url must not be empty when remote is enabled"));
            }
            if self.remote.timeout_seconds == 0 {
                return Err(anyhow!("remote.timeout_seconds must be greater than zero"));
            }
        }
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(anyhow!("invalid logging.level '{}'", other)),
        }
    }

    /// Build Argon2 params from the security section, if any were set.
    pub fn argon2_params(&self) -> Result<Option<argon2::Params>> {
        let Some(cfg) = &self.security.argon2 else {
            return Ok(None);
        };
        let defaults = argon2::Params::default();
        let params = argon2::Params::new(
            cfg.memory_kib.unwrap_or(defaults.m_cost()),
            cfg.time_cost.unwrap_or(defaults.t_cost()),
            cfg.parallelism.unwrap_or(defaults.p_cost()),
            None,
        )
        .map_err(|e| anyhow!("invalid argon2 parameters: {}", e))?;
        Ok(Some(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn default_round_trips_through_toml() {
        let toml_text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&toml_text).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.remote.timeout_seconds, 5);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [app]
            name = "EcoQuest"
            data_dir = "data"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert!(parsed.remote.enabled);
        assert_eq!(parsed.remote.health_timeout_seconds, 2);
        assert!(parsed.security.argon2.is_none());
    }

    #[test]
    fn bad_logging_level_is_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn argon2_overrides_build_params() {
        let mut config = Config::default();
        config.security.argon2 = Some(Argon2Config {
            memory_kib: Some(8192),
            time_cost: Some(2),
            parallelism: Some(1),
        });
        let params = config.argon2_params().unwrap().unwrap();
        assert_eq!(params.m_cost(), 8192);
        assert_eq!(params.t_cost(), 2);
        assert_eq!(params.p_cost(), 1);
    }
}
