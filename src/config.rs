//! Configuration management module
//!
//! `AppConfig` is read from YAML, then environment overrides are applied on
//! top. Every section falls back to its defaults when omitted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use action_locator::{ResolverDefaults, RetryOptions, StrategyKind};
use action_primitives::WaitOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const ENV_CATALOG: &str = "STEADYHAND_CATALOG";
pub const ENV_TIMEOUT_MS: &str = "STEADYHAND_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "STEADYHAND_MAX_RETRIES";
pub const ENV_SELF_HEALING: &str = "STEADYHAND_SELF_HEALING";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Resolver defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub default_timeout_ms: u64,
    pub throw_on_not_found: bool,
    pub self_healing: bool,
    pub default_strategy: StrategyKind,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: action_locator::DEFAULT_TIMEOUT_MS,
            throw_on_not_found: true,
            self_healing: true,
            default_strategy: StrategyKind::First,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let defaults = RetryOptions::default();
        Self {
            max_retries: defaults.max_retries,
            delay_ms: defaults.delay_ms,
        }
    }
}

/// Polling used by assertions and explicit waits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitingConfig {
    pub poll_interval_ms: u64,
    pub default_timeout_ms: u64,
}

impl Default for WaitingConfig {
    fn default() -> Self {
        let defaults = WaitOptions::default();
        Self {
            poll_interval_ms: defaults.poll_interval_ms,
            default_timeout_ms: defaults.timeout_ms,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub locator: LocatorConfig,
    pub retry: RetryConfig,
    pub waiting: WaitingConfig,
    /// Selector catalog used for logical keys
    pub catalog_path: Option<PathBuf>,
}

impl AppConfig {
    /// `<config_dir>/steadyhand/config.yaml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push("steadyhand");
        path.push("config.yaml");
        Ok(path)
    }

    pub fn from_yaml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file at `path` (or the default location). A missing file
    /// yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            warn!("Config file not found, using defaults: {}", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw, &path)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load, apply process environment overrides, then validate.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `STEADYHAND_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_CATALOG).filter(|v| !v.trim().is_empty()) {
            info!("Using selector catalog from {}: {}", ENV_CATALOG, path);
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.locator.default_timeout_ms = parse_env(ENV_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            self.retry.max_retries = parse_env(ENV_MAX_RETRIES, &value)?;
        }
        if let Some(value) = lookup(ENV_SELF_HEALING) {
            self.locator.self_healing = parse_flag(ENV_SELF_HEALING, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locator.default_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "locator.default_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.waiting.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "waiting.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_retries == 0 {
            warn!("retry.max_retries is 0; actions will still be attempted once");
        }
        Ok(())
    }

    pub fn resolver_defaults(&self) -> ResolverDefaults {
        ResolverDefaults {
            strategy: self.locator.default_strategy,
            timeout: Duration::from_millis(self.locator.default_timeout_ms),
            throw_on_not_found: self.locator.throw_on_not_found,
            self_healing: self.locator.self_healing,
        }
    }

    pub fn retry_options(&self) -> RetryOptions {
        RetryOptions::new(self.retry.max_retries, self.retry.delay_ms)
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            poll_interval_ms: self.waiting.poll_interval_ms,
            timeout_ms: self.waiting.default_timeout_ms,
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}
