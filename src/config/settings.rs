//! Application settings and configuration
//!
//! Settings are layered: built-in defaults, then an optional `orbitus.toml`,
//! then `ORBITUS_*` environment variables (a `.env` file is loaded first).

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::services::client_pool::{
    PoolConfig, DEFAULT_IDLE_THRESHOLD_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SWEEP_INTERVAL_MS,
};
use crate::services::graphql::{CachePolicy, CredentialMode};
use crate::utils::redact_secret;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "orbitus.toml";

/// Prefix of environment overrides, e.g. `ORBITUS_API_URL`
pub const ENV_PREFIX: &str = "ORBITUS";

/// Template written by `orbitus init`
pub const CONFIG_TEMPLATE: &str = r#"# orbitus configuration

# Base URL of the GraphQL server; /graphql and /graphql/system are derived from it
api_url = "https://example.com"

# Token used by `orbitus query` when no --token is given
admin_token = ""

# Pooled clients unused for this long are released (milliseconds)
idle_threshold_ms = 1800000

# How often idle clients are looked for (milliseconds)
sweep_interval_ms = 300000

# no-cache, cache-first, cache-only, network-only, standby or cache-and-network
default_cache_policy = "cache-first"

# include or omit
credential_mode = "include"

request_timeout_seconds = 30

log_level = "info"
"#;

/// Main application settings
#[derive(Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    #[serde(skip_deserializing, default = "package_version")]
    pub app_version: String,
    pub log_level: String,

    // GraphQL server
    pub api_url: Option<String>,
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,

    // Client pool
    pub idle_threshold_ms: u64,
    pub sweep_interval_ms: u64,
    pub default_cache_policy: CachePolicy,
    pub credential_mode: CredentialMode,
    pub request_timeout_seconds: u64,
}

impl Settings {
    /// Load settings from `.env`, the config file and the environment
    ///
    /// `config_path` must exist when given; otherwise `orbitus.toml` in the
    /// working directory is used if present.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_sources(config_path, None)
    }

    /// Build settings from explicit sources
    ///
    /// `env` replaces the process environment when given.
    pub fn from_sources(
        config_path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let file = match config_path {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("app_name", env!("CARGO_PKG_NAME"))?
            .set_default("log_level", "info")?
            .set_default("idle_threshold_ms", DEFAULT_IDLE_THRESHOLD_MS as i64)?
            .set_default("sweep_interval_ms", DEFAULT_SWEEP_INTERVAL_MS as i64)?
            .set_default("default_cache_policy", CachePolicy::default().to_string())?
            .set_default("credential_mode", CredentialMode::default().to_string())?
            .set_default("request_timeout_seconds", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms == 0 {
            anyhow::bail!("sweep_interval_ms must be > 0");
        }
        if self.request_timeout_seconds == 0 {
            anyhow::bail!("request_timeout_seconds must be > 0");
        }
        Ok(())
    }

    /// The configured GraphQL server URL, for commands that talk to it
    pub fn require_api_url(&self) -> Result<&str> {
        match self.api_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => anyhow::bail!(
                "api_url is not configured; set it in {} or {}_API_URL",
                DEFAULT_CONFIG_FILE,
                ENV_PREFIX
            ),
        }
    }

    /// Admin token, with an empty value treated as unset
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Client pool configuration derived from these settings
    pub fn pool_config(&self) -> Result<PoolConfig> {
        Ok(PoolConfig::new(self.require_api_url()?)
            .with_idle_threshold(Duration::from_millis(self.idle_threshold_ms))
            .with_sweep_interval(Duration::from_millis(self.sweep_interval_ms))
            .with_cache_policy(self.default_cache_policy)
            .with_credential_mode(self.credential_mode)
            .with_request_timeout(Duration::from_secs(self.request_timeout_seconds)))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: package_version(),
            log_level: "info".to_string(),
            api_url: None,
            admin_token: None,
            idle_threshold_ms: DEFAULT_IDLE_THRESHOLD_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            default_cache_policy: CachePolicy::default(),
            credential_mode: CredentialMode::default(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field("log_level", &self.log_level)
            .field("api_url", &self.api_url)
            .field("admin_token", &self.admin_token.as_deref().map(redact_secret))
            .field("idle_threshold_ms", &self.idle_threshold_ms)
            .field("sweep_interval_ms", &self.sweep_interval_ms)
            .field("default_cache_policy", &self.default_cache_policy)
            .field("credential_mode", &self.credential_mode)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

fn package_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
