// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{env, path::PathBuf};

use config::{Config, Environment, File, Source};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "pika-blast";
pub const ENV_PREFIX: &str = "PIKA";
pub const PRODUCTION: &str = "production";

/// Runtime settings for the server and the companion client.
///
/// Layering, lowest to highest precedence: field defaults, optional
/// `pika-blast.{toml,json,yaml}`, `PIKA_*` variables (`__` separates nested
/// keys, e.g. `PIKA_LOGGING__DIR`), then the bare `PORT` and `NODE_ENV`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_node_env")]
    pub node_env: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub intensity: IntensityWeights,
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_node_env() -> String {
    "development".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            node_env: default_node_env(),
            static_dir: default_static_dir(),
            logging: LoggingConfig::default(),
            intensity: IntensityWeights::default(),
            client: ClientConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// IANA zone used for line timestamps and file dates.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_timezone() -> String {
    "America/Los_Angeles".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            timezone: default_timezone(),
        }
    }
}

/// Sampling weights per intensity. Must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityWeights {
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_extreme")]
    pub extreme: f64,
}

fn default_low() -> f64 {
    0.4
}

fn default_medium() -> f64 {
    0.3
}

fn default_high() -> f64 {
    0.2
}

fn default_extreme() -> f64 {
    0.1
}

impl IntensityWeights {
    /// Weights in sampling order (low, medium, high, extreme).
    pub fn as_array(&self) -> [f64; 4] {
        [self.low, self.medium, self.high, self.extreme]
    }
}

impl Default for IntensityWeights {
    fn default() -> Self {
        Self {
            low: default_low(),
            medium: default_medium(),
            high: default_high(),
            extreme: default_extreme(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(
            File::with_name(CONFIG_FILE).required(false),
            env::var("PORT").ok(),
            env::var("NODE_ENV").ok(),
        )
    }

    /// Builds the layered config from an explicit file source and the values
    /// of the bare `PORT` / `NODE_ENV` overrides.
    pub fn load_with<S>(
        file: S,
        port: Option<String>,
        node_env: Option<String>,
    ) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("port", port)?
            .set_override_option("node_env", node_env)?
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: "must not be empty".to_string(),
            });
        }
        if self.logging.timezone.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "logging.timezone",
                reason: "must not be empty".to_string(),
            });
        }
        if self.client.server_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "client.server_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.node_env == PRODUCTION
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
