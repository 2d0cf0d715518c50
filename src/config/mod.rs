// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::http::ServerConfig;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
pub const TEST: &str = "test";

const DEFAULT_SERVER_ADDRESS: &str = "localhost:8080";
const DEFAULT_HEALTHZ_ADDRESS: &str = ":8081";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown log format {0:?}, expected \"json\" or \"text\"")]
    InvalidLogFormat(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("server and healthz must listen on different addresses, both use {0:?}")]
    SameAddress(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "app", default)]
    pub app: AppBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppBox {
    pub env: String,
    pub logs: Logs,
    pub server: ServerConfig,
    pub healthz: ServerConfig,
    #[serde(rename = "start_timeout", with = "humantime_serde")]
    pub start_timeout: Duration,
    #[serde(rename = "stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,
}

impl Default for AppBox {
    fn default() -> Self {
        Self {
            env: PROD.to_string(),
            logs: Logs::default(),
            server: ServerConfig::new(DEFAULT_SERVER_ADDRESS),
            healthz: ServerConfig::new(DEFAULT_HEALTHZ_ADDRESS),
            start_timeout: DEFAULT_TIMEOUT,
            stop_timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Logs {
    pub level: String,
    pub format: LogFormat,
}

impl Default for Logs {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::Text => "text",
        })
    }
}

pub trait ConfigTrait {
    fn logs(&self) -> &Logs;
    fn is_prod(&self) -> bool;
    fn is_test(&self) -> bool;
    fn server(&self) -> &ServerConfig;
    fn healthz(&self) -> &ServerConfig;
    fn start_timeout(&self) -> Duration;
    fn stop_timeout(&self) -> Duration;
}

impl ConfigTrait for Config {
    fn logs(&self) -> &Logs {
        &self.app.logs
    }

    fn is_prod(&self) -> bool {
        self.app.env == PROD
    }

    fn is_test(&self) -> bool {
        self.app.env == TEST
    }

    fn server(&self) -> &ServerConfig {
        &self.app.server
    }

    fn healthz(&self) -> &ServerConfig {
        &self.app.healthz
    }

    fn start_timeout(&self) -> Duration {
        self.app.start_timeout
    }

    fn stop_timeout(&self) -> Duration {
        self.app.stop_timeout
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        // Read file
        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        let cfg = Self::from_yaml(&data).with_context(|| format!("config {:?}", abs_path))?;
        Ok(cfg)
    }

    /// Parses and validates configuration from YAML text.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data).context("unmarshal yaml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.start_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("start_timeout"));
        }
        if self.app.stop_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("stop_timeout"));
        }
        // port 0 asks the OS for a free port, so it never collides
        if self.app.server.address == self.app.healthz.address
            && !self.app.server.address.ends_with(":0")
        {
            return Err(ConfigError::SameAddress(self.app.server.address.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod test_config;
