use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::logging::LogFormat;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub static_dir: PathBuf,
    pub shutdown_grace: Duration,
    pub log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("SHUTDOWN_GRACE_SECS must be a non-negative integer")]
    InvalidShutdownGrace,
    #[error("LOG_FORMAT must be one of: compact, json")]
    InvalidLogFormat,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = value("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let bind_port = value("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);
        let static_dir = value("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./static"));
        let shutdown_grace = value("SHUTDOWN_GRACE_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidShutdownGrace)
            })
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let log_format = value("LOG_FORMAT")
            .map(|value| {
                value
                    .parse::<LogFormat>()
                    .map_err(|_| ConfigError::InvalidLogFormat)
            })
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            bind_addr,
            bind_port,
            static_dir,
            shutdown_grace,
            log_format,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}
