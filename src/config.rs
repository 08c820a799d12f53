use crate::period::RangePolicy;
use std::{env, net::SocketAddr, path::PathBuf};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a port number, got '{0}'")]
    InvalidPort(String),
    #[error("APP_INVALID_RANGE must be 'fallback' or 'reject', got '{0}'")]
    InvalidRangePolicy(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub range_policy: RangePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => DEFAULT_PORT,
        };

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let range_policy = match lookup("APP_INVALID_RANGE").as_deref().map(str::trim) {
            None | Some("") | Some("fallback") => RangePolicy::Fallback,
            Some("reject") => RangePolicy::Reject,
            Some(other) => return Err(ConfigError::InvalidRangePolicy(other.to_string())),
        };

        Ok(Self {
            port,
            data_path,
            range_policy,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
