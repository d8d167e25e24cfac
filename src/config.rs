//! Server configuration parsed from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 32;
pub const DEFAULT_HUB_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Outbound snapshots buffered per client before it is dropped as slow.
    pub client_queue_capacity: usize,
    /// Commands buffered in front of the hub task.
    pub hub_queue_capacity: usize,
    /// Heartbeat ping interval. `None` disables heartbeats.
    pub ping_interval: Option<Duration>,
    /// Largest inbound websocket frame or message accepted.
    pub max_message_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
            hub_queue_capacity: DEFAULT_HUB_QUEUE_CAPACITY,
            ping_interval: Some(Duration::from_secs(DEFAULT_PING_INTERVAL_SECS)),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl Config {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `HOST`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `CLIENT_QUEUE_CAPACITY`: default 32, must be >= 1
    /// - `HUB_QUEUE_CAPACITY`: default 1024, must be >= 1
    /// - `WS_PING_INTERVAL_SECS`: default 30, `0` disables heartbeats
    /// - `WS_MAX_MESSAGE_BYTES`: default 65536, must be >= 1
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let ping_secs = env_parse("WS_PING_INTERVAL_SECS", DEFAULT_PING_INTERVAL_SECS)?;

        Ok(Self {
            host: env_parse("HOST", defaults.host)?,
            port: env_parse("PORT", defaults.port)?,
            client_queue_capacity: env_parse_nonzero("CLIENT_QUEUE_CAPACITY", defaults.client_queue_capacity)?,
            hub_queue_capacity: env_parse_nonzero("HUB_QUEUE_CAPACITY", defaults.hub_queue_capacity)?,
            ping_interval: (ping_secs > 0).then(|| Duration::from_secs(ping_secs)),
            max_message_bytes: env_parse_nonzero("WS_MAX_MESSAGE_BYTES", defaults.max_message_bytes)?,
        })
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_parse<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

fn env_parse_nonzero(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    let n = env_parse(var, default)?;
    if n == 0 {
        return Err(ConfigError::Invalid { var, value: n.to_string() });
    }
    Ok(n)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
