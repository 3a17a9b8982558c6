//! Configuration module - environment variable parsing

use std::env;

/// Ports probed in order when PORT is not set.
pub const DEFAULT_PORTS: [u16; 4] = [7373, 7374, 7375, 7376];

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Explicit listening port; None means probe the default range
    pub port: Option<u16>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Override path to the game page asset
    pub page_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?),
            Err(_) => None,
        };

        Ok(Self {
            port,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            page_path: env::var("ARENA_PAGE").ok(),
        })
    }

    /// Ports to try binding, in order. An explicit PORT wins outright.
    pub fn candidate_ports(&self) -> Vec<u16> {
        match self.port {
            Some(port) => vec![port],
            None => DEFAULT_PORTS.to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_port_wins_over_probe_range() {
        let config = Config {
            port: Some(9000),
            log_level: "info".to_string(),
            page_path: None,
        };
        assert_eq!(config.candidate_ports(), vec![9000]);
    }

    #[test]
    fn missing_port_probes_defaults() {
        let config = Config {
            port: None,
            log_level: "info".to_string(),
            page_path: None,
        };
        assert_eq!(config.candidate_ports(), DEFAULT_PORTS.to_vec());
    }
}
