//! Configuration validation.

use std::net::SocketAddr;

use dssmcp_api::validate_base_url;
use thiserror::Error;
use tracing::debug;

use crate::config::{ServerConfig, Transport};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the platform URL is required (set dssUrl, --dss-url or DSS_URL)")]
    MissingDssUrl,
    #[error("invalid platform URL: {reason}")]
    InvalidDssUrl { reason: String },
    #[error("invalid bind address '{address}': {reason}")]
    InvalidBindAddress { address: String, reason: String },
    #[error("refusing to bind to non-loopback address {address}; set allowNonLoopback to expose the server")]
    NonLoopbackBind { address: SocketAddr },
    #[error("the stdio transport requires an API key (set apiKey, --api-key or DSS_API_KEY)")]
    MissingApiKey,
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Validate the configuration for the selected transport.
pub fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.dss_url.trim().is_empty() {
        return Err(ConfigError::MissingDssUrl);
    }
    validate_base_url(config.dss_url.trim()).map_err(|error| ConfigError::InvalidDssUrl { reason: error.to_string() })?;

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::ZeroDuration {
            field: "requestTimeoutSecs",
        });
    }
    if config.job_poll_interval_millis == 0 {
        return Err(ConfigError::ZeroDuration {
            field: "jobPollIntervalMillis",
        });
    }

    match config.transport {
        Transport::Http => {
            config.http_bind_address()?;
        }
        Transport::Stdio => {
            if config.api_key.as_deref().is_none_or(|key| key.trim().is_empty()) {
                return Err(ConfigError::MissingApiKey);
            }
        }
    }
    debug!(transport = ?config.transport, "validated server configuration");
    Ok(())
}

impl ServerConfig {
    /// Socket address for the HTTP transport, refusing non-loopback
    /// addresses unless they were explicitly allowed.
    pub fn http_bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let address = parse_bind_address(&self.bind_address)?;
        if !self.allow_non_loopback && !address.ip().is_loopback() {
            return Err(ConfigError::NonLoopbackBind { address });
        }
        Ok(address)
    }
}

pub(crate) fn parse_bind_address(address: &str) -> Result<SocketAddr, ConfigError> {
    address.parse().map_err(|error: std::net::AddrParseError| ConfigError::InvalidBindAddress {
        address: address.to_string(),
        reason: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_config() -> ServerConfig {
        ServerConfig {
            dss_url: "https://dss.example.com:11200".into(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn accepts_default_http_config() {
        assert_eq!(validate_config(&http_config()), Ok(()));
    }

    #[test]
    fn requires_platform_url() {
        let config = ServerConfig::default();
        assert_eq!(validate_config(&config), Err(ConfigError::MissingDssUrl));
        let config = ServerConfig {
            dss_url: "dss.example.com".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(validate_config(&config), Err(ConfigError::InvalidDssUrl { .. })));
    }

    #[test]
    fn non_loopback_bind_requires_opt_in() {
        let mut config = http_config();
        config.bind_address = "0.0.0.0:8000".into();
        assert!(matches!(validate_config(&config), Err(ConfigError::NonLoopbackBind { .. })));
        config.allow_non_loopback = true;
        assert_eq!(validate_config(&config), Ok(()));
        config.bind_address = "localhost".into();
        assert!(matches!(validate_config(&config), Err(ConfigError::InvalidBindAddress { .. })));
    }

    #[test]
    fn stdio_requires_api_key() {
        let mut config = http_config();
        config.transport = Transport::Stdio;
        assert_eq!(validate_config(&config), Err(ConfigError::MissingApiKey));
        config.api_key = Some("key".into());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn rejects_zero_durations() {
        let mut config = http_config();
        config.job_poll_interval_millis = 0;
        assert!(matches!(validate_config(&config), Err(ConfigError::ZeroDuration { .. })));
    }
}
