//! Data model for the server configuration file.

use std::sync::Arc;
use std::time::Duration;

use dssmcp_api::{ApiKey, ClientOptions, CredentialStrategy, ForwardedBearer, StaticApiKey, TlsPolicy};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";

/// How MCP clients reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Streamable HTTP at `/mcp`; each caller forwards its own API key.
    #[default]
    Http,
    /// Standard input/output for a single local client.
    Stdio,
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    /// Base URL of the platform, for example `https://dss.example.com:11200`.
    #[serde(default)]
    pub dss_url: String,
    #[serde(default)]
    pub transport: Transport,
    /// Socket address for the HTTP transport.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Allow the HTTP transport to listen on a non-loopback address.
    #[serde(default)]
    pub allow_non_loopback: bool,
    /// API key used by the stdio transport. Ignored over HTTP.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Accept self-signed or otherwise invalid platform certificates.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_job_poll_interval_millis")]
    pub job_poll_interval_millis: u64,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_job_poll_interval_millis() -> u64 {
    2000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dss_url: String::new(),
            transport: Transport::default(),
            bind_address: default_bind_address(),
            allow_non_loopback: false,
            api_key: None,
            insecure_skip_tls_verify: false,
            request_timeout_secs: default_request_timeout_secs(),
            job_poll_interval_millis: default_job_poll_interval_millis(),
        }
    }
}

impl ServerConfig {
    pub fn tls_policy(&self) -> TlsPolicy {
        if self.insecure_skip_tls_verify {
            TlsPolicy::AcceptInvalidCerts
        } else {
            TlsPolicy::Verify
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            tls: self.tls_policy(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_millis(self.job_poll_interval_millis),
        }
    }

    /// Credential strategy matching the transport: HTTP callers forward their
    /// own key, the stdio transport uses the configured one.
    pub fn credential_strategy(&self) -> Arc<dyn CredentialStrategy> {
        match self.transport {
            Transport::Http => Arc::new(ForwardedBearer),
            Transport::Stdio => {
                let key = self.api_key.as_deref().and_then(|key| ApiKey::new(key).ok());
                Arc::new(StaticApiKey::new(key))
            }
        }
    }

    /// Layer explicitly provided values over this configuration.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dss_url) = overrides.dss_url {
            self.dss_url = dss_url;
        }
        if let Some(transport) = overrides.transport {
            self.transport = transport;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.bind_address = bind_address;
        }
        if overrides.allow_non_loopback {
            self.allow_non_loopback = true;
        }
        if let Some(api_key) = overrides.api_key {
            self.api_key = Some(api_key);
        }
        if overrides.insecure_skip_tls_verify {
            self.insecure_skip_tls_verify = true;
        }
        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(interval) = overrides.job_poll_interval_millis {
            self.job_poll_interval_millis = interval;
        }
    }
}

/// Values supplied on the command line or through the environment.
///
/// Boolean switches can only turn a setting on.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dss_url: Option<String>,
    pub transport: Option<Transport>,
    pub bind_address: Option<String>,
    pub allow_non_loopback: bool,
    pub api_key: Option<String>,
    pub insecure_skip_tls_verify: bool,
    pub request_timeout_secs: Option<u64>,
    pub job_poll_interval_millis: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_defaults_fill_missing_fields() {
        let config: ServerConfig = serde_json::from_str(r#"{"dssUrl": "https://dss.example.com"}"#).expect("config");
        assert_eq!(config.bind_address, "127.0.0.1:8000");
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.tls_policy(), TlsPolicy::Verify);
        assert_eq!(config.client_options().poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(serde_json::from_str::<ServerConfig>(r#"{"dssURL": "x"}"#).is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = ServerConfig {
            dss_url: "https://old.example.com".into(),
            ..ServerConfig::default()
        };
        config.apply_overrides(ConfigOverrides {
            dss_url: Some("https://new.example.com".into()),
            transport: Some(Transport::Stdio),
            insecure_skip_tls_verify: true,
            ..ConfigOverrides::default()
        });
        assert_eq!(config.dss_url, "https://new.example.com");
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.tls_policy(), TlsPolicy::AcceptInvalidCerts);
    }

    #[test]
    fn api_key_is_never_serialized() {
        let config = ServerConfig {
            api_key: Some("secret".into()),
            ..ServerConfig::default()
        };
        let rendered = serde_json::to_string(&config).expect("json");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn strategy_follows_transport() {
        let mut config = ServerConfig::default();
        assert_eq!(config.credential_strategy().name(), "forwarded-bearer");
        config.transport = Transport::Stdio;
        assert_eq!(config.credential_strategy().name(), "static-api-key");
    }
}
