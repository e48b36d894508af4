//! Credential resolution and per-call client construction.
//!
//! Every tool invocation acts with exactly one caller's API key. A
//! [`CredentialStrategy`] decides where that key comes from: the HTTP
//! transport forwards the caller's `Authorization: Bearer` header, the stdio
//! transport uses a key configured at startup. [`DssConnector`] combines the
//! strategy with the connection settings and hands out a fresh [`DssClient`]
//! for each call, so no credential outlives the call that presented it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::warn;

use crate::client::DssClient;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("missing credential: no Authorization header was sent; expected 'Authorization: Bearer <api key>'")]
    MissingHeader,
    #[error("missing credential: the Authorization header must use the Bearer scheme")]
    MalformedHeader,
    #[error("missing credential: the bearer token is empty")]
    EmptyToken,
    #[error("missing credential: no API key is configured for this transport")]
    NotConfigured,
}

/// A platform API key. The value never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Result<Self, CredentialError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::EmptyToken);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Source of the API key used for a single tool call.
pub trait CredentialStrategy: Send + Sync + fmt::Debug {
    /// Resolve the key for a call; `headers` are the inbound HTTP headers when
    /// the call arrived over HTTP.
    fn resolve(&self, headers: Option<&HeaderMap>) -> Result<ApiKey, CredentialError>;

    fn name(&self) -> &'static str;
}

/// Use the bearer token presented by the MCP caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardedBearer;

impl CredentialStrategy for ForwardedBearer {
    fn resolve(&self, headers: Option<&HeaderMap>) -> Result<ApiKey, CredentialError> {
        let value = headers
            .and_then(|headers| headers.get(header::AUTHORIZATION))
            .ok_or(CredentialError::MissingHeader)?;
        let value = value.to_str().map_err(|_| CredentialError::MalformedHeader)?;
        let token = parse_bearer(value).ok_or(CredentialError::MalformedHeader)?;
        ApiKey::new(token)
    }

    fn name(&self) -> &'static str {
        "forwarded-bearer"
    }
}

fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(char::is_whitespace)?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
}

/// Use one key configured at startup, for single-user transports.
#[derive(Debug, Clone)]
pub struct StaticApiKey {
    key: Option<ApiKey>,
}

impl StaticApiKey {
    pub fn new(key: Option<ApiKey>) -> Self {
        Self { key }
    }
}

impl CredentialStrategy for StaticApiKey {
    fn resolve(&self, _headers: Option<&HeaderMap>) -> Result<ApiKey, CredentialError> {
        self.key.clone().ok_or(CredentialError::NotConfigured)
    }

    fn name(&self) -> &'static str {
        "static-api-key"
    }
}

/// Certificate handling for connections to the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsPolicy {
    #[default]
    Verify,
    /// Accept self-signed or otherwise invalid certificates.
    AcceptInvalidCerts,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub tls: TlsPolicy,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            tls: TlsPolicy::Verify,
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Builds a credential-scoped [`DssClient`] for each tool call.
#[derive(Debug, Clone)]
pub struct DssConnector {
    base_url: Url,
    http: Client,
    poll_interval: Duration,
    strategy: Arc<dyn CredentialStrategy>,
}

impl DssConnector {
    pub fn new(base_url: &str, options: &ClientOptions, strategy: Arc<dyn CredentialStrategy>) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;
        if options.tls == TlsPolicy::AcceptInvalidCerts {
            warn!(%base_url, "TLS certificate verification is disabled for platform connections");
        }
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        // The pooled client carries no credentials; each DssClient attaches its own key.
        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(options.request_timeout)
            .danger_accept_invalid_certs(options.tls == TlsPolicy::AcceptInvalidCerts)
            .user_agent(format!("dssmcp/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS))
            .build()
            .map_err(|error| ApiError::InvalidConfiguration(format!("cannot build HTTP client: {error}")))?;
        Ok(Self {
            base_url,
            http,
            poll_interval: options.poll_interval,
            strategy,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Resolve the caller's key and return a client acting as that caller.
    pub fn connect(&self, headers: Option<&HeaderMap>) -> Result<DssClient, ApiError> {
        let api_key = self.strategy.resolve(headers)?;
        Ok(DssClient::new(self.base_url.clone(), self.http.clone(), api_key, self.poll_interval))
    }
}

/// Validate the configured platform URL.
///
/// Only absolute `http`/`https` URLs with a host are accepted.
pub fn validate_base_url(base: &str) -> Result<Url, ApiError> {
    let parsed = Url::parse(base).map_err(|error| ApiError::InvalidConfiguration(format!("invalid platform URL '{base}': {error}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidConfiguration(format!(
            "platform URL must use http or https; got '{}://'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ApiError::InvalidConfiguration("platform URL must include a host".to_string()));
    }
    Ok(parsed)
}
