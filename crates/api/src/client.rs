//! Request plumbing shared by every endpoint group.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::credentials::ApiKey;
use crate::error::{ApiError, classify_response};

/// Query parameters for a request, already rendered as strings.
pub type Query<'a> = &'a [(&'a str, String)];

/// Client acting on behalf of a single caller.
///
/// Created per tool call by [`crate::DssConnector::connect`]. The key is sent
/// as the HTTP Basic username with an empty password, which is how the
/// platform's public API accepts API keys.
#[derive(Debug, Clone)]
pub struct DssClient {
    base_url: Url,
    http: Client,
    api_key: ApiKey,
    poll_interval: Duration,
}

impl DssClient {
    pub(crate) fn new(base_url: Url, http: Client, api_key: ApiKey, poll_interval: Duration) -> Self {
        Self {
            base_url,
            http,
            api_key,
            poll_interval,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Resolve API path segments below `<base>/public/api/`.
    ///
    /// Segments are percent-encoded individually, so names containing `/` or
    /// spaces stay within one segment. A trailing empty segment yields a
    /// trailing slash.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidConfiguration(format!("platform URL '{}' cannot be a base", self.base_url)))?;
            path.pop_if_empty().extend(["public", "api"]).extend(segments);
        }
        Ok(url)
    }

    /// Build an authenticated request for a method and API path.
    pub fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "building platform request");
        Ok(self.http.request(method, url).basic_auth(self.api_key.expose(), Some("")))
    }

    /// Send a request and return the response once its status is successful.
    pub async fn execute(&self, method: Method, segments: &[&str], query: Query<'_>, body: Option<&Value>) -> Result<Response, ApiError> {
        let mut builder = self.request(method, segments)?;
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let request = builder
            .build()
            .map_err(|error| ApiError::InvalidConfiguration(format!("cannot build request: {error}")))?;
        let url = request.url().to_string();
        let response = self.http.execute(request).await.map_err(|error| ApiError::transport(&url, error))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(%url, %status, "platform rejected request");
        Err(classify_response(status, &body))
    }

    /// Send a request and decode a JSON body. An empty body decodes as `null`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: Query<'_>,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let response = self.execute(method, segments, query, body).await?;
        let url = response.url().to_string();
        let text = response.text().await.map_err(|error| ApiError::transport(&url, error))?;
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|error| ApiError::decode(segments.join("/"), error))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], query: Query<'_>) -> Result<T, ApiError> {
        self.send_json(Method::GET, segments, query, None).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(&self, segments: &[&str], query: Query<'_>, body: &B) -> Result<T, ApiError> {
        let body = to_body(segments, body)?;
        self.send_json(Method::POST, segments, query, Some(&body)).await
    }

    pub async fn put_json<B: Serialize>(&self, segments: &[&str], body: &B) -> Result<Value, ApiError> {
        let body = to_body(segments, body)?;
        self.send_json(Method::PUT, segments, &[], Some(&body)).await
    }

    pub async fn delete(&self, segments: &[&str], query: Query<'_>) -> Result<Value, ApiError> {
        self.send_json(Method::DELETE, segments, query, None).await
    }
}

fn to_body<B: Serialize>(segments: &[&str], body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|error| ApiError::decode(segments.join("/"), error))
}

/// Render a boolean query parameter the way the platform expects.
pub fn flag(value: bool) -> String {
    if value { "true".to_string() } else { "false".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{ClientOptions, DssConnector, ForwardedBearer, StaticApiKey};
    use std::sync::Arc;

    fn client(base: &str) -> DssClient {
        let strategy = StaticApiKey::new(Some(ApiKey::new("k").expect("key")));
        DssConnector::new(base, &ClientOptions::default(), Arc::new(strategy))
            .expect("connector")
            .connect(None)
            .expect("client")
    }

    #[test]
    fn builds_public_api_urls() {
        let client = client("https://dss.example.com:11200");
        let url = client.endpoint(&["projects", ""]).expect("url");
        assert_eq!(url.as_str(), "https://dss.example.com:11200/public/api/projects/");
        let url = client.endpoint(&["projects", "SALES", "datasets", "a/b c"]).expect("url");
        assert_eq!(url.as_str(), "https://dss.example.com:11200/public/api/projects/SALES/datasets/a%2Fb%20c");
    }

    #[test]
    fn keeps_base_path_prefix() {
        let client = client("https://gateway.example.com/dss/");
        let url = client.endpoint(&["auth", "info"]).expect("url");
        assert_eq!(url.as_str(), "https://gateway.example.com/dss/public/api/auth/info");
    }

    #[test]
    fn bearer_strategy_needs_headers() {
        let connector = DssConnector::new("https://dss.example.com", &ClientOptions::default(), Arc::new(ForwardedBearer)).expect("connector");
        assert!(connector.connect(None).is_err());
    }
}
