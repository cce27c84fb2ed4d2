//! HTTP client
//!
//! Request plumbing shared by the dbt and Tableau clients: base URL
//! joining, default headers, JSON or XML bodies and status classification.

use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings fixed for the lifetime of a client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Prefix for relative request paths
    pub base_url: Option<String>,
    /// Timeout applied when a request sets none
    pub timeout: Duration,
    /// Headers sent with every request
    pub default_headers: HashMap<String, String>,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            default_headers: HashMap::new(),
            user_agent: format!("dbt-tableau-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for [`HttpClientConfig`]
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// API root, e.g. `https://cloud.getdbt.com/api/v2/accounts`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Send `key: value` on every request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Body of an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// GraphQL documents and the sign-in payload
    Json(Value),
    /// `tsRequest` XML, sent as-is under `content_type`
    Text {
        content: String,
        content_type: String,
    },
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
    /// Replaces the client timeout for this request
    pub timeout: Option<Duration>,
    /// Replaces the client credentials for this request
    pub auth: Option<AuthConfig>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Raw body with an explicit content type (Tableau XML payloads)
    #[must_use]
    pub fn text(mut self, content: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text {
            content: content.into(),
            content_type: content_type.into(),
        });
        self
    }

    /// Deadline for this request only (the Discovery query needs an hour)
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Tableau session credentials for this request
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// HTTP client bound to one API root
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
}

impl HttpClient {
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        if let Some(base) = &config.base_url {
            url::Url::parse(base)?;
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            authenticator: None,
        })
    }

    /// Client that authenticates every request with `auth` (the dbt token)
    pub fn with_auth(config: HttpClientConfig, auth: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = Some(Authenticator::new(auth));
        Ok(client)
    }

    /// Send a request, turning any non-2xx response into `Error::HttpStatus`
    pub async fn send(&self, method: Method, url: &str, config: RequestConfig) -> Result<Response> {
        let full_url = self.build_url(url);
        let timeout = self.deadline(&config);
        let req = self.prepare(method.clone(), &full_url, config).timeout(timeout);

        debug!("{method} {full_url}");

        let response = req
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        debug!("{method} {full_url} returned {}", status.as_u16());
        Ok(response)
    }

    /// Send a request and deserialize its JSON body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let body = self.send_text(method, url, config).await?;
        serde_json::from_str(&body).map_err(|e| Error::decode(format!("Invalid JSON body: {e}")))
    }

    /// Send a request and return its body as text
    pub async fn send_text(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<String> {
        let (_, body) = self.send_for_body(method, url, config).await?;
        Ok(body)
    }

    /// Send a request and return its 2xx status together with the body text
    ///
    /// The deadline covers reading the body as well as the headers, so a
    /// stalled body is reported as `Error::Timeout`.
    pub async fn send_for_body(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<(StatusCode, String)> {
        let timeout = self.deadline(&config);
        let response = self.send(method, url, config).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        Ok((status, body))
    }

    /// Resolve `path` against the base URL; absolute URLs pass through
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }

    fn deadline(&self, config: &RequestConfig) -> Duration {
        config.timeout.unwrap_or(self.config.timeout)
    }

    fn prepare(&self, method: Method, url: &str, config: RequestConfig) -> RequestBuilder {
        let mut req = self.client.request(method, url);

        for (key, value) in self.config.default_headers.iter().chain(&config.headers) {
            req = req.header(key.as_str(), value.as_str());
        }

        req = match config.body {
            Some(RequestBody::Json(body)) => req.json(&body),
            Some(RequestBody::Text {
                content,
                content_type,
            }) => req
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(content),
            None => req,
        };

        match (config.auth, &self.authenticator) {
            (Some(auth), _) => Authenticator::new(auth).apply(req),
            (None, Some(auth)) => auth.apply(req),
            (None, None) => req,
        }
    }
}

/// Classify a reqwest failure, reporting an elapsed deadline as `Error::Timeout`
fn transport_error(error: reqwest::Error, timeout: Duration) -> Error {
    if error.is_timeout() {
        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = timeout.as_millis() as u64;
        Error::Timeout { timeout_ms }
    } else {
        Error::Http(error)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("has_authenticator", &self.authenticator.is_some())
            .finish_non_exhaustive()
    }
}
