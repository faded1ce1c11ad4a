//! Remote HTTP/HTTPS fetcher for Spring Cloud Config servers.

use super::{EnvironmentDocument, FetchTarget, SourceFetcher};
use crate::core::{ConnectionSettings, DEFAULT_TIMEOUT};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Authentication method for HTTP requests.
#[derive(Clone)]
pub enum HttpAuth {
    /// No authentication
    None,
    /// Basic authentication (username, password)
    Basic(String, String),
}

impl std::fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Basic(username, _) => write!(f, "Basic({}, ****)", username),
        }
    }
}

/// HTTP-based fetcher.
///
/// Issues exactly one `GET {base}/{application}/{profiles}/{label}` per call with
/// `Accept: application/json`. There is no retry and no cache: a failed call fails
/// initialization.
///
/// # Examples
///
/// ```rust,no_run
/// use cloud_config_client::sources::HttpFetcher;
/// use std::time::Duration;
///
/// # fn example() -> cloud_config_client::error::Result<()> {
/// let fetcher = HttpFetcher::builder()
///     .with_base_url("https://config.example.com/")
///     .with_basic_auth("reader", "s3cret")
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpFetcher {
    base_url: Url,
    client: Client,
    auth: HttpAuth,
}

impl HttpFetcher {
    /// Create a new builder for constructing an HTTP fetcher.
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::new()
    }

    /// Create a fetcher from connection settings.
    ///
    /// Basic authentication is only enabled when both username and password are non-empty.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self> {
        let mut builder = HttpFetcher::builder()
            .with_base_url(settings.base_url())
            .with_timeout(settings.timeout());

        if let Some((username, password)) = settings.credentials() {
            builder = builder.with_basic_auth(username, password);
        }

        builder.build()
    }

    /// Build the request URL for a target.
    pub fn url_for(&self, target: &FetchTarget) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ConfigError::Configuration(format!(
                    "Base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty();
            for segment in target.path_segments() {
                segments.push(&segment);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, target: &FetchTarget) -> Result<EnvironmentDocument> {
        let url = self.url_for(target)?;
        debug!(url = %url, auth = ?self.auth, "Fetching configuration from server");

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let HttpAuth::Basic(username, password) = &self.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConfigError::RemoteFetch(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::RemoteFetch(format!(
                "HTTP request failed with status {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ConfigError::RemoteFetch(format!("Failed to read response body: {}", e)))?;

        let document = EnvironmentDocument::from_json(&body)?;
        debug!(
            sources = document.property_sources.len(),
            version = document.version.as_deref().unwrap_or("-"),
            "Received property sources"
        );

        Ok(document)
    }

    fn name(&self) -> String {
        format!("http:{}", self.base_url)
    }
}

/// Builder for constructing an `HttpFetcher`.
pub struct HttpFetcherBuilder {
    base_url: Option<String>,
    auth: HttpAuth,
    timeout: Duration,
}

impl HttpFetcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth: HttpAuth::None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the base URL of the configuration server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set Basic authentication.
    ///
    /// Ignored unless both values are non-empty.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let (username, password) = (username.into(), password.into());
        self.auth = if username.is_empty() || password.is_empty() {
            HttpAuth::None
        } else {
            HttpAuth::Basic(username, password)
        };
        self
    }

    /// Set the request timeout.
    ///
    /// Default is 10 seconds. A server that never answers surfaces as
    /// [`ConfigError::RemoteFetch`] once it elapses.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Configuration`] if no base URL is provided or it does
    /// not parse, and [`ConfigError::RemoteFetch`] if the HTTP client cannot be
    /// constructed.
    pub fn build(self) -> Result<HttpFetcher> {
        let raw = self.base_url.ok_or_else(|| {
            ConfigError::Configuration("Base URL is required for HttpFetcher".to_string())
        })?;

        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::Configuration(format!("Invalid base URL '{}': {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Configuration(format!(
                "Base URL cannot carry a path: {}",
                raw
            )));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConfigError::RemoteFetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpFetcher {
            base_url,
            client,
            auth: self.auth,
        })
    }
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
