//! HTTP client for making requests to upstream providers

use super::error::{FetchError, FetchResult};
use super::request::{HttpMethod, ProviderRequest, ProviderResponse};
use crate::config::OutgoingSettings;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP client wrapper shared by the provider clients
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> anyhow::Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
            user_agent: format!("catalog-scout/{}", crate::VERSION),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Execute a provider request
    ///
    /// Transport-level failures are classified into [`FetchError`]; a non-2xx
    /// status is returned as a response so callers can tell 404 apart.
    /// Dropping the returned future aborts the underlying request.
    pub async fn execute(&self, request: ProviderRequest) -> FetchResult<ProviderResponse> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        for (key, value) in self.extra_headers.iter().chain(request.headers.iter()) {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(body) = request.json {
            req_builder = req_builder.json(&body);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.default_timeout))?;

        self.parse_response(response).await
    }

    /// Parse response into ProviderResponse
    async fn parse_response(&self, response: Response) -> FetchResult<ProviderResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.default_timeout))?;

        Ok(ProviderResponse { status, text, url })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
