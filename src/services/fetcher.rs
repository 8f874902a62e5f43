use std::time::Duration;

use bytes::Bytes;
use reqwest::{header, Client};

use crate::error::{ParseError, TransportError};
use crate::services::metrics::UPSTREAM_REQUESTS_COUNTER;

/// Status and body of an upstream response, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body of a 2xx response; anything else is a [`ParseError::BadResponse`].
    pub fn into_body(self) -> Result<Bytes, ParseError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ParseError::BadResponse(self.status))
        }
    }
}

/// Pluggable transport. The facade only ever talks to the upstream through this.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;

    async fn post(
        &self,
        url: &str,
        body: String,
        content_type: &str,
    ) -> Result<RawResponse, TransportError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("uncmorfi-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn finish(
        endpoint: &'static str,
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<RawResponse, TransportError> {
        let response = match result {
            Ok(r) => r,
            Err(e) => {
                UPSTREAM_REQUESTS_COUNTER
                    .with_label_values(&[endpoint, "transport_error"])
                    .inc();
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Upstream {} {} answered {}", endpoint, response.url(), status);
        }
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Upstream {} body read failed: {}", endpoint, e);
                UPSTREAM_REQUESTS_COUNTER
                    .with_label_values(&[endpoint, "transport_error"])
                    .inc();
                return Err(e.into());
            }
        };

        let outcome = if status.is_success() { "ok" } else { "bad_status" };
        UPSTREAM_REQUESTS_COUNTER
            .with_label_values(&[endpoint, outcome])
            .inc();

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        tracing::debug!("GET {}", url);
        Self::finish("get", self.client.get(url).send().await).await
    }

    async fn post(
        &self,
        url: &str,
        body: String,
        content_type: &str,
    ) -> Result<RawResponse, TransportError> {
        tracing::debug!("POST {}", url);
        let result = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await;
        Self::finish("post", result).await
    }
}
