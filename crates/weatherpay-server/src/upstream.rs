//! Upstream weather provider.

use async_trait::async_trait;
use std::time::Instant;
use url::Url;

use crate::config::{ConfigError, UpstreamConfig};
use crate::metrics::{UPSTREAM_FETCHES, UPSTREAM_LATENCY};

/// Upstream responses larger than this are treated as malformed.
const MAX_BODY_SIZE: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("malformed upstream body: {0}")]
    Malformed(String),
}

/// Source of the weather report served by the paid route.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch the current report. Called at most once per paid request.
    async fn fetch(&self) -> Result<serde_json::Value, UpstreamError>;
}

/// Fetches the report with a single GET against the configured provider.
pub struct HttpWeatherSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpWeatherSource {
    pub fn new(client: reqwest::Client, config: &UpstreamConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            url: config.request_url()?,
        })
    }
}

#[async_trait]
impl WeatherSource for HttpWeatherSource {
    async fn fetch(&self) -> Result<serde_json::Value, UpstreamError> {
        let started = Instant::now();
        let result = self.fetch_once().await;
        UPSTREAM_LATENCY.observe(started.elapsed().as_secs_f64());
        let label = if result.is_ok() { "ok" } else { "error" };
        UPSTREAM_FETCHES.with_label_values(&[label]).inc();
        result
    }
}

impl HttpWeatherSource {
    async fn fetch_once(&self) -> Result<serde_json::Value, UpstreamError> {
        let mut response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_BODY_SIZE as u64 {
                return Err(UpstreamError::Malformed(format!(
                    "body too large: {len} bytes"
                )));
            }
        }

        // Chunked bodies carry no Content-Length; enforce the cap while reading.
        let mut body = Vec::with_capacity(
            response
                .content_length()
                .map(|len| len as usize)
                .unwrap_or(8192)
                .min(MAX_BODY_SIZE),
        );
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| UpstreamError::Request(format!("failed to read body: {e}")))?
        {
            if body.len() + chunk.len() > MAX_BODY_SIZE {
                return Err(UpstreamError::Malformed(format!(
                    "body too large (max {MAX_BODY_SIZE} bytes)"
                )));
            }
            body.extend_from_slice(&chunk);
        }
        parse_weather_body(&body)
    }
}

/// Parse an upstream body as JSON.
pub fn parse_weather_body(body: &[u8]) -> Result<serde_json::Value, UpstreamError> {
    if body.len() > MAX_BODY_SIZE {
        return Err(UpstreamError::Malformed(format!(
            "body too large: {} bytes",
            body.len()
        )));
    }
    serde_json::from_slice(body).map_err(|e| UpstreamError::Malformed(e.to_string()))
}
