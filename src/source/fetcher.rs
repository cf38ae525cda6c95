//! HTTP fetcher for Prometheus text endpoints
//!
//! This module provides a thin HTTP client wrapper that retrieves the raw
//! scrape body from a `/metrics` endpoint.

use reqwest::Client;
use std::time::Duration;

use crate::error::{SourceError, SourceResult};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client wrapper for fetching metrics
#[derive(Debug, Clone)]
pub struct MetricsFetcher {
    client: Client,
    url: String,
}

impl MetricsFetcher {
    /// Create a new metrics fetcher with the default timeout
    ///
    /// # Arguments
    /// * `url` - Full URL to the metrics endpoint (e.g., "http://localhost:9090/metrics")
    pub fn new(url: String) -> anyhow::Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a new metrics fetcher whose requests give up after `timeout`
    pub fn with_timeout(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch metrics from the endpoint
    ///
    /// # Returns
    /// Raw Prometheus text format as a String
    ///
    /// # Errors
    /// Returns an error if:
    /// - Network request fails or times out
    /// - Response status is not successful (2xx)
    /// - Response body cannot be read as text
    pub async fn fetch(&self) -> SourceResult<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: self.url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: response.status(),
            });
        }

        response.text().await.map_err(|source| SourceError::Http {
            url: self.url.clone(),
            source,
        })
    }
}
