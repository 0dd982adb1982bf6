//! Remote taxonomy technique detail.
//!
//! The resolver only depends on the [`DetailSource`] trait; the reqwest
//! implementation is the production source, tests plug in their own.

use std::time::Duration;

use serde::Serialize;
use strix_core::config::TaxonomyConfig;

/// Errors from the remote detail fetch. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetailError {
    /// Connection failure or timeout.
    #[error("taxonomy service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The service answered with a non-success status.
    #[error("taxonomy service returned HTTP {status}")]
    RemoteError { status: u16 },

    #[error("taxonomy detail could not be decoded: {0}")]
    Decode(String),
}

/// Detail document for one taxonomy technique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyDetail {
    /// Normalized technique name the document was fetched for.
    pub name: String,
    pub body: serde_json::Value,
}

/// Abstraction over the detail endpoint.
#[async_trait::async_trait]
pub trait DetailSource: Send + Sync {
    /// Fetch the detail document for an already normalized name.
    async fn fetch(&self, normalized_name: &str) -> Result<serde_json::Value, DetailError>;
}

/// Strip every whitespace character: `"File Analysis"` -> `"FileAnalysis"`.
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Fetches `GET {base_url}/d3f:{name}.json` with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpDetailSource {
    base_url: String,
    timeout: Duration,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl HttpDetailSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &TaxonomyConfig) -> Self {
        Self::new(&config.detail_base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn detail_url(&self, normalized_name: &str) -> String {
        format!("{}/d3f:{}.json", self.base_url, normalized_name)
    }
}

#[async_trait::async_trait]
impl DetailSource for HttpDetailSource {
    async fn fetch(&self, normalized_name: &str) -> Result<serde_json::Value, DetailError> {
        let url = self.detail_url(normalized_name);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "taxonomy detail request failed");
                DetailError::RemoteUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, %status, "taxonomy service returned non-2xx status");
            return Err(DetailError::RemoteError {
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| DetailError::Decode(e.to_string()))?;
        tracing::debug!(url = %url, "taxonomy detail fetched");
        Ok(body)
    }
}
