//! HTTP client for the Fission data-flow endpoint.
//!
//! One [`MetricsClient::fetch`] is one POST: no retry, no caching and no
//! timeout override. Transport failures propagate to the caller.
//!
//! ## Example
//!
//! ```no_run
//! use fission_flow::{FlowQuery, MetricsClient};
//!
//! # tokio_test::block_on(async {
//! let client = MetricsClient::builder()
//!     .base_url("http://192.168.39.129:31314")
//!     .build()
//!     .unwrap();
//!
//! let query = FlowQuery::new("1672531200", "5m");
//! let set = client.fetch(&query).await.unwrap();
//! println!("{} samples", set.len());
//! # });
//! ```

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::result::RawResultSet;
use crate::config::{BackendSettings, DEFAULT_PATH, DEFAULT_SOURCE, DEFAULT_SOURCE_TYPE};
use crate::error::FlowError;

/// Header naming the calling component.
pub const SOURCE_HEADER: &str = "X-Fission-Flow-Source";
/// Header naming the calling component's type.
pub const SOURCE_TYPE_HEADER: &str = "X-Fission-Flow-Source-Type";

/// Parameters of one data-flow request.
///
/// Empty parameters are never sent: they are skipped during serialization,
/// so `FlowQuery::default()` posts `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowQuery {
    /// Evaluation instant in Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Rate window (Prometheus range, e.g. "5m").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

impl FlowQuery {
    /// Build a query, dropping empty values. Others are sent as given.
    pub fn new(time: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            time: non_empty(time.into()),
            step: non_empty(step.into()),
        }
    }

    /// Short human-readable description for the status bar.
    pub fn describe(&self) -> String {
        match (&self.time, &self.step) {
            (None, None) => "latest".to_string(),
            (Some(t), None) => format!("time={}", t),
            (None, Some(s)) => format!("step={}", s),
            (Some(t), Some(s)) => format!("time={} step={}", t, s),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Client for the data-flow endpoint.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    client: Client,
    url: String,
    source: String,
    source_type: String,
}

impl MetricsClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> MetricsClientBuilder {
        MetricsClientBuilder::default()
    }

    /// Build a client from backend settings.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self, FlowError> {
        Self::builder()
            .base_url(&settings.base_url)
            .path(&settings.path)
            .source(&settings.source, &settings.source_type)
            .build()
    }

    /// Full URL requests are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch one snapshot.
    pub async fn fetch(&self, query: &FlowQuery) -> Result<RawResultSet, FlowError> {
        debug!(url = %self.url, query = %query.describe(), "posting data-flow request");

        let response = self
            .client
            .post(&self.url)
            .header(SOURCE_HEADER, &self.source)
            .header(SOURCE_TYPE_HEADER, &self.source_type)
            .json(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FlowError::Http(format!(
                "backend returned status {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        let set = RawResultSet::from_slice(&body)?;

        let failed = set.failed_queries();
        if !failed.is_empty() {
            warn!(queries = ?failed, "backend reported failed upstream queries");
        }
        debug!(samples = set.len(), "data-flow response decoded");

        Ok(set)
    }
}

/// Builder for [`MetricsClient`].
#[derive(Debug, Default)]
pub struct MetricsClientBuilder {
    base_url: Option<String>,
    path: Option<String>,
    source: Option<(String, String)>,
}

impl MetricsClientBuilder {
    /// Set the backend base URL (scheme, host and port).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the endpoint path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Override the identification header values.
    pub fn source(mut self, source: impl Into<String>, source_type: impl Into<String>) -> Self {
        self.source = Some((source.into(), source_type.into()));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<MetricsClient, FlowError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| crate::config::DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(FlowError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                base_url
            )));
        }

        let (source, source_type) = self
            .source
            .unwrap_or_else(|| (DEFAULT_SOURCE.to_string(), DEFAULT_SOURCE_TYPE.to_string()));
        let settings = BackendSettings {
            base_url,
            path: self.path.unwrap_or_else(|| DEFAULT_PATH.to_string()),
            source,
            source_type,
        };
        let url = settings.endpoint();

        let client = Client::builder()
            .build()
            .map_err(|e| FlowError::Config(e.to_string()))?;

        Ok(MetricsClient {
            client,
            url,
            source: settings.source,
            source_type: settings.source_type,
        })
    }
}
