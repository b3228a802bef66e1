//! Embedded folder view fetcher
//!
//! One GET per call against `<base-url>/embeddedfolderview?id=<id>`, where
//! the base URL is `https://<drive-host>` unless overridden.
//! No retries and no validation of the folder id; both are the caller's
//! concern.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

const USER_AGENT: &str = concat!("adx-converts/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Folder view fetch errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Upstream answered with a non-success status
    #[error("{url} -> {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    /// Request failed before a status was received
    #[error("transport error: {0}")]
    Transport(String),
}

/// Source of raw folder view markup
#[async_trait]
pub trait FolderViewSource: Send + Sync {
    async fn fetch(&self, folder_id: &str) -> Result<String, FetchError>;
}

/// Fetches folder views over HTTP
pub struct EmbeddedViewFetcher {
    http_client: reqwest::Client,
    base_url: String,
}

impl EmbeddedViewFetcher {
    pub fn new(drive_host: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_base_url(format!("https://{}", drive_host.into()))
    }

    /// Fetcher against an explicit scheme + host, e.g. `http://127.0.0.1:8080`
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn view_url(&self, folder_id: &str) -> String {
        format!("{}/embeddedfolderview?id={}", self.base_url, folder_id)
    }
}

#[async_trait]
impl FolderViewSource for EmbeddedViewFetcher {
    async fn fetch(&self, folder_id: &str) -> Result<String, FetchError> {
        let url = self.view_url(folder_id);

        tracing::debug!(folder_id = %folder_id, url = %url, "Fetching embedded folder view");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}
