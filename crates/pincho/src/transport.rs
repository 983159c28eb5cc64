//! HTTP transport seam.
//!
//! The client core only needs "POST this JSON, give me status + body +
//! Retry-After"; everything else (connection pooling, TLS, compression) is
//! the transport's business. Keeping that behind a trait lets tests script
//! whole exchanges without a socket.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::PushError;

/// Raw outcome of one physical HTTP attempt, before classification.
#[derive(Debug, Clone)]
pub struct AttemptResponse {
    pub status: u16,
    pub body: String,
    /// Raw `Retry-After` header value, if the server sent one.
    pub retry_after: Option<String>,
}

/// One physical HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &Value,
    ) -> Result<AttemptResponse, PushError>;
}

pub(crate) fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            tracing::debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Production transport backed by `reqwest`. The inner client manages its
/// own connection pool and is cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given per-attempt timeout.
    pub fn new(timeout: Duration) -> Result<Self, PushError> {
        install_rustls_provider();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PushError::invalid_argument(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }

    /// Wrap an already-configured `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        install_rustls_provider();
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &Value,
    ) -> Result<AttemptResponse, PushError> {
        let response = self
            .client
            .post(url)
            .headers(headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PushError::Timeout { attempts: 1 }
                } else {
                    PushError::network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                PushError::Timeout { attempts: 1 }
            } else {
                PushError::network(format!("failed to read response body: {e}"))
            }
        })?;

        Ok(AttemptResponse {
            status,
            body,
            retry_after,
        })
    }
}
