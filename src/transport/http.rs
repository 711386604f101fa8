//! reqwest-backed transport

use super::Transport;
use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::types::ResourceRef;
use async_trait::async_trait;
use bytes::Bytes;

/// One HTTP GET per resource, no retries
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool, custom TLS, proxies)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, resource: &ResourceRef) -> Result<Bytes> {
        let response = self
            .client
            .get(resource.as_url().clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: resource.to_string(),
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(Error::EmptyBody {
                url: resource.to_string(),
            });
        }

        tracing::trace!(url = %resource, bytes = body.len(), "fetched resource");
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
