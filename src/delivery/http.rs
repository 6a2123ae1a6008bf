//! Callback sink posting JSON arrays over HTTP

use crate::crawler::EventRecord;
use crate::delivery::traits::{BatchSink, DeliveryError, DeliveryResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client used for callback delivery
///
/// The client-level timeout mirrors the per-attempt timeout so a stalled
/// connection is also torn down at the socket level.
pub fn build_callback_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(concat!("event-sweep/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Posts each batch as a JSON array to a callback URL
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    /// Creates a sink for `url` with its own client
    pub fn new(url: impl Into<String>, timeout: Duration) -> DeliveryResult<Self> {
        let client = build_callback_client(timeout).map_err(DeliveryError::Client)?;
        Ok(Self::with_client(client, url))
    }

    /// Creates a sink reusing an existing client
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl BatchSink for HttpSink {
    async fn post(&self, batch: &[EventRecord]) -> DeliveryResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(batch)
            .send()
            .await
            .map_err(|source| DeliveryError::Http {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        tracing::debug!("Callback {} accepted {} events", self.url, batch.len());
        Ok(())
    }

    fn target(&self) -> &str {
        &self.url
    }
}
