use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::errors::TransportError;
use crate::model::{SyncResponse, TelemetryEvent};

/// Request/response channel to the tracking server. Calls are synchronous
/// from the control loop's point of view: the tick blocks until the call
/// returns or times out inside the client.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn fetch_sync(&self, identity: &str) -> Result<SyncResponse, TransportError>;
    async fn send_telemetry(&self, event: &TelemetryEvent) -> Result<(), TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl Transport for HttpTransport {
    async fn fetch_sync(&self, identity: &str) -> Result<SyncResponse, TransportError> {
        let url = format!("{}/sync/{}", self.base_url, identity);
        debug!(%url, "GET sync snapshot");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(TransportError::NotFound),
            status if !status.is_success() => Err(TransportError::Status(status.as_u16())),
            _ => response
                .json::<SyncResponse>()
                .await
                .map_err(TransportError::Parse),
        }
    }

    async fn send_telemetry(&self, event: &TelemetryEvent) -> Result<(), TransportError> {
        let url = format!("{}/telemetry", self.base_url);
        debug!(%url, event_type = ?event.event_type, "POST telemetry");

        let response = self.client.post(&url).json(event).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}
