//! # Sync HTTP Client
//!
//! Thin reqwest wrapper over the sync endpoints. One POST per category,
//! one GET for the server's record counts.
//!
//! ## Status Mapping
//! ```text
//! 2xx ──► decode body as SyncResponse / StatusResponse
//! 4xx ──► SyncError::Rejected    { status, message }
//! 5xx ──► SyncError::ServerError { status, message }
//! ```
//! `message` is the `error` field of the body when it has one, otherwise
//! the raw body text.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    CustomerPayload, ErrorBody, OrderPayload, ProductPayload, StatusResponse, SyncKind,
    SyncResponse, SYNC_PATH,
};
use crate::reconciler::SyncTransport;

/// HTTP client bound to one sync server.
#[derive(Debug, Clone)]
pub struct SyncClient {
    http: Client,
    base_url: Url,
}

impl SyncClient {
    /// Builds a client for `base_url`.
    ///
    /// `timeout` bounds every request end to end. `None` leaves requests
    /// unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> SyncResult<Self> {
        let base_url = Url::parse(base_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(SyncClient { http, base_url })
    }

    /// Builds a client from a loaded [`SyncConfig`](crate::SyncConfig).
    pub fn from_config(config: &crate::SyncConfig) -> SyncResult<Self> {
        Self::new(&config.sync.server_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn push<P: Serialize>(&self, kind: SyncKind, records: &[P]) -> SyncResult<SyncResponse> {
        let url = self.endpoint(&kind.path())?;
        debug!(%url, count = records.len(), "Pushing {}", kind);

        let response = self.http.post(url).json(records).send().await?;
        decode(response).await
    }

    /// Fetches the server's record counts.
    pub async fn status(&self) -> SyncResult<StatusResponse> {
        let url = self.endpoint(&format!("{}/status", SYNC_PATH))?;
        let response = self.http.get(url).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> SyncResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    warn!(status = status.as_u16(), %message, "Sync request failed");

    Err(status_error(status, message))
}

fn status_error(status: StatusCode, message: String) -> SyncError {
    if status.is_client_error() {
        SyncError::Rejected {
            status: status.as_u16(),
            message,
        }
    } else {
        SyncError::ServerError {
            status: status.as_u16(),
            message,
        }
    }
}

impl SyncTransport for SyncClient {
    async fn push_products(&self, products: &[ProductPayload]) -> SyncResult<SyncResponse> {
        self.push(SyncKind::Products, products).await
    }

    async fn push_orders(&self, orders: &[OrderPayload]) -> SyncResult<SyncResponse> {
        self.push(SyncKind::Orders, orders).await
    }

    async fn push_customers(&self, customers: &[CustomerPayload]) -> SyncResult<SyncResponse> {
        self.push(SyncKind::Customers, customers).await
    }
}
