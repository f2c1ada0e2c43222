//! Client for a remote admin pricing API.

use super::{RateSource, RateSourceError};
use crate::domain::{FactorSheet, ScalesPayload, Section};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Rate source backed by the `/api/admin/*` endpoints of another instance.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRateSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RateSourceError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        debug!(url = %url, "Fetching pricing table");

        retry(backoff, || async {
            let mut request = self
                .client
                .get(&url)
                .header(reqwest::header::ACCEPT, "application/json");
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await.map_err(|e| {
                backoff::Error::transient(RateSourceError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(RateSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(RateSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(RateSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<T>()
                .await
                .map_err(|e| backoff::Error::permanent(RateSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_sections(&self) -> Result<Vec<Section>, RateSourceError> {
        self.get_json("/api/admin/items").await
    }

    async fn fetch_scales(&self) -> Result<ScalesPayload, RateSourceError> {
        self.get_json("/api/admin/scales").await
    }

    async fn fetch_factors(&self) -> Result<FactorSheet, RateSourceError> {
        self.get_json("/api/admin/factors").await
    }
}
