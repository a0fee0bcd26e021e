//! HTTP client for the Fantasy Premier League public API.
//!
//! Two endpoints: `/fixtures/` (per-fixture results with goalscorer stats)
//! and `/bootstrap-static/` (roster and gameweek calendar). No API key
//! required.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::models::{Bootstrap, Fixture};

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP error: {status_code}")]
    Http { status_code: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Deserialization(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Client for the FPL public API.
pub struct FplClient {
    client: reqwest::Client,
    base_url: String,
}

impl FplClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the full fixture list for the season.
    pub async fn fixtures(&self) -> Result<Vec<Fixture>, FeedError> {
        let url = format!("{}/fixtures/", self.base_url);
        let fixtures: Vec<Fixture> = self.get_json(&url).await?;
        debug!(total = fixtures.len(), "Fetched fixtures");
        Ok(fixtures)
    }

    /// Fetch the bootstrap payload (roster elements + gameweek calendar).
    pub async fn bootstrap(&self) -> Result<Bootstrap, FeedError> {
        let url = format!("{}/bootstrap-static/", self.base_url);
        let bootstrap: Bootstrap = self.get_json(&url).await?;
        debug!(
            elements = bootstrap.elements.len(),
            gameweeks = bootstrap.events.len(),
            "Fetched bootstrap"
        );
        Ok(bootstrap)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FeedError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Http {
                status_code: status.as_u16(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| FeedError::Deserialization(e.to_string()))
    }
}
