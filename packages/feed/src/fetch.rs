//! HTTP client for the incident feed.
//!
//! One fetch may be in flight at a time: a second caller short-circuits with
//! [`FeedError::Busy`] instead of queueing or cancelling. A failed fetch is
//! retried after a fixed delay with no backoff growth and no attempt limit,
//! matching the behavior the dashboard has always had under outage.

use std::sync::atomic::{AtomicBool, Ordering};

use incident_map_feed_models::{FeedConfig, RawRow};
use incident_map_incident_models::Incident;

use crate::FeedError;
use crate::normalize::normalize_rows;

/// Client for the spreadsheet-backed incident feed.
pub struct FeedClient {
    http: reqwest::Client,
    config: FeedConfig,
    busy: AtomicBool,
}

impl FeedClient {
    /// Creates a client for the given configuration.
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            busy: AtomicBool::new(false),
        }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub(crate) const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetches the raw feed rows once.
    ///
    /// Rows that are not JSON arrays are dropped with a warning rather than
    /// failing the whole payload.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Busy`] when another fetch is already in flight,
    /// and [`FeedError::Http`] / [`FeedError::Status`] /
    /// [`FeedError::Json`] on transport or decode failure.
    pub async fn fetch_rows(&self) -> Result<Vec<RawRow>, FeedError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FeedError::Busy);
        }

        let result = self.fetch_rows_inner().await;
        self.busy.store(false, Ordering::Release);
        result
    }

    async fn fetch_rows_inner(&self) -> Result<Vec<RawRow>, FeedError> {
        log::info!("Fetching incident feed from {}", self.config.endpoint);

        let response = self.http.get(&self.config.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status { status });
        }

        let payload: serde_json::Value = response.json().await?;
        let Some(entries) = payload.as_array() else {
            return Err(FeedError::UnexpectedPayload {
                message: "feed payload is not a JSON array".to_string(),
            });
        };

        let mut rows = Vec::with_capacity(entries.len());
        let mut dropped = 0_usize;
        for entry in entries {
            if let Some(cells) = entry.as_array() {
                rows.push(cells.clone());
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::warn!("Dropped {dropped} feed entries that were not arrays");
        }

        log::info!("Feed returned {} rows", rows.len());
        Ok(rows)
    }

    /// Fetches and normalizes the feed once.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::fetch_rows`].
    pub async fn fetch_incidents(&self) -> Result<Vec<Incident>, FeedError> {
        let rows = self.fetch_rows().await?;
        Ok(normalize_rows(&rows, &self.config.bounds))
    }

    /// Fetches and normalizes the feed, retrying indefinitely on failure
    /// after the configured fixed delay.
    ///
    /// A concurrent fetch ([`FeedError::Busy`]) is also treated as a
    /// transient condition and waited out.
    pub async fn fetch_incidents_with_retry(&self) -> Vec<Incident> {
        loop {
            match self.fetch_incidents().await {
                Ok(incidents) => return incidents,
                Err(e) => {
                    log::error!(
                        "Feed fetch failed: {e}; retrying in {:?}",
                        self.config.retry_delay
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }
}
