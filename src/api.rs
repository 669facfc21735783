//! Remote API access with quota accounting.
//!
//! The Legiscan API allows a fixed number of fetches per billing period,
//! so every remote call is charged against a run-scoped budget. Transient
//! transport failures are retried here; callers see a single attempt.

use crate::error::SyncError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_retry2::strategy::FixedInterval;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, warn};

/// Client for the remote legislative data API.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Fetches the current dataset list document.
    ///
    /// Returns `None` when the fetch fails after retries; the failure is
    /// logged here and callers fall back to cached copies.
    async fn dataset_list(&self, quality: &str) -> Option<String>;

    /// Fetches one session dataset payload.
    async fn dataset(&self, session_id: u64, access_key: &str) -> Result<String, SyncError>;

    /// Whether the run's fetch budget still allows remote calls.
    fn quota_available(&self) -> bool;
}

/// HTTP client for the Legiscan API.
///
/// The fetch budget is initialized at construction and decremented once
/// per logical API call. It is scoped to this client instance, i.e. to a
/// single run; nothing is persisted across runs.
pub struct LegiscanClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    remaining: AtomicU32,
}

impl LegiscanClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, quota: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            remaining: AtomicU32::new(quota),
        }
    }

    /// Charges one call against the budget. False when already spent.
    fn try_consume(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn get_with_retry(&self, url: &str) -> Result<String, SyncError> {
        let retry_strategy = FixedInterval::from_millis(2_000).take(3);

        Retry::spawn(retry_strategy, || async {
            let result = async {
                let response = self.client.get(url).send().await?.error_for_status()?;
                Ok::<String, SyncError>(response.text().await?)
            }
            .await;
            match result {
                Ok(text) => Ok(text),
                Err(e) => {
                    warn!("request to Legiscan failed: {}", e);
                    RetryError::to_transient(e)
                }
            }
        })
        .await
    }
}

#[async_trait]
impl RemoteApi for LegiscanClient {
    async fn dataset_list(&self, quality: &str) -> Option<String> {
        if !self.try_consume() {
            warn!("fetch quota spent, skipping DatasetList request");
            return None;
        }
        let url = format!(
            "{}?key={}&op=getDatasetList&quality={}",
            self.base_url, self.api_key, quality
        );
        info!("requesting DatasetList from Legiscan");
        match self.get_with_retry(&url).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("API failed to get DatasetList from Legiscan: {}", e);
                None
            }
        }
    }

    async fn dataset(&self, session_id: u64, access_key: &str) -> Result<String, SyncError> {
        if !self.try_consume() {
            return Err(SyncError::QuotaSpent(session_id));
        }
        let url = format!(
            "{}?key={}&op=getDataset&id={}&access_key={}",
            self.base_url, self.api_key, session_id, access_key
        );
        debug!("requesting dataset for session {}", session_id);
        self.get_with_retry(&url).await
    }

    fn quota_available(&self) -> bool {
        self.remaining.load(Ordering::SeqCst) > 0
    }
}
