//! Error types for synchronization operations.

use std::io;
use thiserror::Error;

/// Errors that can occur while synchronizing datasets.
#[derive(Error, Debug)]
pub enum SyncError {
    /// I/O error during storage operations.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// HTTP request error while talking to the remote API.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// No dataset list could be obtained, neither from storage nor remotely.
    #[error("no DatasetList available: storage holds no cached copy and the API was not called or failed (did you forget --api?)")]
    ManifestUnavailable,

    /// The dataset list document reports a non-OK status.
    #[error("DatasetList {key} reports status {status:?}")]
    ManifestStatus { key: String, status: String },

    /// The dataset list document is structurally invalid.
    #[error("DatasetList {key} is malformed: {reason}")]
    ManifestMalformed { key: String, reason: String },

    /// A requested blob does not exist in storage.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// A dataset fetch was attempted after the run's fetch budget was
    /// spent. Normally prevented by the `quota_available` gate; never
    /// aborts a run.
    #[error("fetch quota spent before requesting session {0}")]
    QuotaSpent(u64),
}

impl SyncError {
    /// Whether this error must abort the whole run.
    ///
    /// Manifest-level failures leave no meaningful work for any region;
    /// everything else is recoverable per entry or per region.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::ManifestUnavailable
                | SyncError::ManifestStatus { .. }
                | SyncError::ManifestMalformed { .. }
        )
    }
}
