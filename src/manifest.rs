//! Dataset list resolution and validation.
//!
//! A run needs exactly one DatasetList. The resolver prefers a cached
//! copy that is recent enough, refreshes it from the API when stale (and
//! allowed to), and rejects documents wholesale when they fail
//! validation. Superseded cached copies are left in place.

use crate::api::RemoteApi;
use crate::error::SyncError;
use crate::store::{dataset_list_date, dataset_list_key, BlobStore, DATASET_LIST_PREFIX};
use crate::types::SyncConfig;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use tracing::{info, warn};

/// One session's entry in the dataset list, using Legiscan field names.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub state_id: u32,
    pub session_id: u64,
    pub access_key: String,
    pub year_start: i32,
    pub year_end: i32,
    pub dataset_date: String,
    pub dataset_hash: String,
    pub dataset_size: u64,
    pub session_name: String,
}

/// A validated dataset list together with the blob key it came from.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Blob key of the document, named in error messages and logs.
    pub source_key: String,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
struct DatasetListDocument {
    status: Option<String>,
    datasetlist: Option<Vec<ManifestEntry>>,
}

/// Parses and validates a DatasetList document.
///
/// Validation is all-or-nothing: a document missing its status flag, a
/// non-"OK" status, or a missing `datasetlist` collection rejects the
/// whole document. No partial acceptance.
pub fn parse_dataset_list(text: &str, key: &str) -> Result<Manifest, SyncError> {
    let doc: DatasetListDocument =
        serde_json::from_str(text).map_err(|e| SyncError::ManifestMalformed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

    let status = doc.status.ok_or_else(|| SyncError::ManifestMalformed {
        key: key.to_string(),
        reason: "status field missing".to_string(),
    })?;
    if status != "OK" {
        return Err(SyncError::ManifestStatus {
            key: key.to_string(),
            status,
        });
    }

    let entries = doc
        .datasetlist
        .ok_or_else(|| SyncError::ManifestMalformed {
            key: key.to_string(),
            reason: "datasetlist missing".to_string(),
        })?;

    Ok(Manifest {
        source_key: key.to_string(),
        entries,
    })
}

/// Finds the cached dataset list blob with the latest embedded date.
///
/// Keys that do not match the recognized naming pattern are skipped.
async fn latest_cached(store: &dyn BlobStore) -> Result<Option<(NaiveDate, String)>, SyncError> {
    let mut latest: Option<(NaiveDate, String)> = None;
    for key in store.list_keys(DATASET_LIST_PREFIX).await? {
        if let Some(date) = dataset_list_date(&key) {
            if latest.as_ref().map_or(true, |(d, _)| date > *d) {
                latest = Some((date, key));
            }
        }
    }
    Ok(latest)
}

/// Obtains a validated dataset list for this run.
///
/// The cached copy is reused when it is younger than
/// `config.frequency_days`; otherwise, with `config.use_api` set, a
/// single remote fetch is attempted and the fresh document is uploaded
/// under today's key. A failed remote fetch falls back to the cached
/// copy. With neither available the run cannot proceed and
/// [`SyncError::ManifestUnavailable`] is returned.
///
/// Retries for transient transport failures live inside the API client;
/// this resolver makes exactly one attempt.
pub async fn resolve(
    store: &dyn BlobStore,
    api: &dyn RemoteApi,
    config: &SyncConfig,
    today: NaiveDate,
) -> Result<Manifest, SyncError> {
    let latest = latest_cached(store).await?;
    // A copy aged exactly frequency_days is already stale; a store with
    // no recognizable copy counts as infinitely stale.
    let stale_cutoff = today - Duration::days(config.frequency_days);
    let stale = latest
        .as_ref()
        .map_or(true, |(date, _)| *date <= stale_cutoff);

    let mut document: Option<(String, String)> = None;

    if config.use_api && stale {
        if let Some(text) = api.dataset_list(&config.quality).await {
            let key = dataset_list_key(today);
            store.upload(&key, &text).await?;
            info!("stored fresh DatasetList as {}", key);
            document = Some((key, text));
        } else {
            warn!("API failed to deliver a DatasetList, falling back to cached copy");
        }
    }

    if document.is_none() {
        if let Some((_, key)) = latest {
            info!("downloading cached {}", key);
            let text = store.download(&key).await?;
            document = Some((key, text));
        }
    }

    let (key, text) = document.ok_or(SyncError::ManifestUnavailable)?;
    info!("verifying DatasetList contents of {}", key);
    parse_dataset_list(&text, &key)
}
