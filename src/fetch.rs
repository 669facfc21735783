//! Dataset fetch scheduling.

use crate::api::RemoteApi;
use crate::error::SyncError;
use crate::manifest::ManifestEntry;
use crate::store::{dataset_key, BlobStore};
use crate::types::Region;
use tracing::{debug, info, warn};

/// Whether a dataset list entry belongs to `region` and survives the
/// minimum-year filter. Entries failing either gate are never fetched
/// and never appear in the ledger.
pub fn entry_qualifies(entry: &ManifestEntry, region: &Region, from_year: i32) -> bool {
    entry.state_id == region.external_id && entry.year_end >= from_year
}

/// Fetches the qualifying datasets for one region.
///
/// Each selected entry is fetched and uploaded under its dataset key,
/// overwriting any prior blob for that key; existence is not checked
/// first, the quota and year filter are the only gates. Once the quota
/// is spent (or fetching is disabled) remaining entries are skipped
/// silently, as that is the expected steady state. A failed fetch is
/// logged and leaves that dataset absent until a future run.
pub async fn fetch_missing(
    region: &Region,
    entries: &[ManifestEntry],
    api: &dyn RemoteApi,
    store: &dyn BlobStore,
    use_api: bool,
    from_year: i32,
) -> Result<(), SyncError> {
    for entry in entries.iter().filter(|e| entry_qualifies(e, region, from_year)) {
        let key = dataset_key(&region.code, entry.session_id);
        if !use_api || !api.quota_available() {
            debug!("skipping {} (fetching disabled or quota spent)", key);
            continue;
        }
        info!("Fetching {}: {}", region.code, entry.session_id);
        match api.dataset(entry.session_id, &entry.access_key).await {
            Ok(payload) => store.upload(&key, &payload).await?,
            Err(e) => warn!("failed to fetch {}: {}", key, e),
        }
    }
    Ok(())
}
