//! Change-detection ledger and per-region reporting.
//!
//! Every qualifying dataset list entry leaves one ledger row per run,
//! whether or not its dataset is present in storage. Rows carry the
//! hash, size and generation date the list advertises, so later runs
//! (or external consumers) can detect content changes by comparing
//! hashcodes across rows. Rows are appended, never updated: one row
//! reflects one run's observation.

use crate::error::SyncError;
use crate::fetch::entry_qualifies;
use crate::manifest::ManifestEntry;
use crate::store::dataset_key;
use crate::types::Region;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

/// One run's observation of one expected dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// Dataset blob key, e.g. `"AZ-1748.json"`.
    pub item_name: String,
    /// Storage method label of the blob store, e.g. `"FILE"`.
    pub storage_method: String,
    /// Date the remote dataset was generated, from the dataset list.
    pub generated_date: String,
    /// Content hash advertised by the dataset list.
    pub hashcode: String,
    /// Dataset size in bytes, as advertised.
    pub size: u64,
    /// Human-readable session name.
    pub description: String,
}

/// Append-only sink for ledger rows.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), SyncError>;
}

/// Ledger persisted as one JSON object per line in a local file.
pub struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Ledger for JsonlLedger {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// In-memory ledger, useful for tests.
#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), SyncError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Renders `2019-2020` for multi-year sessions, `2019` for single-year.
fn year_range(entry: &ManifestEntry) -> String {
    if entry.year_start == entry.year_end {
        entry.year_start.to_string()
    } else {
        format!("{}-{}", entry.year_start, entry.year_end)
    }
}

/// Records ledger rows for one region and builds its report lines.
///
/// `found_keys` is the blob store listing for the region's key prefix.
/// Every qualifying entry yields a found or not-found report line and,
/// unconditionally, a ledger row.
pub async fn record_region(
    region: &Region,
    entries: &[ManifestEntry],
    found_keys: &[String],
    from_year: i32,
    ledger: &dyn Ledger,
    storage_method: &str,
) -> Result<Vec<String>, SyncError> {
    let mut lines = Vec::new();
    for entry in entries.iter().filter(|e| entry_qualifies(e, region, from_year)) {
        let key = dataset_key(&region.code, entry.session_id);

        if found_keys.iter().any(|k| k == &key) {
            lines.push(format!(
                "Session {} Year: {} Date: {} Size: {} bytes",
                entry.session_id,
                year_range(entry),
                entry.dataset_date,
                entry.dataset_size
            ));
            lines.push(format!("Found session dataset: {}", key));
        } else {
            lines.push(format!("Item not found: {}", key));
        }

        ledger
            .append(&LedgerEntry {
                item_name: key,
                storage_method: storage_method.to_string(),
                generated_date: entry.dataset_date.clone(),
                hashcode: entry.dataset_hash.clone(),
                size: entry.dataset_size,
                description: entry.session_name.clone(),
            })
            .await?;
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(state_id: u32, session_id: u64, year_start: i32, year_end: i32) -> ManifestEntry {
        ManifestEntry {
            state_id,
            session_id,
            access_key: "ak".to_string(),
            year_start,
            year_end,
            dataset_date: "2024-01-01".to_string(),
            dataset_hash: "abc123".to_string(),
            dataset_size: 512,
            session_name: "Regular Session".to_string(),
        }
    }

    #[tokio::test]
    async fn found_dataset_reports_session_details() {
        let ledger = MemoryLedger::new();
        let region = Region::new("AZ", 3);
        let found = vec!["AZ-1748.json".to_string()];

        let lines = record_region(
            &region,
            &[entry(3, 1748, 2019, 2020)],
            &found,
            2018,
            &ledger,
            "MEMORY",
        )
        .await
        .unwrap();

        assert_eq!(
            lines,
            vec![
                "Session 1748 Year: 2019-2020 Date: 2024-01-01 Size: 512 bytes",
                "Found session dataset: AZ-1748.json",
            ]
        );
    }

    #[tokio::test]
    async fn single_year_sessions_render_one_year() {
        let ledger = MemoryLedger::new();
        let region = Region::new("AZ", 3);
        let found = vec!["AZ-1800.json".to_string()];

        let lines = record_region(
            &region,
            &[entry(3, 1800, 2021, 2021)],
            &found,
            2018,
            &ledger,
            "MEMORY",
        )
        .await
        .unwrap();

        assert_eq!(
            lines[0],
            "Session 1800 Year: 2021 Date: 2024-01-01 Size: 512 bytes"
        );
    }

    #[tokio::test]
    async fn missing_dataset_reports_not_found_but_still_ledgered() {
        let ledger = MemoryLedger::new();
        let region = Region::new("OH", 35);

        let lines = record_region(
            &region,
            &[entry(35, 1813, 2021, 2022)],
            &[],
            2018,
            &ledger,
            "FILE",
        )
        .await
        .unwrap();

        assert_eq!(lines, vec!["Item not found: OH-1813.json"]);
        let rows = ledger.entries();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_name, "OH-1813.json");
        assert_eq!(rows[0].storage_method, "FILE");
        assert_eq!(rows[0].hashcode, "abc123");
        assert_eq!(rows[0].size, 512);
    }

    #[tokio::test]
    async fn filtered_entries_never_reach_the_ledger() {
        let ledger = MemoryLedger::new();
        let region = Region::new("AZ", 3);

        let lines = record_region(
            &region,
            &[entry(3, 100, 2016, 2017), entry(35, 200, 2021, 2022)],
            &[],
            2018,
            &ledger,
            "MEMORY",
        )
        .await
        .unwrap();

        assert!(lines.is_empty());
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn jsonl_ledger_appends_one_row_per_observation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.jsonl");
        let ledger = JsonlLedger::new(&path);

        let row = LedgerEntry {
            item_name: "AZ-1748.json".to_string(),
            storage_method: "FILE".to_string(),
            generated_date: "2024-01-01".to_string(),
            hashcode: "abc123".to_string(),
            size: 512,
            description: "Regular Session".to_string(),
        };
        ledger.append(&row).await.unwrap();
        ledger.append(&row).await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let rows: Vec<LedgerEntry> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows, vec![row.clone(), row]);
    }
}
