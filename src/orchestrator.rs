//! Run orchestration: manifest resolution, per-region fetch, reporting.

use crate::api::RemoteApi;
use crate::catalog::CatalogProvider;
use crate::error::SyncError;
use crate::fetch::fetch_missing;
use crate::ledger::{record_region, Ledger};
use crate::manifest;
use crate::store::BlobStore;
use crate::types::SyncConfig;
use chrono::NaiveDate;
use tracing::{error, info};

/// Runs one full synchronization pass.
///
/// The dataset list is resolved once; failure there is fatal since no
/// per-region work is possible without it. Regions are then processed
/// sequentially in catalog order: the fetch phase honors the optional
/// single-region filter and isolates per-region failures, the report
/// phase covers every region and appends ledger rows for each
/// qualifying dataset list entry.
pub async fn run_sync(
    config: &SyncConfig,
    store: &dyn BlobStore,
    api: &dyn RemoteApi,
    catalog: &dyn CatalogProvider,
    ledger: &dyn Ledger,
    today: NaiveDate,
) -> Result<(), SyncError> {
    let manifest = manifest::resolve(store, api, config, today).await?;
    info!(
        "DatasetList {} holds {} entries",
        manifest.source_key,
        manifest.entries.len()
    );

    let regions = catalog.regions().await?;

    let pb = indicatif::ProgressBar::new(regions.len() as u64);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg} | {elapsed_precise} elapsed")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );

    for region in &regions {
        if let Some(filter) = &config.state {
            if &region.code != filter {
                pb.inc(1);
                continue;
            }
        }
        info!("Processing: {} ({})", region.label(), region.code);
        pb.set_message(format!("| Fetching datasets for {}", region.code));

        // A region that fails to fetch still gets reported; the others
        // proceed untouched.
        if let Err(e) = fetch_missing(
            region,
            &manifest.entries,
            api,
            store,
            config.use_api,
            config.from_year,
        )
        .await
        {
            error!("fetch phase failed for {}: {}", region.code, e);
        }
        pb.inc(1);
    }
    pb.finish_with_message("| Fetch phase complete");

    // The report always covers the whole catalog, even when the fetch
    // phase was restricted to a single region.
    for region in &regions {
        let found = store.list_keys(&format!("{}-", region.code)).await?;
        let lines = record_region(
            region,
            &manifest.entries,
            &found,
            config.from_year,
            ledger,
            store.method(),
        )
        .await?;

        println!();
        println!("{} ({})", region.label(), region.code);
        for line in lines {
            println!("{}", line);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockApi;
    use crate::catalog::StaticCatalog;
    use crate::ledger::MemoryLedger;
    use crate::store::MemoryStore;
    use crate::types::Region;

    fn entry_json(state_id: u32, session_id: u64, year_end: i32) -> String {
        format!(
            r#"{{"state_id":{},"session_id":{},"access_key":"ak","year_start":{},"year_end":{},
                "dataset_date":"2024-01-01","dataset_hash":"abc123","dataset_size":512,
                "session_name":"Regular Session"}}"#,
            state_id,
            session_id,
            year_end - 1,
            year_end
        )
    }

    fn list_json(entries: &[String]) -> String {
        format!(r#"{{"status":"OK","datasetlist":[{}]}}"#, entries.join(","))
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn non_ok_status_aborts_before_any_dataset_fetch() {
        let store = MemoryStore::new();
        store
            .upload(
                "DatasetList-2024-01-01.json",
                r#"{"status":"ERROR","datasetlist":[]}"#,
            )
            .await
            .unwrap();
        let api = MockApi::new(10).with_dataset(1748, "payload");
        let catalog = StaticCatalog::new(vec![Region::new("AZ", 3)]);
        let ledger = MemoryLedger::new();

        let err = run_sync(
            &SyncConfig::default(),
            &store,
            &api,
            &catalog,
            &ledger,
            day(2024, 1, 2),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SyncError::ManifestStatus { .. }));
        assert!(err.is_fatal());
        assert_eq!(api.dataset_calls(), 0);
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn full_run_fetches_reports_and_ledgers() {
        let store = MemoryStore::new();
        store
            .upload(
                "DatasetList-2024-01-01.json",
                &list_json(&[
                    entry_json(3, 1748, 2020),
                    entry_json(35, 1813, 2022),
                    entry_json(35, 900, 2016), // filtered by from_year
                ]),
            )
            .await
            .unwrap();
        let api = MockApi::new(10)
            .with_dataset(1748, "az data")
            .with_dataset(1813, "oh data");
        let catalog = StaticCatalog::new(vec![Region::new("AZ", 3), Region::new("OH", 35)]);
        let ledger = MemoryLedger::new();
        let config = SyncConfig {
            use_api: true,
            ..SyncConfig::default()
        };

        run_sync(&config, &store, &api, &catalog, &ledger, day(2024, 1, 2))
            .await
            .unwrap();

        // Cache was fresh, so no remote manifest call.
        assert_eq!(api.list_calls(), 0);
        assert_eq!(api.dataset_calls(), 2);
        assert_eq!(store.download("AZ-1748.json").await.unwrap(), "az data");
        assert_eq!(store.download("OH-1813.json").await.unwrap(), "oh data");

        let rows = ledger.entries();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item_name, "AZ-1748.json");
        assert_eq!(rows[1].item_name, "OH-1813.json");
        assert!(rows.iter().all(|r| r.storage_method == "MEMORY"));
    }

    #[tokio::test]
    async fn state_filter_restricts_fetch_but_not_report() {
        let store = MemoryStore::new();
        store
            .upload(
                "DatasetList-2024-01-01.json",
                &list_json(&[entry_json(3, 1748, 2020), entry_json(35, 1813, 2022)]),
            )
            .await
            .unwrap();
        let api = MockApi::new(10)
            .with_dataset(1748, "az data")
            .with_dataset(1813, "oh data");
        let catalog = StaticCatalog::new(vec![Region::new("AZ", 3), Region::new("OH", 35)]);
        let ledger = MemoryLedger::new();
        let config = SyncConfig {
            use_api: true,
            state: Some("AZ".to_string()),
            ..SyncConfig::default()
        };

        run_sync(&config, &store, &api, &catalog, &ledger, day(2024, 1, 2))
            .await
            .unwrap();

        // Only AZ was fetched, yet both regions were ledgered.
        assert_eq!(api.dataset_calls(), 1);
        assert!(store.download("OH-1813.json").await.is_err());
        let rows = ledger.entries();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].item_name, "OH-1813.json");
    }

    #[tokio::test]
    async fn missing_manifest_everywhere_is_fatal() {
        let store = MemoryStore::new();
        let api = MockApi::new(10);
        let catalog = StaticCatalog::new(vec![Region::new("AZ", 3)]);
        let ledger = MemoryLedger::new();

        let err = run_sync(
            &SyncConfig::default(),
            &store,
            &api,
            &catalog,
            &ledger,
            day(2024, 1, 2),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SyncError::ManifestUnavailable));
    }

    #[tokio::test]
    async fn stale_manifest_refresh_feeds_the_same_run() {
        let store = MemoryStore::new();
        store
            .upload("DatasetList-2023-01-01.json", &list_json(&[]))
            .await
            .unwrap();
        let api = MockApi::new(10)
            .with_list(&list_json(&[entry_json(3, 1748, 2020)]))
            .with_dataset(1748, "az data");
        let catalog = StaticCatalog::new(vec![Region::new("AZ", 3)]);
        let ledger = MemoryLedger::new();
        let config = SyncConfig {
            use_api: true,
            ..SyncConfig::default()
        };

        run_sync(&config, &store, &api, &catalog, &ledger, day(2024, 1, 2))
            .await
            .unwrap();

        assert_eq!(api.list_calls(), 1);
        assert_eq!(store.download("AZ-1748.json").await.unwrap(), "az data");
        assert!(store
            .download("DatasetList-2024-01-02.json")
            .await
            .is_ok());
    }
}
