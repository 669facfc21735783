//! LegiSync - Synchronize legislative session datasets into file/object storage
//!
//! This library keeps a local file/object store in step with the Legiscan API
//! while staying inside the API's hard fetch quota. Each run resolves a dated
//! `DatasetList-YYYY-MM-DD.json` manifest (reusing a cached copy when it is
//! recent enough), fetches only the per-session datasets the manifest selects,
//! and appends a hash ledger row per expected dataset for future change
//! detection.
//!
//! # Features
//!
//! - **Manifest caching**: A cached DatasetList younger than the configured
//!   frequency is reused without touching the API
//! - **Quota-aware fetching**: Remote calls stop silently once the run's
//!   fetch budget is spent
//! - **Write-once datasets**: Session datasets land under deterministic
//!   `SS-NNNN.json` keys and persist across runs
//! - **Change-detection ledger**: Every run records the manifest's hash,
//!   size and date per expected dataset
//!
//! # Example
//!
//! ```no_run
//! use legisync::{run_sync, FileCatalog, FsStore, JsonlLedger, LegiscanClient, SyncConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FsStore::new("fob")?;
//! let api = LegiscanClient::new("https://api.legiscan.com/", "my-key", 100);
//! let catalog = FileCatalog::new("fob/regions.json");
//! let ledger = JsonlLedger::new("fob/hashes.jsonl");
//!
//! let config = SyncConfig {
//!     use_api: true,
//!     ..SyncConfig::default()
//! };
//! let today = chrono::Utc::now().date_naive();
//! run_sync(&config, &store, &api, &catalog, &ledger, today).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod catalog;
pub mod error;
pub mod fetch;
pub mod ledger;
pub mod manifest;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use api::{LegiscanClient, RemoteApi};
pub use catalog::{CatalogProvider, FileCatalog, StaticCatalog};
pub use error::SyncError;
pub use ledger::{JsonlLedger, Ledger, LedgerEntry, MemoryLedger};
pub use manifest::{Manifest, ManifestEntry};
pub use orchestrator::run_sync;
pub use store::{BlobStore, FsStore, MemoryStore};
pub use types::{Region, SyncConfig};
