//! Region catalog access.
//!
//! The catalog supplies the jurisdictions a run processes. It is treated
//! as an external collaborator; the bundled [`FileCatalog`] keeps it in a
//! JSON file and seeds the default U.S. state set when empty.

use crate::error::SyncError;
use crate::types::Region;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tracing::info;

/// Legiscan state ids and names for the 50 U.S. states plus DC, in
/// Legiscan's alphabetical enumeration order.
pub const DEFAULT_REGIONS: &[(&str, u32, &str)] = &[
    ("AL", 1, "Alabama"),
    ("AK", 2, "Alaska"),
    ("AZ", 3, "Arizona"),
    ("AR", 4, "Arkansas"),
    ("CA", 5, "California"),
    ("CO", 6, "Colorado"),
    ("CT", 7, "Connecticut"),
    ("DE", 8, "Delaware"),
    ("FL", 9, "Florida"),
    ("GA", 10, "Georgia"),
    ("HI", 11, "Hawaii"),
    ("ID", 12, "Idaho"),
    ("IL", 13, "Illinois"),
    ("IN", 14, "Indiana"),
    ("IA", 15, "Iowa"),
    ("KS", 16, "Kansas"),
    ("KY", 17, "Kentucky"),
    ("LA", 18, "Louisiana"),
    ("ME", 19, "Maine"),
    ("MD", 20, "Maryland"),
    ("MA", 21, "Massachusetts"),
    ("MI", 22, "Michigan"),
    ("MN", 23, "Minnesota"),
    ("MS", 24, "Mississippi"),
    ("MO", 25, "Missouri"),
    ("MT", 26, "Montana"),
    ("NE", 27, "Nebraska"),
    ("NV", 28, "Nevada"),
    ("NH", 29, "New Hampshire"),
    ("NJ", 30, "New Jersey"),
    ("NM", 31, "New Mexico"),
    ("NY", 32, "New York"),
    ("NC", 33, "North Carolina"),
    ("ND", 34, "North Dakota"),
    ("OH", 35, "Ohio"),
    ("OK", 36, "Oklahoma"),
    ("OR", 37, "Oregon"),
    ("PA", 38, "Pennsylvania"),
    ("RI", 39, "Rhode Island"),
    ("SC", 40, "South Carolina"),
    ("SD", 41, "South Dakota"),
    ("TN", 42, "Tennessee"),
    ("TX", 43, "Texas"),
    ("UT", 44, "Utah"),
    ("VT", 45, "Vermont"),
    ("VA", 46, "Virginia"),
    ("WA", 47, "Washington"),
    ("WV", 48, "West Virginia"),
    ("WI", 49, "Wisconsin"),
    ("WY", 50, "Wyoming"),
    ("DC", 51, "District of Columbia"),
];

/// Builds the default region list.
pub fn default_regions() -> Vec<Region> {
    DEFAULT_REGIONS
        .iter()
        .map(|&(code, id, name)| Region::new(code, id).with_description(name))
        .collect()
}

/// Supplies the regions to process, in catalog order.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn regions(&self) -> Result<Vec<Region>, SyncError>;
}

/// Catalog persisted as a JSON array of regions in a single file.
///
/// An absent or empty file is auto-populated with [`DEFAULT_REGIONS`],
/// mirroring how the reference catalog is seeded on first use.
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writes the default region set if the catalog file is absent or
    /// holds no regions. Idempotent; safe to call on a populated catalog.
    pub async fn ensure_defaults_loaded(&self) -> Result<(), SyncError> {
        match self.read_regions().await {
            Ok(regions) if !regions.is_empty() => Ok(()),
            Ok(_) | Err(SyncError::NotFound(_)) => {
                info!("catalog empty, loading default regions");
                let defaults = default_regions();
                let text = serde_json::to_string_pretty(&defaults)?;
                if let Some(parent) = self.path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&self.path, text).await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn read_regions(&self) -> Result<Vec<Region>, SyncError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SyncError::NotFound(self.path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CatalogProvider for FileCatalog {
    async fn regions(&self) -> Result<Vec<Region>, SyncError> {
        self.ensure_defaults_loaded().await?;
        self.read_regions().await
    }
}

/// Fixed in-memory catalog, useful for tests and single-region tooling.
pub struct StaticCatalog {
    regions: Vec<Region>,
}

impl StaticCatalog {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn regions(&self) -> Result<Vec<Region>, SyncError> {
        Ok(self.regions.clone())
    }
}
