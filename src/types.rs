//! Data structures for synchronization runs.

use serde::{Deserialize, Serialize};

/// A jurisdiction to synchronize, e.g. a U.S. state.
///
/// `external_id` is the numeric identifier Legiscan assigns to the
/// jurisdiction (`state_id` in dataset list entries).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Two-letter uppercase code, e.g. `"AZ"` or `"OH"`.
    pub code: String,
    /// Legiscan state id matched against `ManifestEntry::state_id`.
    pub external_id: u32,
    /// Human-readable name, e.g. `"Arizona"`. May be empty for catalog
    /// entries recorded before descriptions were kept.
    #[serde(default)]
    pub description: String,
}

impl Region {
    pub fn new(code: impl Into<String>, external_id: u32) -> Self {
        Self {
            code: code.into(),
            external_id,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Name used in logs and report headers; falls back to the code
    /// when no description is recorded.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.code
        } else {
            &self.description
        }
    }
}

/// Configuration for a single synchronization run.
///
/// All state here is created at run start and discarded at run end; the
/// only cross-run persistence is what lands in the blob store and ledger.
///
/// # Example
///
/// ```
/// use legisync::SyncConfig;
///
/// let config = SyncConfig {
///     use_api: true,
///     state: Some("AZ".to_string()),
///     ..SyncConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Invoke the remote API for stale manifests and missing datasets.
    /// When false, the run only reports on what storage already holds.
    pub use_api: bool,
    /// Restrict the fetch phase to a single region code. The final
    /// report still covers every region in the catalog.
    pub state: Option<String>,
    /// Days before a cached DatasetList is considered stale.
    pub frequency_days: i64,
    /// Sessions whose `year_end` precedes this year are ignored.
    pub from_year: i32,
    /// Dataset quality filter forwarded to the manifest request.
    pub quality: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            use_api: false,
            state: None,
            frequency_days: 7,
            from_year: 2018,
            quality: "Good".to_string(),
        }
    }
}
