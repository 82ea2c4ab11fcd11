//! Row source adapters.
//!
//! The scraper (browser automation, outside this system) writes one JSON
//! dump per dataset:
//!
//! ```json
//! { "label": "Last update: 01/15/2024", "rows": [["SNTS", "SONATEL SN", "..."]] }
//! ```
//!
//! [`JsonDumpSource`] reads those dumps from a directory, named
//! `<dataset>.json`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{Dataset, RowSource, SourceError, TableDump};

/// [`RowSource`] reading per-dataset JSON dumps from a directory.
#[derive(Debug, Clone)]
pub struct JsonDumpSource {
    dir: PathBuf,
}

impl JsonDumpSource {
    /// Source rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Dump path for one dataset.
    #[must_use]
    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        self.dir.join(format!("{}.json", dataset.name()))
    }

    /// Directory this source reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl RowSource for JsonDumpSource {
    async fn fetch(&self, dataset: Dataset) -> Result<TableDump, SourceError> {
        let path = self.path_for(dataset);
        if !path.exists() {
            return Err(SourceError::Missing(dataset));
        }
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| SourceError::Io { dataset, source })?;
        serde_json::from_slice(&raw).map_err(|source| SourceError::Decode { dataset, source })
    }
}
