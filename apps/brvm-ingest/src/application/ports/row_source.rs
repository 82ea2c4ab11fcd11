//! Row source port - the external collaborator that yields raw table
//! rows.
//!
//! Page retrieval (browser automation, DOM traversal) happens outside
//! this system; whatever does it hands over one [`TableDump`] per
//! dataset: the table rows as trimmed text cells plus the optional
//! page-level label found next to the table.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four scraped datasets, one per target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Bond board (`obligations`).
    Bonds,
    /// Market capitalizations (`capitalisation`).
    Capitalizations,
    /// Index closes (`indexes`).
    Indexes,
    /// Traded volumes (`volumes`).
    Volumes,
}

impl Dataset {
    /// All datasets in the order the original jobs run.
    pub const ALL: [Self; 4] = [
        Self::Bonds,
        Self::Capitalizations,
        Self::Indexes,
        Self::Volumes,
    ];

    /// Stable lowercase name, used for dump file names and logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bonds => "bonds",
            Self::Capitalizations => "capitalisation",
            Self::Indexes => "indexes",
            Self::Volumes => "volumes",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw scrape output for one dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDump {
    /// Page-level label text (e.g. `"Last update: 01/15/2024"`), if the
    /// page exposed one.
    #[serde(default)]
    pub label: Option<String>,
    /// Table rows, each a sequence of trimmed text cells.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// Errors surfaced by a row source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The dump for a dataset is missing.
    #[error("no dump found for dataset '{0}'")]
    Missing(Dataset),

    /// The dump could not be read.
    #[error("failed to read dump for dataset '{dataset}': {source}")]
    Io {
        /// Dataset whose dump failed to read.
        dataset: Dataset,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The dump could not be decoded.
    #[error("failed to decode dump for dataset '{dataset}': {source}")]
    Decode {
        /// Dataset whose dump failed to decode.
        dataset: Dataset,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Supplier of raw table rows, one dump per dataset.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch the raw dump for one dataset.
    async fn fetch(&self, dataset: Dataset) -> Result<TableDump, SourceError>;
}
