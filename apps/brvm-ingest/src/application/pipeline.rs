//! Pipeline orchestrator: raw rows -> extractor -> batched upsert
//! writer, once per dataset.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::record::ExtractionContext;
use crate::domain::{bond, capitalization, index, volume, UpsertRecord};
use crate::infrastructure::persistence::UpsertWriter;

use super::ports::{Dataset, RecordStore, RowSource, SourceError, StoreError};

/// Outcome of one dataset's run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Dataset that ran.
    pub dataset: Dataset,
    /// Raw rows received from the source (including skipped ones).
    pub rows_seen: usize,
    /// Typed records extracted.
    pub records: usize,
    /// Rows written to storage.
    pub written: usize,
}

/// A dataset run failure.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The row source failed to produce a dump.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The writer gave up on a batch.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Wires a row source to the upsert writer, one run per dataset.
pub struct IngestPipeline<Src, St> {
    source: Src,
    writer: UpsertWriter<St>,
}

impl<Src, St> IngestPipeline<Src, St>
where
    Src: RowSource,
    St: RecordStore,
{
    /// Build a pipeline over a source and a writer.
    pub const fn new(source: Src, writer: UpsertWriter<St>) -> Self {
        Self { source, writer }
    }

    /// Access the writer (for test inspection).
    #[must_use]
    pub const fn writer(&self) -> &UpsertWriter<St> {
        &self.writer
    }

    /// Run one dataset: fetch its dump, extract typed records, persist
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Source`] when no usable dump exists and
    /// [`IngestError::Store`] when persistence fails after retries.
    pub async fn run(&self, dataset: Dataset, run_date: NaiveDate) -> Result<RunSummary, IngestError> {
        let dump = self.source.fetch(dataset).await?;
        let mut ctx = ExtractionContext::new(run_date);
        if let Some(label) = dump.label {
            ctx = ctx.with_label(label);
        }

        let rows_seen = dump.rows.len();
        let summary = match dataset {
            Dataset::Bonds => {
                self.write(dataset, rows_seen, &bond::extract(&dump.rows, &ctx))
                    .await?
            }
            Dataset::Capitalizations => {
                self.write(dataset, rows_seen, &capitalization::extract(&dump.rows, &ctx))
                    .await?
            }
            Dataset::Indexes => {
                self.write(dataset, rows_seen, &index::extract(&dump.rows, &ctx))
                    .await?
            }
            Dataset::Volumes => {
                self.write(dataset, rows_seen, &volume::extract(&dump.rows, &ctx))
                    .await?
            }
        };

        info!(
            dataset = %summary.dataset,
            rows = summary.rows_seen,
            records = summary.records,
            written = summary.written,
            "dataset ingested"
        );
        Ok(summary)
    }

    /// Run every dataset in order, continuing past individual failures.
    ///
    /// Failures are logged here; the caller decides whether any failure
    /// fails the process.
    pub async fn run_all(&self, run_date: NaiveDate) -> Vec<(Dataset, Result<RunSummary, IngestError>)> {
        let mut outcomes = Vec::with_capacity(Dataset::ALL.len());
        for dataset in Dataset::ALL {
            let outcome = self.run(dataset, run_date).await;
            if let Err(err) = &outcome {
                error!(dataset = %dataset, error = %err, "dataset ingest failed");
            }
            outcomes.push((dataset, outcome));
        }
        outcomes
    }

    async fn write<R: UpsertRecord>(
        &self,
        dataset: Dataset,
        rows_seen: usize,
        records: &[R],
    ) -> Result<RunSummary, StoreError> {
        let written = self.writer.write_all(records).await?;
        Ok(RunSummary {
            dataset,
            rows_seen,
            records: records.len(),
            written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockRowSource, TableDump};
    use crate::infrastructure::persistence::InMemoryRecordStore;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn index_dump() -> TableDump {
        TableDump {
            label: None,
            rows: vec![
                vec![
                    "BRVM Composite".to_string(),
                    "237,19".to_string(),
                    "239,45".to_string(),
                    "0,95%".to_string(),
                    "12,04%".to_string(),
                ],
                // Trailing malformed row: skipped, not an error.
                vec![String::new()],
            ],
        }
    }

    #[tokio::test]
    async fn run_extracts_and_persists_one_dataset() {
        let mut source = MockRowSource::new();
        source.expect_fetch().returning(|_| Ok(index_dump()));
        let pipeline = IngestPipeline::new(source, UpsertWriter::new(InMemoryRecordStore::new()));

        let summary = pipeline.run(Dataset::Indexes, run_date()).await.unwrap();

        assert_eq!(summary.rows_seen, 2);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.written, 1);
        let store = pipeline.writer().store();
        assert!(store.get("indexes", "BRVM Composite-2024-06-01").is_some());
    }

    #[tokio::test]
    async fn source_failure_surfaces_as_ingest_error() {
        let mut source = MockRowSource::new();
        source
            .expect_fetch()
            .returning(|dataset| Err(SourceError::Missing(dataset)));
        let pipeline = IngestPipeline::new(source, UpsertWriter::new(InMemoryRecordStore::new()));

        let err = pipeline.run(Dataset::Bonds, run_date()).await.unwrap_err();

        assert!(matches!(err, IngestError::Source(SourceError::Missing(_))));
    }

    #[tokio::test]
    async fn run_all_continues_past_a_failing_dataset() {
        let mut source = MockRowSource::new();
        source.expect_fetch().returning(|dataset| match dataset {
            Dataset::Bonds => Err(SourceError::Missing(dataset)),
            _ => Ok(index_dump()),
        });
        let pipeline = IngestPipeline::new(source, UpsertWriter::new(InMemoryRecordStore::new()));

        let outcomes = pipeline.run_all(run_date()).await;

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].1.is_err()); // bonds
        assert!(outcomes.iter().skip(1).all(|(_, r)| r.is_ok()));
    }
}
