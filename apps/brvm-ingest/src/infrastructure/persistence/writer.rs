//! Batched upsert writer.
//!
//! Chunks a run's records into bounded batches and drives them through a
//! [`RecordStore`] with bounded retry: transient failures re-run the
//! whole batch after a backoff delay, anything else aborts the run.
//! Upserts are idempotent per id, so re-running a batch (or the whole
//! pipeline) after a failure is always safe.

use tracing::{debug, warn};

use crate::application::ports::{RecordStore, StoreError};
use crate::domain::{RecordRow, UpsertRecord};

use super::retry::{BackoffCalculator, RetryPolicy};

/// Default batch size, bounding transaction and memory footprint.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Writer persisting record sequences in bounded, retried batches.
pub struct UpsertWriter<S> {
    store: S,
    batch_size: usize,
    policy: RetryPolicy,
}

impl<S: RecordStore> UpsertWriter<S> {
    /// Writer with the default batch size and retry policy.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            policy: RetryPolicy::default(),
        }
    }

    /// Override the batch size (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Access the wrapped store (for test inspection).
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Persist all records, returning how many rows were written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RetriesExhausted`] when a batch keeps
    /// failing transiently, or the store's error for non-transient
    /// failures. Batches committed before the failure stay durable.
    pub async fn write_all<R: UpsertRecord>(&self, records: &[R]) -> Result<usize, StoreError> {
        let rows: Vec<RecordRow> = records.iter().map(UpsertRecord::to_row).collect();
        for (batch_index, batch) in rows.chunks(self.batch_size).enumerate() {
            self.write_batch::<R>(batch_index, batch).await?;
            debug!(
                table = R::TABLE,
                batch = batch_index,
                rows = batch.len(),
                "batch committed"
            );
        }
        Ok(rows.len())
    }

    async fn write_batch<R: UpsertRecord>(
        &self,
        batch_index: usize,
        batch: &[RecordRow],
    ) -> Result<(), StoreError> {
        let mut backoff = BackoffCalculator::new(&self.policy);
        loop {
            match self
                .store
                .upsert_batch(R::TABLE, R::KEY_COLUMN, R::columns(), batch)
                .await
            {
                Ok(()) => return Ok(()),
                Err(StoreError::Transient(message)) => match backoff.next_delay() {
                    Some(delay) => {
                        warn!(
                            table = R::TABLE,
                            batch = batch_index,
                            attempt = backoff.attempts_made(),
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %message,
                            "transient failure, retrying batch"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(StoreError::RetriesExhausted {
                            attempts: backoff.attempts_made(),
                            batch_index,
                            table: R::TABLE.to_string(),
                            message,
                        });
                    }
                },
                Err(other) => return Err(other),
            }
        }
    }
}
