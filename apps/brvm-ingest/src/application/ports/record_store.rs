//! Storage port for the batched upsert writer.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::RecordRow;

/// Errors surfaced by a record store.
///
/// The writer's retry loop keys off the variant: [`StoreError::Transient`]
/// failures are retried with backoff, everything else propagates
/// immediately.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient connectivity/operational failure; the batch may be
    /// retried as a whole.
    #[error("transient storage failure: {0}")]
    Transient(String),

    /// Non-transient failure (constraint violation, malformed value,
    /// closed pool); retrying cannot help.
    #[error("storage failure: {0}")]
    Fatal(String),

    /// A batch kept failing transiently until the retry budget ran out.
    #[error("retries exhausted after {attempts} attempts on batch {batch_index} of {table}: {message}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Zero-based index of the failing batch within the run.
        batch_index: usize,
        /// Target table.
        table: String,
        /// Last transient failure message.
        message: String,
    },
}

/// Insert-or-update storage for flattened records.
///
/// One call persists one batch: every row whose key already exists has
/// its non-key columns overwritten, every new key is inserted. A batch
/// either commits as a whole or leaves the table untouched, which is
/// what makes whole-batch retries safe.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Upsert one batch of rows into `table`, resolving conflicts on
    /// `key_column` by updating all other columns.
    async fn upsert_batch(
        &self,
        table: &str,
        key_column: &str,
        columns: &[&str],
        rows: &[RecordRow],
    ) -> Result<(), StoreError>;
}
