//! Persistence adapters - the batched upsert writer and its stores.

pub mod in_memory;
pub mod postgres;
pub mod retry;
pub mod writer;

pub use in_memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;
pub use retry::{BackoffCalculator, RetryPolicy};
pub use writer::{UpsertWriter, DEFAULT_BATCH_SIZE};
