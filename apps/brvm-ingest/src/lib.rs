// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::items_after_statements
    )
)]

//! BRVM Ingest - Normalization and Upsert Pipeline
//!
//! Takes raw table rows scraped from the BRVM exchange pages (bonds,
//! capitalizations, indexes, volumes), normalizes their noisy text cells
//! into typed records, derives a stable natural key per record and
//! upserts everything into PostgreSQL in bounded, retried batches.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: pure parsing - field normalizers, per-dataset record
//!   extractors, natural-key derivation. No I/O.
//! - **Application**: ports (`RowSource`, `RecordStore`) and the
//!   per-dataset pipeline orchestrator.
//! - **Infrastructure**: the PostgreSQL upsert store, the batched
//!   writer with retry/backoff, an in-memory store for tests, and the
//!   JSON dump row source.
//!
//! Page retrieval (browser automation) is an external collaborator; it
//! hands rows over as JSON dumps, one per dataset.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - pure normalization and extraction logic.
pub mod domain;

/// Application layer - ports and pipeline orchestration.
pub mod application;

/// Infrastructure layer - storage and source adapters.
pub mod infrastructure;

/// Environment-driven configuration.
pub mod config;

pub use application::{IngestError, IngestPipeline, RunSummary};
pub use domain::{
    BondQuote, CapitalizationSnapshot, ExtractionContext, IndexSnapshot, UpsertRecord,
    VolumeSnapshot,
};
pub use infrastructure::persistence::{
    InMemoryRecordStore, PgRecordStore, RetryPolicy, UpsertWriter,
};
pub use infrastructure::source::JsonDumpSource;
