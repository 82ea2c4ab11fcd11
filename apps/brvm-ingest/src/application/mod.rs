//! Application layer - ports and the per-dataset ingest pipeline.

pub mod pipeline;
pub mod ports;

pub use pipeline::{IngestError, IngestPipeline, RunSummary};
