//! Ports - interfaces the core depends on, implemented by
//! infrastructure adapters.

mod record_store;
mod row_source;

pub use record_store::{RecordStore, StoreError};
pub use row_source::{Dataset, RowSource, SourceError, TableDump};

#[cfg(test)]
pub use row_source::MockRowSource;
