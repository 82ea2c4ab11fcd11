//! Domain layer - pure normalization and extraction logic.
//!
//! Nothing in this layer touches I/O. Raw table rows (sequences of
//! trimmed text cells) plus an [`record::ExtractionContext`] go in,
//! typed immutable records come out, each able to derive its natural
//! storage key and flatten itself to typed SQL values.

pub mod bond;
pub mod capitalization;
pub mod index;
pub mod normalize;
pub mod record;
pub mod volume;

pub use bond::{BondNameParts, BondQuote};
pub use capitalization::CapitalizationSnapshot;
pub use index::IndexSnapshot;
pub use record::{ExtractionContext, RecordRow, SqlValue, UpsertRecord};
pub use volume::VolumeSnapshot;
