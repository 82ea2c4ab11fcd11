//! In-memory record store for testing.
//!
//! Mirrors the upsert contract of the PostgreSQL adapter over a
//! `HashMap`, with a small failure script so tests can exercise the
//! writer's retry discipline without a database. Not for production use.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{RecordStore, StoreError};
use crate::domain::RecordRow;

/// Per-table state: keyed rows upsert, keyless rows append.
#[derive(Debug, Default, Clone)]
struct TableState {
    keyed: HashMap<String, RecordRow>,
    keyless: Vec<RecordRow>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, TableState>,
    batch_calls: usize,
    pending_transient: u32,
    pending_fatal: u32,
    fatal_after: Option<u32>,
}

/// In-memory implementation of [`RecordStore`].
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: Mutex<Inner>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` batch calls with a transient error.
    pub fn fail_transient(&self, n: u32) {
        self.lock().pending_transient = n;
    }

    /// Fail the next `n` batch calls with a fatal error.
    pub fn fail_fatal(&self, n: u32) {
        self.lock().pending_fatal = n;
    }

    /// Let `n` batch calls succeed, then fail the next one fatally.
    pub fn fail_fatal_after(&self, n: u32) {
        self.lock().fatal_after = Some(n);
    }

    /// Number of `upsert_batch` calls seen, including failed ones.
    #[must_use]
    pub fn batch_calls(&self) -> usize {
        self.lock().batch_calls
    }

    /// Number of stored rows in a table (keyed plus keyless).
    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        let inner = self.lock();
        inner
            .tables
            .get(table)
            .map_or(0, |t| t.keyed.len() + t.keyless.len())
    }

    /// Whether a table has no rows.
    #[must_use]
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Number of keyless (NULL-id) rows in a table.
    #[must_use]
    pub fn keyless_len(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, |t| t.keyless.len())
    }

    /// Fetch a keyed row by id.
    #[must_use]
    pub fn get(&self, table: &str, id: &str) -> Option<RecordRow> {
        self.lock()
            .tables
            .get(table)
            .and_then(|t| t.keyed.get(id).cloned())
    }

    #[allow(clippy::unwrap_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn upsert_batch(
        &self,
        table: &str,
        _key_column: &str,
        _columns: &[&str],
        rows: &[RecordRow],
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.batch_calls += 1;

        if inner.pending_transient > 0 {
            inner.pending_transient -= 1;
            return Err(StoreError::Transient("scripted transient failure".into()));
        }
        if inner.pending_fatal > 0 {
            inner.pending_fatal -= 1;
            return Err(StoreError::Fatal("scripted fatal failure".into()));
        }
        if let Some(remaining) = inner.fatal_after {
            if remaining == 0 {
                inner.fatal_after = None;
                return Err(StoreError::Fatal("scripted fatal failure".into()));
            }
            inner.fatal_after = Some(remaining - 1);
        }

        let state = inner.tables.entry(table.to_string()).or_default();
        for row in rows {
            match &row.key {
                Some(id) => {
                    state.keyed.insert(id.clone(), row.clone());
                }
                None => state.keyless.push(row.clone()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SqlValue;

    fn row(key: Option<&str>, value: i64) -> RecordRow {
        RecordRow::new(key.map(String::from), vec![SqlValue::from(value)])
    }

    #[tokio::test]
    async fn upsert_overwrites_on_same_key() {
        let store = InMemoryRecordStore::new();
        let cols = ["id", "value"];

        store
            .upsert_batch("t", "id", &cols, &[row(Some("a"), 1)])
            .await
            .unwrap();
        store
            .upsert_batch("t", "id", &cols, &[row(Some("a"), 2)])
            .await
            .unwrap();

        assert_eq!(store.len("t"), 1);
        let stored = store.get("t", "a").unwrap();
        assert_eq!(stored.values[1], SqlValue::from(2_i64));
    }

    #[tokio::test]
    async fn keyless_rows_append_instead_of_conflicting() {
        let store = InMemoryRecordStore::new();
        let cols = ["id", "value"];

        store
            .upsert_batch("t", "id", &cols, &[row(None, 1), row(None, 2)])
            .await
            .unwrap();

        assert_eq!(store.len("t"), 2);
        assert_eq!(store.keyless_len("t"), 2);
    }

    #[tokio::test]
    async fn scripted_failures_fire_in_order() {
        let store = InMemoryRecordStore::new();
        store.fail_transient(1);
        let cols = ["id", "value"];

        let err = store
            .upsert_batch("t", "id", &cols, &[row(Some("a"), 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transient(_)));

        store
            .upsert_batch("t", "id", &cols, &[row(Some("a"), 1)])
            .await
            .unwrap();
        assert_eq!(store.batch_calls(), 2);
        assert_eq!(store.len("t"), 1);
    }
}
