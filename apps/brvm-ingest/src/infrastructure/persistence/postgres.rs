//! PostgreSQL record store.
//!
//! Persists flattened records with `INSERT ... ON CONFLICT (id) DO
//! UPDATE SET col = EXCLUDED.col` statements, one statement per row
//! inside one transaction per batch. A failed batch rolls back whole,
//! which keeps whole-batch retries safe.

use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tracing::info;

use crate::application::ports::{RecordStore, StoreError};
use crate::domain::{RecordRow, SqlValue};

use async_trait::async_trait;

/// [`RecordStore`] backed by a PostgreSQL connection pool.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| classify(&e))?;

        info!(
            max_connections = max_connections,
            "PostgreSQL connection pool initialized"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool (for testing).
    #[must_use]
    pub const fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Build the per-row upsert statement for a table.
///
/// Table and column names come from the static column lists on the
/// record types, never from input data.
fn upsert_sql(table: &str, key_column: &str, columns: &[&str]) -> String {
    let column_list = columns.join(", ");
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    let updates: Vec<String> = columns
        .iter()
        .filter(|c| **c != key_column)
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();
    format!(
        "INSERT INTO {table} ({column_list}) VALUES ({values}) \
         ON CONFLICT ({key_column}) DO UPDATE SET {updates}",
        values = placeholders.join(", "),
        updates = updates.join(", "),
    )
}

/// Bind one typed value, keeping NULLs typed for the target column.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Text(v) => query.bind(v.as_deref()),
        SqlValue::Decimal(v) => query.bind(*v),
        SqlValue::BigInt(v) => query.bind(*v),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Date(v) => query.bind(*v),
    }
}

/// Sort a driver error into the writer's retry taxonomy.
///
/// Connectivity and wire-level failures are transient; everything the database
/// itself rejected (constraints, types) is fatal.
fn classify(err: &sqlx::Error) -> StoreError {
    let message = err.to_string();
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::WorkerCrashed => StoreError::Transient(message),
        _ => StoreError::Fatal(message),
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn upsert_batch(
        &self,
        table: &str,
        key_column: &str,
        columns: &[&str],
        rows: &[RecordRow],
    ) -> Result<(), StoreError> {
        let sql = upsert_sql(table, key_column, columns);

        let mut tx = self.pool.begin().await.map_err(|e| classify(&e))?;
        for row in rows {
            let mut query = sqlx::query(&sql);
            for value in &row.values {
                query = bind_value(query, value);
            }
            query.execute(&mut *tx).await.map_err(|e| classify(&e))?;
        }
        tx.commit().await.map_err(|e| classify(&e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_sql_updates_every_non_key_column() {
        let sql = upsert_sql("indexes", "id", &["id", "index_name", "close"]);
        assert_eq!(
            sql,
            "INSERT INTO indexes (id, index_name, close) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET index_name = EXCLUDED.index_name, \
             close = EXCLUDED.close"
        );
    }

    #[test]
    fn pool_timeout_is_transient() {
        assert!(matches!(
            classify(&sqlx::Error::PoolTimedOut),
            StoreError::Transient(_)
        ));
    }

    #[test]
    fn protocol_error_is_transient() {
        assert!(matches!(
            classify(&sqlx::Error::Protocol("unexpected message".to_string())),
            StoreError::Transient(_)
        ));
    }

    #[test]
    fn row_not_found_is_fatal() {
        assert!(matches!(
            classify(&sqlx::Error::RowNotFound),
            StoreError::Fatal(_)
        ));
    }
}
