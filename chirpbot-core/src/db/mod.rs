// chirpbot-core/src/db/mod.rs

use std::str::FromStr;
use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info};

use crate::Error;

/// Shape of one logical key/value table. Every column is `TEXT NOT NULL`;
/// the key column is the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub key_column: &'static str,
    pub value_columns: &'static [&'static str],
}

impl TableSchema {
    fn column_list(&self) -> String {
        std::iter::once(self.key_column)
            .chain(self.value_columns.iter().copied())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One row of a [`TableSchema`] table, values in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvRecord {
    pub key: String,
    pub values: Vec<String>,
}

/// A SQLite-backed durable table store. One `Database` per file.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) the SQLite file at `database_path`.
    /// `":memory:"` opens a private in-memory database.
    pub async fn new(database_path: &str) -> Result<Self, Error> {
        if database_path == ":memory:" {
            return Self::in_memory().await;
        }

        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("Connected to SQLite database at {}", database_path);
        Ok(Self { pool })
    }

    /// In-memory database. A single long-lived connection, otherwise every
    /// pooled connection would see its own empty database.
    pub async fn in_memory() -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Waits for checked-out connections to come back, then closes them.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub async fn create_table_if_absent(&self, schema: &TableSchema) -> Result<(), Error> {
        let mut columns = vec![format!("{} TEXT PRIMARY KEY", schema.key_column)];
        columns.extend(schema.value_columns.iter().map(|c| format!("{c} TEXT NOT NULL")));
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {}({})",
            schema.name,
            columns.join(", ")
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        debug!("ensured table '{}'", schema.name);
        Ok(())
    }

    /// Insert `key` or overwrite every value column of the existing row.
    /// A single statement, so the write is atomic.
    pub async fn upsert(&self, schema: &TableSchema, key: &str, values: &[&str]) -> Result<(), Error> {
        if values.len() != schema.value_columns.len() {
            return Err(Error::Storage(format!(
                "table '{}' expects {} value(s), got {}",
                schema.name,
                schema.value_columns.len(),
                values.len()
            )));
        }

        let placeholders = vec!["?"; values.len() + 1].join(", ");
        let updates = schema
            .value_columns
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {}",
            schema.name,
            schema.column_list(),
            placeholders,
            schema.key_column,
            updates
        );

        let mut query = sqlx::query(&sql).bind(key);
        for v in values {
            query = query.bind(*v);
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    pub async fn fetch_all(&self, schema: &TableSchema) -> Result<Vec<KvRecord>, Error> {
        let sql = format!("SELECT {} FROM {}", schema.column_list(), schema.name);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get(0)?;
            let mut values = Vec::with_capacity(schema.value_columns.len());
            for idx in 1..=schema.value_columns.len() {
                values.push(row.try_get::<String, _>(idx)?);
            }
            records.push(KvRecord { key, values });
        }
        Ok(records)
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(&self, schema: &TableSchema, key: &str) -> Result<bool, Error> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", schema.name, schema.key_column);
        let res = sqlx::query(&sql).bind(key).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: TableSchema = TableSchema {
        name: "pairs",
        key_column: "k",
        value_columns: &["a", "b"],
    };

    #[tokio::test]
    async fn create_table_is_idempotent() -> Result<(), Error> {
        let db = Database::in_memory().await?;
        db.create_table_if_absent(&PAIRS).await?;
        db.upsert(&PAIRS, "one", &["x", "y"]).await?;
        db.create_table_if_absent(&PAIRS).await?;
        assert_eq!(db.fetch_all(&PAIRS).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_overwrites_every_value_column() -> Result<(), Error> {
        let db = Database::in_memory().await?;
        db.create_table_if_absent(&PAIRS).await?;
        db.upsert(&PAIRS, "one", &["x", "y"]).await?;
        db.upsert(&PAIRS, "one", &["x2", "y2"]).await?;

        let rows = db.fetch_all(&PAIRS).await?;
        assert_eq!(
            rows,
            vec![KvRecord { key: "one".into(), values: vec!["x2".into(), "y2".into()] }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_arity() -> Result<(), Error> {
        let db = Database::in_memory().await?;
        db.create_table_if_absent(&PAIRS).await?;
        let err = db.upsert(&PAIRS, "one", &["only-one"]).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(db.fetch_all(&PAIRS).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_went_away() -> Result<(), Error> {
        let db = Database::in_memory().await?;
        db.create_table_if_absent(&PAIRS).await?;
        db.upsert(&PAIRS, "one", &["x", "y"]).await?;
        assert!(db.delete(&PAIRS, "one").await?);
        assert!(!db.delete(&PAIRS, "one").await?);
        assert!(db.fetch_all(&PAIRS).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn operations_on_a_closed_database_are_storage_errors() -> Result<(), Error> {
        let db = Database::in_memory().await?;
        db.create_table_if_absent(&PAIRS).await?;
        db.close().await;
        assert!(db.is_closed());
        let err = db.fetch_all(&PAIRS).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_upserts_to_different_keys_all_land() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("kv.db");
        let db = Database::new(path.to_str().unwrap_or_default()).await?;
        db.create_table_if_absent(&PAIRS).await?;

        let mut handles = Vec::new();
        for i in 0..20 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("k{i}");
                db.upsert(&PAIRS, &key, &["a", "b"]).await
            }));
        }
        for h in handles {
            h.await.expect("task panicked")?;
        }

        assert_eq!(db.fetch_all(&PAIRS).await?.len(), 20);
        db.close().await;
        Ok(())
    }
}
