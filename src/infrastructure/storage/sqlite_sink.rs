//! Relational sink backed by a SQLite file
//!
//! The table is created on first use and only ever appended to. The
//! connection pool lives for a single `write_batch` call.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{PersistenceError, RecordSink};
use crate::domain::salary_record::SalaryRecord;
use crate::infrastructure::config::SinkKind;

/// Rows per INSERT statement; 8 binds each keeps us under SQLite's variable limit
const INSERT_CHUNK_ROWS: usize = 100;

/// `"salary results"` -> `"salary_results.db"`; an existing `.db` suffix is kept
pub fn database_file_name(name: &str) -> String {
    let name = name.trim().replace(' ', "_");
    if name.ends_with(".db") {
        name
    } else {
        format!("{name}.db")
    }
}

/// `"Salary Data"` -> `"salary_data"`; anything else is kept and quoted at use
pub fn table_identifier(name: &str) -> Result<String, PersistenceError> {
    let table = name.trim().replace(' ', "_").to_lowercase();
    if table.is_empty() {
        return Err(PersistenceError::InvalidName {
            name: name.to_string(),
            reason: "table name is empty".to_string(),
        });
    }
    Ok(table)
}

/// Double-quoted SQL identifier; embedded quotes are doubled
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Names are checked when a batch is written, so a bad name fails only this sink
#[derive(Debug, Clone)]
pub struct SqliteSink {
    database_path: PathBuf,
    table_name: String,
}

impl SqliteSink {
    pub fn new(directory: &Path, database_name: &str, table_name: &str) -> Self {
        Self {
            database_path: directory.join(database_file_name(database_name)),
            table_name: table_name.to_string(),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn table(&self) -> Result<String, PersistenceError> {
        table_identifier(&self.table_name)
    }

    fn check_database_name(&self) -> Result<(), PersistenceError> {
        if self.database_path.file_name().is_none_or(|f| f == ".db") {
            return Err(PersistenceError::InvalidName {
                name: self.database_path.display().to_string(),
                reason: "database name is empty".to_string(),
            });
        }
        Ok(())
    }

    async fn connect(&self) -> Result<SqlitePool, PersistenceError> {
        if let Some(parent) = self.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.database_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(pool)
    }

    async fn create_table(&self, pool: &SqlitePool, table: &str) -> Result<(), PersistenceError> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_title TEXT,
                job_location TEXT,
                job_description TEXT,
                nTile10 REAL,
                nTile25 REAL,
                nTile50 REAL,
                nTile75 REAL,
                nTile90 REAL
            )
            "#,
            quote_identifier(table)
        );
        sqlx::query(&sql).execute(pool).await?;
        Ok(())
    }

    async fn insert_all(
        &self,
        pool: &SqlitePool,
        table: &str,
        batch: &[SalaryRecord],
    ) -> Result<usize, PersistenceError> {
        self.create_table(pool, table).await?;
        if batch.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;
        for chunk in batch.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "INSERT INTO {} (job_title, job_location, job_description, nTile10, nTile25, nTile50, nTile75, nTile90) ",
                quote_identifier(table)
            ));
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.job_title.clone())
                    .push_bind(record.job_location.clone())
                    .push_bind(record.job_description.clone())
                    .push_bind(record.n_tile_10.value())
                    .push_bind(record.n_tile_25.value())
                    .push_bind(record.n_tile_50.value())
                    .push_bind(record.n_tile_75.value())
                    .push_bind(record.n_tile_90.value());
            });
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!("Inserted {} rows into {}", batch.len(), self.target());
        Ok(batch.len())
    }
}

#[async_trait]
impl RecordSink for SqliteSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Sqlite
    }

    fn target(&self) -> String {
        let table = self.table().unwrap_or_else(|_| self.table_name.clone());
        format!("{}#{}", self.database_path.display(), table)
    }

    async fn write_batch(&self, batch: &[SalaryRecord]) -> Result<usize, PersistenceError> {
        self.check_database_name()?;
        let table = self.table()?;
        let pool = self.connect().await?;
        let result = self.insert_all(&pool, &table, batch).await;
        pool.close().await;
        result
    }
}
