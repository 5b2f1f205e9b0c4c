//! Multi-sink persistence
//!
//! Every configured sink receives the whole batch. Sinks are independent:
//! one failing does not stop the others, and the [`PersistReport`] says
//! exactly which ones wrote.

pub mod csv_sink;
pub mod json_sink;
pub mod sqlite_sink;
pub mod xlsx_sink;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::domain::events::{PipelineEvent, RunObserver};
use crate::domain::salary_record::SalaryRecord;
use crate::infrastructure::config::{OutputConfig, SinkKind};

pub use csv_sink::CsvSink;
pub use json_sink::JsonSink;
pub use sqlite_sink::SqliteSink;
pub use xlsx_sink::XlsxSink;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

impl PersistenceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A persistence target receiving whole batches
#[async_trait]
pub trait RecordSink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Human-readable target, e.g. a file path or `db#table`
    fn target(&self) -> String;

    /// Write the complete batch; returns the number of rows written
    async fn write_batch(&self, batch: &[SalaryRecord]) -> Result<usize, PersistenceError>;
}

/// Result of one sink's write
#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: SinkKind,
    pub target: String,
    pub result: Result<usize, PersistenceError>,
}

impl SinkOutcome {
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-sink results in configuration order
#[derive(Debug, Default)]
pub struct PersistReport {
    pub outcomes: Vec<SinkOutcome>,
}

impl PersistReport {
    /// True only when every sink succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(SinkOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SinkOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn outcome(&self, sink: SinkKind) -> Option<&SinkOutcome> {
        self.outcomes.iter().find(|o| o.sink == sink)
    }
}

pub struct RecordStore {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl RecordStore {
    pub fn new(sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self { sinks }
    }

    /// One sink per configured kind, sharing the output directory and base name
    pub fn from_config(config: &OutputConfig) -> Self {
        let mut sinks: Vec<Box<dyn RecordSink>> = Vec::with_capacity(config.sinks.len());
        for kind in &config.sinks {
            let sink: Box<dyn RecordSink> = match kind {
                SinkKind::Csv => Box::new(CsvSink::new(&config.directory, &config.base_name)),
                SinkKind::Json => Box::new(JsonSink::new(&config.directory, &config.base_name)),
                SinkKind::Xlsx => Box::new(XlsxSink::new(&config.directory, &config.base_name)),
                SinkKind::Sqlite => Box::new(SqliteSink::new(
                    &config.directory,
                    &config.database_name,
                    &config.table_name,
                )),
            };
            sinks.push(sink);
        }
        Self::new(sinks)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Write `batch` to every sink in order, continuing past failures
    pub async fn persist(&self, batch: &[SalaryRecord], observer: &dyn RunObserver) -> PersistReport {
        let mut report = PersistReport::default();

        for sink in &self.sinks {
            let kind = sink.kind();
            let target = sink.target();
            let result = sink.write_batch(batch).await;

            match &result {
                Ok(rows) => {
                    debug!("{} sink wrote {} rows to {}", kind, rows, target);
                    observer.on_event(&PipelineEvent::SinkPersisted {
                        sink: kind.to_string(),
                        target: target.clone(),
                        rows: *rows,
                    });
                }
                Err(e) => {
                    debug!("{} sink failed for {}: {:?}", kind, target, e);
                    observer.on_event(&PipelineEvent::SinkFailed {
                        sink: kind.to_string(),
                        target: target.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            report.outcomes.push(SinkOutcome {
                sink: kind,
                target,
                result,
            });
        }

        report
    }
}

/// `{directory}/{base_name}.{extension}`; an extension already on `base_name` is replaced
pub fn file_path(directory: &Path, base_name: &str, extension: &str) -> PathBuf {
    directory.join(Path::new(base_name.trim()).with_extension(extension))
}

/// Write `bytes` next to `path` first, then rename over it.
///
/// Readers never see a half-written file at `path`.
pub(crate) async fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistenceError::io(parent, e))?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    if let Err(e) = tokio::fs::write(&staging, bytes).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(PersistenceError::io(&staging, e));
    }
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(PersistenceError::io(path, e));
    }
    Ok(())
}
