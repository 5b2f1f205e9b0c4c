use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{file_path, write_replacing, PersistenceError, RecordSink};
use crate::domain::salary_record::{SalaryRecord, SINK_HEADERS};
use crate::infrastructure::config::SinkKind;

/// Delimited-text sink; replaces the file with the full batch on each write
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(directory: &Path, base_name: &str) -> Self {
        Self {
            path: file_path(directory, base_name, "csv"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header row plus one row per record; absent percentiles render as the marker
    pub fn render(batch: &[SalaryRecord]) -> Result<Vec<u8>, PersistenceError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(SINK_HEADERS)?;
        for record in batch {
            writer.serialize(record)?;
        }
        writer
            .into_inner()
            .map_err(|e| PersistenceError::Csv(e.into_error().into()))
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Csv
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }

    async fn write_batch(&self, batch: &[SalaryRecord]) -> Result<usize, PersistenceError> {
        let bytes = Self::render(batch)?;
        write_replacing(&self.path, &bytes).await?;
        Ok(batch.len())
    }
}
