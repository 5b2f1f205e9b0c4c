use async_trait::async_trait;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::{Path, PathBuf};

use super::{file_path, write_replacing, PersistenceError, RecordSink};
use crate::domain::salary_record::{SalaryRecord, MISSING_FIELD_MARKER, SINK_HEADERS};
use crate::infrastructure::config::SinkKind;

/// Spreadsheet sink: one worksheet, header row then records
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(directory: &Path, base_name: &str) -> Self {
        Self {
            path: file_path(directory, base_name, "xlsx"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the workbook in memory
    pub fn render(batch: &[SalaryRecord]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, header) in (0u16..).zip(SINK_HEADERS) {
            worksheet.write_string(0, col, header)?;
        }

        for (row, record) in (1u32..).zip(batch) {
            worksheet.write_string(row, 0, &record.job_title)?;
            worksheet.write_string(row, 1, &record.job_location)?;
            worksheet.write_string(row, 2, &record.job_description)?;
            for (col, percentile) in (3u16..).zip(record.percentiles()) {
                match percentile.value() {
                    Some(value) => worksheet.write_number(row, col, value)?,
                    None => worksheet.write_string(row, col, MISSING_FIELD_MARKER)?,
                };
            }
        }

        workbook.save_to_buffer()
    }
}

#[async_trait]
impl RecordSink for XlsxSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Xlsx
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
